//! One simulated participant's end-to-end session.
//!
//! A worker owns its driver instance and its profile directory for the
//! whole session. Whatever path the session takes — clean join, failed
//! join, fault, interrupt — teardown runs exactly once and an outcome is
//! emitted exactly once; nothing escapes the session boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::driver::{AutomationProfile, Driver, DriverFactory};
use crate::error::{JoinError, Result};
use crate::selectors::JoinSelectors;
use crate::shutdown::ShutdownSignal;
use crate::stages::{JoinFlow, Stage, StageOutcome};

/// Poll interval of the in-session dwell loop, bounding shutdown latency.
const DWELL_POLL: Duration = Duration::from_secs(1);
/// How long a failed join keeps its browser alive for inspection.
const FAILURE_LINGER: Duration = Duration::from_secs(10);

/// Immutable description of one participant, created before launch.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
	/// Unique within a run, starting at 1.
	pub participant_index: u32,
	pub display_name: String,
	pub target_url: String,
	/// How long the participant dwells in-session after joining.
	pub session_duration: Duration,
}

/// Terminal state of one worker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalState {
	Joined,
	FailedToJoin,
	Aborted,
}

impl std::fmt::Display for FinalState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FinalState::Joined => f.write_str("joined"),
			FinalState::FailedToJoin => f.write_str("failed-to-join"),
			FinalState::Aborted => f.write_str("aborted"),
		}
	}
}

/// Emitted exactly once per launched worker, consumed for logging.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
	pub participant_index: u32,
	pub state: FinalState,
	pub detail: Option<String>,
}

/// Lifecycle phases a session moves through, logged as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
	Created,
	DriverStarting,
	Navigating,
	Joining,
	InSession,
	Closing,
	Terminated,
}

impl std::fmt::Display for WorkerState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			WorkerState::Created => "created",
			WorkerState::DriverStarting => "driver-starting",
			WorkerState::Navigating => "navigating",
			WorkerState::Joining => "joining",
			WorkerState::InSession => "in-session",
			WorkerState::Closing => "closing",
			WorkerState::Terminated => "terminated",
		};
		f.write_str(name)
	}
}

/// What the join protocol produced, before outcome classification.
struct JoinSummary {
	joined: bool,
	detail: Option<String>,
}

/// One worker session, ready to run as its own task.
pub struct WorkerSession<F: DriverFactory> {
	spec: WorkerSpec,
	factory: Arc<F>,
	selectors: Arc<JoinSelectors>,
	shutdown: ShutdownSignal,
	headless: bool,
}

impl<F: DriverFactory> WorkerSession<F> {
	pub fn new(
		spec: WorkerSpec,
		factory: Arc<F>,
		selectors: Arc<JoinSelectors>,
		shutdown: ShutdownSignal,
		headless: bool,
	) -> Self {
		Self {
			spec,
			factory,
			selectors,
			shutdown,
			headless,
		}
	}

	/// Runs the session to completion and returns its outcome.
	///
	/// Once a driver instance exists it is torn down on every exit path,
	/// including faults; teardown failures are downgraded to a warning.
	pub async fn run(self) -> WorkerOutcome {
		let index = self.spec.participant_index;
		self.transition(WorkerState::Created);
		info!(
			target = "swarm.worker",
			participant = index,
			name = %self.spec.display_name,
			"starting participant"
		);

		self.transition(WorkerState::DriverStarting);
		let profile_dir = match tempfile::tempdir() {
			Ok(dir) => dir,
			Err(err) => {
				error!(target = "swarm.worker", participant = index, error = %err, "profile dir creation failed");
				return self.conclude(Err(JoinError::Internal(format!("profile dir creation failed: {err}"))));
			}
		};
		let profile = AutomationProfile::new(
			self.headless,
			profile_dir.path().join(format!("user-data-{index}")),
		);

		let driver = match self.factory.start(&profile).await {
			Ok(driver) => driver,
			Err(fault) => {
				error!(target = "swarm.worker", participant = index, error = %fault, "driver start failed");
				return self.conclude(Err(fault.into()));
			}
		};

		let result = self.drive(&driver).await;

		self.transition(WorkerState::Closing);
		match driver.quit().await {
			Ok(()) => info!(target = "swarm.worker", participant = index, "browser closed"),
			// The session may already be dead; a teardown fault must not
			// outrank whatever the join protocol reported.
			Err(fault) => {
				warn!(target = "swarm.worker", participant = index, error = %fault, "teardown fault ignored")
			}
		}
		drop(profile_dir);
		self.transition(WorkerState::Terminated);

		self.conclude(result)
	}

	/// Runs the stage sequence of the join protocol in order.
	async fn drive(&self, driver: &F::Driver) -> Result<JoinSummary> {
		self.transition(WorkerState::Navigating);
		let mut flow = JoinFlow::new(driver, &self.spec, &self.selectors, &self.shutdown);

		self.checkpoint()?;
		let outcome = flow.arrive().await?;
		self.log_stage(Stage::Arrive, &outcome);

		self.transition(WorkerState::Joining);
		self.checkpoint()?;
		let outcome = flow.dismiss_interstitial().await?;
		self.log_stage(Stage::DismissInterstitial, &outcome);

		self.checkpoint()?;
		let outcome = flow.browser_handoff().await?;
		self.log_stage(Stage::BrowserHandoff, &outcome);

		self.checkpoint()?;
		let on_form = flow.detect_landing_form().await?;
		self.log_stage(
			Stage::DetectLandingForm,
			if on_form { &StageOutcome::Success } else { &StageOutcome::Skipped },
		);

		let mut joined = false;
		if on_form {
			self.checkpoint()?;
			let outcome = flow.set_mute_preference().await?;
			self.log_stage(Stage::SetMutePreference, &outcome);

			self.checkpoint()?;
			let outcome = flow.submit_join().await?;
			self.log_stage(Stage::SubmitJoin, &outcome);
			joined = outcome.is_success();
		}

		let mut detail = None;
		if !joined {
			self.checkpoint()?;
			let outcome = flow.alternate_join_path().await?;
			self.log_stage(Stage::AlternateJoinPath, &outcome);
			match outcome {
				StageOutcome::Success => joined = true,
				StageOutcome::Failed(reason) => detail = Some(reason),
				StageOutcome::Skipped => {}
			}
		}

		if !joined {
			warn!(
				target = "swarm.worker",
				participant = self.spec.participant_index,
				"failed to join, keeping browser briefly for inspection"
			);
			let _ = self.shutdown.sleep(FAILURE_LINGER).await;
			return Ok(JoinSummary { joined: false, detail });
		}

		info!(
			target = "swarm.worker",
			participant = self.spec.participant_index,
			"participant joined the session"
		);
		self.transition(WorkerState::InSession);
		self.dwell().await;

		Ok(JoinSummary { joined: true, detail: None })
	}

	/// Stays in-session until the duration elapses or shutdown trips,
	/// checked every [`DWELL_POLL`].
	async fn dwell(&self) {
		let deadline = tokio::time::Instant::now() + self.spec.session_duration;
		loop {
			if self.shutdown.is_stopping() {
				info!(
					target = "swarm.worker",
					participant = self.spec.participant_index,
					"shutdown observed, leaving session"
				);
				return;
			}
			let now = tokio::time::Instant::now();
			if now >= deadline {
				info!(
					target = "swarm.worker",
					participant = self.spec.participant_index,
					"session duration elapsed"
				);
				return;
			}
			tokio::time::sleep(DWELL_POLL.min(deadline - now)).await;
		}
	}

	fn checkpoint(&self) -> Result<()> {
		if self.shutdown.is_stopping() {
			Err(JoinError::Interrupted)
		} else {
			Ok(())
		}
	}

	fn transition(&self, state: WorkerState) {
		debug!(
			target = "swarm.worker",
			participant = self.spec.participant_index,
			state = %state,
			"state"
		);
	}

	fn log_stage(&self, stage: Stage, outcome: &StageOutcome) {
		info!(
			target = "swarm.worker",
			participant = self.spec.participant_index,
			stage = %stage,
			result = %outcome,
			"stage complete"
		);
	}

	fn conclude(&self, result: Result<JoinSummary>) -> WorkerOutcome {
		let outcome = classify(self.spec.participant_index, result);
		info!(
			target = "swarm.worker",
			participant = outcome.participant_index,
			state = %outcome.state,
			detail = outcome.detail.as_deref().unwrap_or(""),
			"participant finished"
		);
		outcome
	}
}

/// Fixed mapping from protocol result to outcome state.
fn classify(participant_index: u32, result: Result<JoinSummary>) -> WorkerOutcome {
	let (state, detail) = match result {
		Ok(summary) if summary.joined => (FinalState::Joined, None),
		Ok(summary) => (
			FinalState::FailedToJoin,
			summary.detail.or_else(|| Some("join protocol did not complete".into())),
		),
		Err(JoinError::Navigation { url, source }) => {
			let detail = match source {
				Some(fault) => format!("navigation to {url} failed: {fault}"),
				None => format!("navigation to {url} never reached ready state"),
			};
			(FinalState::FailedToJoin, Some(detail))
		}
		Err(JoinError::Interrupted) => (FinalState::Aborted, Some("shutdown requested".into())),
		Err(JoinError::Driver(fault)) => (FinalState::Aborted, Some(format!("driver fault: {fault}"))),
		Err(JoinError::Internal(detail)) => (FinalState::Aborted, Some(detail)),
	};

	WorkerOutcome {
		participant_index,
		state,
		detail,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::DriverFault;

	#[test]
	fn joined_summary_classifies_as_joined() {
		let outcome = classify(3, Ok(JoinSummary { joined: true, detail: None }));
		assert_eq!(outcome.participant_index, 3);
		assert_eq!(outcome.state, FinalState::Joined);
		assert!(outcome.detail.is_none());
	}

	#[test]
	fn unjoined_summary_keeps_stage_detail() {
		let outcome = classify(
			1,
			Ok(JoinSummary {
				joined: false,
				detail: Some("no join control matched".into()),
			}),
		);
		assert_eq!(outcome.state, FinalState::FailedToJoin);
		assert_eq!(outcome.detail.as_deref(), Some("no join control matched"));
	}

	#[test]
	fn navigation_timeout_classifies_as_failed_to_join() {
		let outcome = classify(
			2,
			Err(JoinError::Navigation {
				url: "https://example.com/j/1".into(),
				source: None,
			}),
		);
		assert_eq!(outcome.state, FinalState::FailedToJoin);
		assert!(outcome.detail.unwrap().contains("never reached ready state"));
	}

	#[test]
	fn driver_fault_classifies_as_aborted() {
		let outcome = classify(1, Err(JoinError::Driver(DriverFault::fatal("invalid session id"))));
		assert_eq!(outcome.state, FinalState::Aborted);
		assert!(outcome.detail.unwrap().contains("invalid session id"));
	}

	#[test]
	fn interrupt_classifies_as_aborted() {
		let outcome = classify(4, Err(JoinError::Interrupted));
		assert_eq!(outcome.state, FinalState::Aborted);
		assert_eq!(outcome.detail.as_deref(), Some("shutdown requested"));
	}
}
