//! Launching, batching, and joining of worker sessions.
//!
//! Workers are independent tasks; the scheduler only decides *when* each
//! one starts and then waits for all of them. It never aborts a running
//! worker on its own — only a delivered interrupt does that, through the
//! shutdown signal the workers poll themselves.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::driver::DriverFactory;
use crate::selectors::JoinSelectors;
use crate::shutdown::ShutdownSignal;
use crate::worker::{FinalState, WorkerOutcome, WorkerSession, WorkerSpec};

/// How new worker sessions are spaced out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
	/// One launch every `delay`; earlier workers keep running throughout.
	Staggered { delay: Duration },
	/// Fixed-size batches with a small stagger inside a batch and a
	/// cooldown between batches (skipped after the final batch).
	Batched {
		size: usize,
		stagger: Duration,
		cooldown: Duration,
	},
}

/// Fully owned description of one stress run.
#[derive(Debug, Clone)]
pub struct RunConfig {
	/// Join link every participant is pointed at.
	pub target_url: String,
	/// One display name per participant; the length is the worker count.
	pub display_names: Vec<String>,
	/// How long each participant dwells in-session after joining.
	pub session_duration: Duration,
	pub mode: LaunchMode,
	/// Whether browsers run headless.
	pub headless: bool,
}

impl RunConfig {
	fn specs(&self) -> Vec<WorkerSpec> {
		self.display_names
			.iter()
			.enumerate()
			.map(|(position, name)| WorkerSpec {
				participant_index: position as u32 + 1,
				display_name: name.clone(),
				target_url: self.target_url.clone(),
				session_duration: self.session_duration,
			})
			.collect()
	}
}

/// Runs a full stress run and returns one outcome per launched worker, in
/// participant order.
///
/// Every launched worker is joined before this returns. A worker task that
/// dies without reporting (a bug, not an expected path) is converted into
/// an `Aborted` outcome so the one-outcome-per-worker invariant holds.
pub async fn run<F>(config: RunConfig, factory: Arc<F>, shutdown: ShutdownSignal) -> Vec<WorkerOutcome>
where
	F: DriverFactory + 'static,
	F::Driver: 'static,
{
	let selectors = Arc::new(JoinSelectors::default());
	let specs = config.specs();
	let total = specs.len();
	let headless = config.headless;
	let mode = config.mode;
	info!(target = "swarm.run", participants = total, mode = ?mode, "starting run");

	let mut handles: Vec<(u32, JoinHandle<WorkerOutcome>)> = Vec::with_capacity(total);
	let mut launch = |spec: WorkerSpec| {
		let session = WorkerSession::new(
			spec.clone(),
			Arc::clone(&factory),
			Arc::clone(&selectors),
			shutdown.clone(),
			headless,
		);
		handles.push((spec.participant_index, tokio::spawn(session.run())));
	};

	match mode {
		LaunchMode::Staggered { delay } => {
			let mut specs = specs.into_iter().peekable();
			while let Some(spec) = specs.next() {
				if shutdown.is_stopping() {
					break;
				}
				launch(spec);
				// No delay after the last launch.
				if specs.peek().is_some() && shutdown.sleep(delay).await.is_interrupted() {
					break;
				}
			}
		}
		LaunchMode::Batched {
			size,
			stagger,
			cooldown,
		} => {
			let size = size.max(1);
			let batches: Vec<&[WorkerSpec]> = specs.chunks(size).collect();
			let batch_count = batches.len();

			'run: for (number, batch) in batches.iter().enumerate() {
				info!(
					target = "swarm.run",
					batch = number + 1,
					of = batch_count,
					size = batch.len(),
					"starting batch"
				);
				for (position, spec) in batch.iter().enumerate() {
					if shutdown.is_stopping() {
						break 'run;
					}
					launch(spec.clone());
					if position + 1 < batch.len() && shutdown.sleep(stagger).await.is_interrupted() {
						break 'run;
					}
				}
				// Cooldown only between batches, never after the final one.
				if number + 1 < batch_count && shutdown.sleep(cooldown).await.is_interrupted() {
					break 'run;
				}
			}
		}
	}

	let launched = handles.len();
	if launched < total {
		warn!(
			target = "swarm.run",
			launched,
			requested = total,
			"shutdown interrupted the launch sequence"
		);
	}

	info!(target = "swarm.run", launched, "waiting for all participants to finish");
	let mut outcomes = Vec::with_capacity(launched);
	for (participant_index, handle) in handles {
		match handle.await {
			Ok(outcome) => outcomes.push(outcome),
			Err(err) => {
				warn!(
					target = "swarm.run",
					participant = participant_index,
					error = %err,
					"worker task died without reporting"
				);
				outcomes.push(WorkerOutcome {
					participant_index,
					state: FinalState::Aborted,
					detail: Some(format!("worker task died: {err}")),
				});
			}
		}
	}

	let joined = outcomes.iter().filter(|o| o.state == FinalState::Joined).count();
	let failed = outcomes
		.iter()
		.filter(|o| o.state == FinalState::FailedToJoin)
		.count();
	let aborted = outcomes.iter().filter(|o| o.state == FinalState::Aborted).count();
	info!(target = "swarm.run", joined, failed, aborted, "run complete");

	outcomes
}
