//! The multi-stage join protocol driven once per worker.
//!
//! Stages run in a fixed order and each reports success, a benign skip, or
//! a failure reason. Only two things end the protocol early: a navigation
//! fault during [`JoinFlow::arrive`] and a fatal driver fault anywhere.
//! Everything else — missing popups, missing mute controls, a join chain
//! that never resolves — degrades to the next fallback.

use std::time::Duration;

use regex_lite::Regex;
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::{JoinError, Result};
use crate::locator::{Locator, resolve};
use crate::selectors::JoinSelectors;
use crate::shutdown::ShutdownSignal;
use crate::worker::WorkerSpec;

/// Budget for the document-ready poll after navigation.
const ARRIVE_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLL: Duration = Duration::from_millis(250);
/// Settle pause after the document reports ready; the conference client
/// keeps rendering well past readyState.
const SETTLE: Duration = Duration::from_secs(5);
/// Pause after a click that changes page state.
const POST_CLICK: Duration = Duration::from_secs(2);
/// Cap on candidate controls dumped to the debug log.
const DUMP_LIMIT: usize = 5;

/// One discrete step of the join protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Arrive,
	DismissInterstitial,
	BrowserHandoff,
	DetectLandingForm,
	SetMutePreference,
	SubmitJoin,
	AlternateJoinPath,
}

impl std::fmt::Display for Stage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Stage::Arrive => "arrive",
			Stage::DismissInterstitial => "dismiss-interstitial",
			Stage::BrowserHandoff => "browser-handoff",
			Stage::DetectLandingForm => "detect-landing-form",
			Stage::SetMutePreference => "set-mute-preference",
			Stage::SubmitJoin => "submit-join",
			Stage::AlternateJoinPath => "alternate-join-path",
		};
		f.write_str(name)
	}
}

/// Result of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
	Success,
	/// The stage had nothing to do (absent popup, preference already set).
	Skipped,
	Failed(String),
}

impl StageOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, StageOutcome::Success)
	}
}

impl std::fmt::Display for StageOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			StageOutcome::Success => f.write_str("success"),
			StageOutcome::Skipped => f.write_str("skipped"),
			StageOutcome::Failed(reason) => write!(f, "failed: {reason}"),
		}
	}
}

/// Where the join controls were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
	Root,
	Frame(usize),
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Scope::Root => f.write_str("root"),
			Scope::Frame(index) => write!(f, "frame {index}"),
		}
	}
}

/// Stage handlers bound to one worker's driver, spec, and selector set.
pub struct JoinFlow<'a, D: Driver> {
	driver: &'a D,
	spec: &'a WorkerSpec,
	selectors: &'a JoinSelectors,
	shutdown: &'a ShutdownSignal,
	deep_link: bool,
	mute_satisfied: bool,
}

impl<'a, D: Driver> JoinFlow<'a, D> {
	pub fn new(
		driver: &'a D,
		spec: &'a WorkerSpec,
		selectors: &'a JoinSelectors,
		shutdown: &'a ShutdownSignal,
	) -> Self {
		Self {
			driver,
			spec,
			selectors,
			shutdown,
			deep_link: false,
			mute_satisfied: false,
		}
	}

	/// Whether Arrive used the derived deep link.
	pub fn used_deep_link(&self) -> bool {
		self.deep_link
	}

	/// Navigates to the session URL and waits for document-ready.
	///
	/// A deep join link is preferred when one can be derived from the
	/// target URL, since it skips most interstitial pages. Never reaching
	/// ready state within the budget is a navigation fault, fatal to the
	/// worker.
	pub async fn arrive(&mut self) -> Result<StageOutcome> {
		let url = match deep_join_url(&self.spec.target_url, &self.spec.display_name) {
			Some(deep) => {
				self.deep_link = true;
				info!(
					target = "swarm.stage",
					participant = self.spec.participant_index,
					"using deep join link"
				);
				deep
			}
			None => personalized_join_url(&self.spec.target_url, &self.spec.display_name)?,
		};

		self.driver.navigate(&url).await.map_err(|fault| JoinError::Navigation {
			url: url.clone(),
			source: Some(fault),
		})?;

		let deadline = tokio::time::Instant::now() + ARRIVE_TIMEOUT;
		loop {
			match self.driver.ready_state().await {
				Ok(state) if state == "complete" => break,
				Ok(_) => {}
				Err(fault) if fault.fatal => {
					return Err(JoinError::Navigation {
						url,
						source: Some(fault),
					});
				}
				Err(_) => {}
			}
			if tokio::time::Instant::now() >= deadline {
				return Err(JoinError::Navigation { url, source: None });
			}
			tokio::time::sleep(READY_POLL).await;
		}

		if self.shutdown.sleep(SETTLE).await.is_interrupted() {
			return Err(JoinError::Interrupted);
		}
		Ok(StageOutcome::Success)
	}

	/// Dismisses the "open the native app?" prompt when present.
	pub async fn dismiss_interstitial(&self) -> Result<StageOutcome> {
		let Some(found) = resolve(self.driver, &self.selectors.interstitial_dismiss).await? else {
			return Ok(StageOutcome::Skipped);
		};
		if self.try_click(&found.element, "interstitial-dismiss").await? {
			let _ = self.shutdown.sleep(Duration::from_secs(1)).await;
			Ok(StageOutcome::Success)
		} else {
			Ok(StageOutcome::Skipped)
		}
	}

	/// Follows the in-browser handoff link on the generic landing page.
	///
	/// Only relevant when Arrive fell back to the generic URL; with a deep
	/// link the handoff page is never shown.
	pub async fn browser_handoff(&self) -> Result<StageOutcome> {
		if self.deep_link {
			return Ok(StageOutcome::Skipped);
		}

		let Some(found) = resolve(self.driver, &self.selectors.browser_handoff).await? else {
			return Ok(StageOutcome::Skipped);
		};
		if self.try_click(&found.element, "browser-handoff").await? {
			let _ = self.shutdown.sleep(POST_CLICK).await;
			Ok(StageOutcome::Success)
		} else {
			Ok(StageOutcome::Skipped)
		}
	}

	/// Probes whether the current page is the pre-join form.
	///
	/// Several independent single-purpose chains are tried; any one hit
	/// counts. No hit is not a failure — the client sometimes lands
	/// directly in-session and the caller falls through to the alternate
	/// join path.
	pub async fn detect_landing_form(&self) -> Result<bool> {
		let current_url = self.driver.current_url().await.unwrap_or_else(|_| "<unavailable>".into());
		let title = self.driver.page_title().await.unwrap_or_else(|_| "<unavailable>".into());
		debug!(
			target = "swarm.stage",
			participant = self.spec.participant_index,
			url = %current_url,
			title = %title,
			"probing for pre-join form"
		);

		for probe in &self.selectors.landing_probes {
			if resolve(self.driver, probe).await?.is_some() {
				debug!(
					target = "swarm.stage",
					participant = self.spec.participant_index,
					probe = probe.label(),
					"pre-join form detected"
				);
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Ensures the participant joins muted, best-effort.
	///
	/// An unmute control already on screen means the preference is
	/// satisfied. A missing mute control is a warning, never a stage
	/// failure — audio state must not block the join.
	pub async fn set_mute_preference(&mut self) -> Result<StageOutcome> {
		if self.mute_satisfied {
			return Ok(StageOutcome::Skipped);
		}

		if resolve(self.driver, &self.selectors.already_muted).await?.is_some() {
			info!(
				target = "swarm.stage",
				participant = self.spec.participant_index,
				"already muted"
			);
			self.mute_satisfied = true;
			return Ok(StageOutcome::Skipped);
		}

		if let Some(found) = resolve(self.driver, &self.selectors.mute).await? {
			if self.try_click(&found.element, "mute").await? {
				self.mute_satisfied = true;
				return Ok(StageOutcome::Success);
			}
		}

		warn!(
			target = "swarm.stage",
			participant = self.spec.participant_index,
			"no mute control found, participant may join unmuted"
		);
		Ok(StageOutcome::Skipped)
	}

	/// Clicks the join control on the pre-join form.
	///
	/// Descends into nested frames first when the form lives inside one;
	/// a chain that never resolves reports failure so the caller can take
	/// the alternate path.
	pub async fn submit_join(&mut self) -> Result<StageOutcome> {
		let scope = self.settle_into_controls_frame().await?;
		debug!(
			target = "swarm.stage",
			participant = self.spec.participant_index,
			scope = %scope,
			"submitting join"
		);
		self.dump_controls().await;

		match resolve(self.driver, &self.selectors.join).await? {
			Some(found) => {
				if self.try_click(&found.element, "join").await? {
					info!(
						target = "swarm.stage",
						participant = self.spec.participant_index,
						strategy = found.strategy,
						scope = %scope,
						"join control clicked"
					);
					let _ = self.shutdown.sleep(POST_CLICK).await;
					Ok(StageOutcome::Success)
				} else {
					Ok(StageOutcome::Failed("join control would not accept the click".into()))
				}
			}
			None => Ok(StageOutcome::Failed("join chain exhausted".into())),
		}
	}

	/// Fallback used when the standard form was never found or never
	/// accepted a click: audio-join, then generic join, then enter/start.
	pub async fn alternate_join_path(&self) -> Result<StageOutcome> {
		let chains = [
			&self.selectors.join_audio,
			&self.selectors.join_generic,
			&self.selectors.enter_start,
		];

		for chain in chains {
			if let Some(found) = resolve(self.driver, chain).await? {
				if self.try_click(&found.element, chain.label()).await? {
					info!(
						target = "swarm.stage",
						participant = self.spec.participant_index,
						chain = chain.label(),
						"alternate join control clicked"
					);
					let _ = self.shutdown.sleep(POST_CLICK).await;
					return Ok(StageOutcome::Success);
				}
			}
		}

		Ok(StageOutcome::Failed("no join control matched".into()))
	}

	/// Descends into the first nested frame that contains interactive
	/// controls and stays there; returns to the root scope when none does.
	///
	/// Re-applies the mute preference inside the frame when it was not
	/// satisfied at root — the preview controls often render in a frame.
	async fn settle_into_controls_frame(&mut self) -> Result<Scope> {
		let frames = match self.driver.find_all(&Locator::tag("iframe")).await {
			Ok(frames) => frames,
			Err(fault) if fault.fatal => return Err(fault.into()),
			Err(fault) => {
				warn!(target = "swarm.stage", error = %fault, "frame enumeration failed");
				Vec::new()
			}
		};

		for (index, frame) in frames.iter().enumerate() {
			match self.driver.enter_frame(frame).await {
				Ok(()) => {}
				Err(fault) if fault.fatal => return Err(fault.into()),
				Err(fault) => {
					debug!(target = "swarm.stage", frame = index, error = %fault, "could not enter frame");
					self.leave_frames_best_effort().await?;
					continue;
				}
			}

			let buttons = self.count_elements("button").await?;
			let inputs = self.count_elements("input").await?;
			debug!(
				target = "swarm.stage",
				participant = self.spec.participant_index,
				frame = index,
				buttons,
				inputs,
				"inspected frame"
			);

			if buttons > 0 || inputs > 0 {
				if !self.mute_satisfied {
					self.set_mute_preference().await?;
				}
				return Ok(Scope::Frame(index));
			}
			self.leave_frames_best_effort().await?;
		}

		Ok(Scope::Root)
	}

	/// Logs a bounded sample of candidate controls in the current scope.
	async fn dump_controls(&self) {
		let Ok(buttons) = self.driver.find_all(&Locator::tag("button")).await else {
			return;
		};
		for (index, button) in buttons.iter().take(DUMP_LIMIT).enumerate() {
			let text = self.driver.element_text(button).await.unwrap_or_default();
			let kind = self
				.driver
				.element_attribute(button, "type")
				.await
				.ok()
				.flatten()
				.unwrap_or_default();
			debug!(
				target = "swarm.stage",
				participant = self.spec.participant_index,
				button = index,
				text = %text.trim(),
				kind = %kind,
				"candidate control"
			);
		}
	}

	async fn count_elements(&self, tag: &str) -> Result<usize> {
		match self.driver.find_all(&Locator::tag(tag)).await {
			Ok(found) => Ok(found.len()),
			Err(fault) if fault.fatal => Err(fault.into()),
			Err(_) => Ok(0),
		}
	}

	async fn leave_frames_best_effort(&self) -> Result<()> {
		match self.driver.leave_frames().await {
			Ok(()) => Ok(()),
			Err(fault) if fault.fatal => Err(fault.into()),
			Err(fault) => {
				warn!(target = "swarm.stage", error = %fault, "could not return to root scope");
				Ok(())
			}
		}
	}

	/// Clicks an element; a fatal fault propagates, anything else is
	/// reported as a failed click for the caller to absorb.
	async fn try_click(&self, element: &D::Elem, control: &'static str) -> Result<bool> {
		match self.driver.click(element).await {
			Ok(()) => Ok(true),
			Err(fault) if fault.fatal => Err(fault.into()),
			Err(fault) => {
				warn!(
					target = "swarm.stage",
					participant = self.spec.participant_index,
					control,
					error = %fault,
					"click failed"
				);
				Ok(false)
			}
		}
	}
}

/// Derives the deep web-client join link from a standard invite link.
///
/// Invite links of the form `…/j/<session-id>?pwd=<access-code>` map onto
/// the web client's own join endpoint, which skips the app-handoff page
/// entirely.
pub fn deep_join_url(target_url: &str, display_name: &str) -> Option<String> {
	let pattern = Regex::new(r"/j/(\d+)\?pwd=([^&]+)").ok()?;
	let captures = pattern.captures(target_url)?;

	let mut url = url::Url::parse(&format!("https://app.zoom.us/wc/{}/join", &captures[1])).ok()?;
	url.query_pairs_mut()
		.append_pair("fromPWA", "1")
		.append_pair("pwd", &captures[2])
		.append_pair("uname", display_name);
	Some(url.into())
}

/// Appends the participant name to the generic join link.
pub fn personalized_join_url(target_url: &str, display_name: &str) -> Result<String> {
	let mut url = url::Url::parse(target_url)
		.map_err(|err| JoinError::Internal(format!("invalid target url {target_url}: {err}")))?;
	url.query_pairs_mut().append_pair("uname", display_name);
	Ok(url.into())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deep_link_derived_from_invite_url() {
		let url = deep_join_url("https://us06web.zoom.us/j/83912345678?pwd=abcDEF123", "Ada Park").unwrap();
		assert_eq!(
			url,
			"https://app.zoom.us/wc/83912345678/join?fromPWA=1&pwd=abcDEF123&uname=Ada+Park"
		);
	}

	#[test]
	fn deep_link_requires_numeric_id_and_code() {
		assert!(deep_join_url("https://example.com/meet/room-7", "Ada").is_none());
		assert!(deep_join_url("https://example.com/j/abc?pwd=x", "Ada").is_none());
		assert!(deep_join_url("https://example.com/j/123", "Ada").is_none());
	}

	#[test]
	fn personalized_url_appends_encoded_name() {
		let url = personalized_join_url("https://example.com/wc/1/join?x=1", "Ada Park").unwrap();
		assert_eq!(url, "https://example.com/wc/1/join?x=1&uname=Ada+Park");
	}

	#[test]
	fn personalized_url_rejects_garbage() {
		assert!(personalized_join_url("not a url", "Ada").is_err());
	}

	#[test]
	fn stage_and_outcome_render_for_log_lines() {
		assert_eq!(Stage::SubmitJoin.to_string(), "submit-join");
		assert_eq!(StageOutcome::Failed("join chain exhausted".into()).to_string(), "failed: join chain exhausted");
		assert_eq!(Scope::Frame(2).to_string(), "frame 2");
	}
}
