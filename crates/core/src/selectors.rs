//! Concrete locator chains for the join protocol.
//!
//! The remote UI is unversioned, so the selector lists below are
//! configuration, not a contract: the defaults mirror the web client this
//! harness is pointed at today, and callers may substitute their own set
//! without touching the stage handlers.

use std::time::Duration;

use crate::locator::{Locator, LocatorStrategy, Predicate, StrategyChain};

/// Short budget for optional controls that are usually absent.
const PROBE: Duration = Duration::ZERO;
/// Budget for controls expected to appear while a page settles.
const SHORT: Duration = Duration::from_secs(1);
const MEDIUM: Duration = Duration::from_secs(3);
const LONG: Duration = Duration::from_secs(5);

/// Every locator chain used by the stage handlers, one field per control.
#[derive(Debug, Clone)]
pub struct JoinSelectors {
	/// "Open the native app?" interstitial dismiss control.
	pub interstitial_dismiss: StrategyChain,
	/// In-browser handoff link on the generic landing page.
	pub browser_handoff: StrategyChain,
	/// Union probes for the pre-join form; any single hit counts.
	pub landing_probes: Vec<StrategyChain>,
	/// Presence of an unmute control, meaning audio is already muted.
	pub already_muted: StrategyChain,
	/// The mute control itself.
	pub mute: StrategyChain,
	/// The join control on the pre-join form.
	pub join: StrategyChain,
	/// Alternate path: audio-join control shown in-session.
	pub join_audio: StrategyChain,
	/// Alternate path: generic join control, excluding audio-only ones.
	pub join_generic: StrategyChain,
	/// Alternate path: enter/start-labeled control.
	pub enter_start: StrategyChain,
}

impl Default for JoinSelectors {
	fn default() -> Self {
		let text = |needle: &str| Predicate::TextContains(needle.to_string());
		let attr = |name: &str, value: &str| Predicate::AttributeContains {
			name: name.to_string(),
			value: value.to_string(),
		};

		Self {
			interstitial_dismiss: StrategyChain::new(
				"interstitial-dismiss",
				vec![LocatorStrategy::new(
					Locator::matching("button", Predicate::TextContainsInsensitive("cancel".into())),
					LONG,
				)],
			),
			browser_handoff: StrategyChain::new(
				"browser-handoff",
				vec![
					LocatorStrategy::new(
						Locator::matching("a", Predicate::TextEquals("Join from Your Browser".into())),
						LONG,
					),
					LocatorStrategy::new(
						Locator::matching("a", Predicate::TextContainsInsensitive("browser".into())),
						MEDIUM,
					),
					LocatorStrategy::new(Locator::matching("button", text("Launch Meeting")), MEDIUM),
				],
			),
			landing_probes: vec![
				StrategyChain::new(
					"landing-banner",
					vec![LocatorStrategy::new(Locator::matching("*", text("Enter Meeting Info")), SHORT)],
				),
				StrategyChain::new(
					"landing-name-input",
					vec![
						LocatorStrategy::new(Locator::matching("input", attr("placeholder", "name")), PROBE),
						LocatorStrategy::new(Locator::matching("input", attr("placeholder", "Name")), PROBE),
					],
				),
				StrategyChain::new(
					"landing-join-button",
					vec![LocatorStrategy::new(Locator::matching("button", text("Join")), PROBE)],
				),
				StrategyChain::new(
					"landing-name-label",
					vec![LocatorStrategy::new(Locator::matching("*", text("Your Name")), PROBE)],
				),
			],
			already_muted: StrategyChain::new(
				"already-muted",
				vec![
					LocatorStrategy::new(Locator::matching("button", text("Unmute")), PROBE),
					LocatorStrategy::new(Locator::matching("button", attr("aria-label", "Unmute")), PROBE),
				],
			),
			mute: StrategyChain::new(
				"mute",
				vec![
					LocatorStrategy::new(
						Locator::matching("button", text("Mute")).excluding(text("Unmute")),
						SHORT,
					),
					LocatorStrategy::new(
						Locator::matching("button", attr("aria-label", "Mute"))
							.excluding(attr("aria-label", "Unmute")),
						SHORT,
					),
					LocatorStrategy::new(
						Locator::matching("button", attr("title", "Mute")).excluding(attr("title", "Unmute")),
						SHORT,
					),
					LocatorStrategy::new(
						Locator::matching("button", attr("class", "mute")).excluding(attr("class", "unmute")),
						SHORT,
					),
					LocatorStrategy::new(
						Locator::matching("button", attr("aria-label", "mute"))
							.excluding(attr("aria-label", "unmute")),
						SHORT,
					),
				],
			),
			join: StrategyChain::new(
				"join",
				vec![
					LocatorStrategy::new(
						Locator::matching("button", Predicate::TextEquals("Join".into())),
						MEDIUM,
					),
					LocatorStrategy::new(
						Locator::matching("button", Predicate::TextContainsInsensitive("join".into())),
						MEDIUM,
					),
					LocatorStrategy::new(Locator::matching("input", attr("type", "submit")), MEDIUM),
					LocatorStrategy::new(Locator::matching("a", text("Join")), MEDIUM),
					LocatorStrategy::new(Locator::matching("button", attr("type", "submit")), MEDIUM),
				],
			),
			join_audio: StrategyChain::new(
				"join-audio",
				vec![LocatorStrategy::new(Locator::matching("button", text("Join Audio")), LONG)],
			),
			join_generic: StrategyChain::new(
				"join-generic",
				vec![LocatorStrategy::new(
					Locator::matching("button", text("Join")).excluding(text("Audio")),
					LONG,
				)],
			),
			enter_start: StrategyChain::new(
				"enter-start",
				vec![
					LocatorStrategy::new(Locator::matching("button", text("Enter")), LONG),
					LocatorStrategy::new(Locator::matching("button", text("Start")), LONG),
				],
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn join_chain_orders_precise_before_structural() {
		let selectors = JoinSelectors::default();
		let strategies = selectors.join.strategies();

		assert!(matches!(strategies[0].locator.predicate, Predicate::TextEquals(_)));
		assert!(matches!(
			strategies[1].locator.predicate,
			Predicate::TextContainsInsensitive(_)
		));
		assert!(matches!(
			strategies[2].locator.predicate,
			Predicate::AttributeContains { .. }
		));
	}

	#[test]
	fn mute_strategies_all_exclude_unmute_variants() {
		let selectors = JoinSelectors::default();
		for strategy in selectors.mute.strategies() {
			assert!(strategy.locator.exclude.is_some(), "mute strategy without exclusion");
		}
	}

	#[test]
	fn presence_probes_carry_zero_budget() {
		let selectors = JoinSelectors::default();
		for strategy in selectors.already_muted.strategies() {
			assert_eq!(strategy.wait, Duration::ZERO);
		}
	}

	#[test]
	fn generic_join_excludes_audio_only_controls() {
		let selectors = JoinSelectors::default();
		let strategy = &selectors.join_generic.strategies()[0];
		assert_eq!(strategy.locator.exclude, Some(Predicate::TextContains("Audio".into())));
	}
}
