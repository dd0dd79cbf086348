//! Declarative element-locating strategies and the fallback resolver.
//!
//! The remote UI is not under this system's control and changes across
//! builds, so a single rigid selector is brittle. Each stage describes the
//! control it needs as an ordered [`StrategyChain`] — precise match first,
//! loose match, then structural fallback — and the resolver walks the chain
//! until one strategy yields an interactable element or every budget is
//! spent. Resolution happens within the driver's current scope (root
//! document or a previously-entered frame); the resolver never switches
//! scope itself.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::driver::Driver;
use crate::error::Result;

/// Interval between driver polls while a strategy's budget is open.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How a single strategy decides whether a candidate element matches.
///
/// This vocabulary is closed on purpose: chains stay declarative, and tests
/// evaluate them against scripted pages without a live driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
	/// Visible text equals the needle exactly.
	TextEquals(String),
	/// Visible text contains the needle.
	TextContains(String),
	/// Visible text contains the needle, ignoring ASCII case.
	TextContainsInsensitive(String),
	/// The named attribute contains the needle.
	AttributeContains { name: String, value: String },
	/// Any element of the tag.
	Any,
}

/// Declarative description of how to find one UI control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
	/// Element tag to search ("button", "a", "input", "iframe", or "*").
	pub tag: String,
	/// Predicate a candidate must satisfy.
	pub predicate: Predicate,
	/// Candidates additionally matching this predicate are rejected.
	pub exclude: Option<Predicate>,
}

impl Locator {
	/// Locator for any element of a tag.
	pub fn tag(tag: &str) -> Self {
		Self {
			tag: tag.to_string(),
			predicate: Predicate::Any,
			exclude: None,
		}
	}

	/// Locator matching a predicate on a tag.
	pub fn matching(tag: &str, predicate: Predicate) -> Self {
		Self {
			tag: tag.to_string(),
			predicate,
			exclude: None,
		}
	}

	/// Adds an exclusion predicate.
	pub fn excluding(mut self, predicate: Predicate) -> Self {
		self.exclude = Some(predicate);
		self
	}
}

/// One locator plus the wait budget spent polling for it.
///
/// A zero budget means a single probe: presence is checked once and absence
/// is reported immediately.
#[derive(Debug, Clone)]
pub struct LocatorStrategy {
	pub locator: Locator,
	pub wait: Duration,
}

impl LocatorStrategy {
	pub fn new(locator: Locator, wait: Duration) -> Self {
		Self { locator, wait }
	}
}

/// Ordered fallback list of locator strategies; first success wins.
#[derive(Debug, Clone)]
pub struct StrategyChain {
	label: &'static str,
	strategies: Vec<LocatorStrategy>,
}

impl StrategyChain {
	pub fn new(label: &'static str, strategies: Vec<LocatorStrategy>) -> Self {
		Self { label, strategies }
	}

	/// Stable name used in log lines.
	pub fn label(&self) -> &'static str {
		self.label
	}

	pub fn strategies(&self) -> &[LocatorStrategy] {
		&self.strategies
	}

	/// Upper bound on the time an exhausted resolution can take.
	pub fn total_budget(&self) -> Duration {
		self.strategies.iter().map(|s| s.wait).sum()
	}
}

/// Successful chain resolution.
#[derive(Debug, Clone)]
pub struct Resolved<E> {
	pub element: E,
	/// Index of the strategy that produced the element.
	pub strategy: usize,
}

/// Tries each strategy of `chain` in order against the driver's current
/// scope.
///
/// Within one strategy the driver is polled until a matching element is
/// interactable (visible and enabled) or the strategy's budget elapses; the
/// first interactable match in document order wins. Exhaustion of the whole
/// chain is `Ok(None)` — absence is a stage-level decision, not an error.
/// Strategies after the first hit are never evaluated. Only fatal driver
/// faults propagate; transient query faults are logged and retried within
/// the open budget.
pub async fn resolve<D: Driver>(driver: &D, chain: &StrategyChain) -> Result<Option<Resolved<D::Elem>>> {
	for (index, strategy) in chain.strategies.iter().enumerate() {
		if let Some(element) = poll_strategy(driver, strategy, chain.label, index).await? {
			debug!(
				target = "swarm.locator",
				chain = chain.label,
				strategy = index,
				"chain resolved"
			);
			return Ok(Some(Resolved { element, strategy: index }));
		}
	}

	debug!(target = "swarm.locator", chain = chain.label, "chain exhausted");
	Ok(None)
}

async fn poll_strategy<D: Driver>(
	driver: &D,
	strategy: &LocatorStrategy,
	chain: &'static str,
	index: usize,
) -> Result<Option<D::Elem>> {
	let deadline = tokio::time::Instant::now() + strategy.wait;

	loop {
		match driver.find_all(&strategy.locator).await {
			Ok(candidates) => {
				for candidate in candidates {
					match driver.is_interactable(&candidate).await {
						Ok(true) => return Ok(Some(candidate)),
						Ok(false) => {}
						Err(fault) if fault.fatal => return Err(fault.into()),
						// Candidate went stale between query and probe.
						Err(fault) => {
							trace!(target = "swarm.locator", chain, index, error = %fault, "candidate probe failed")
						}
					}
				}
			}
			Err(fault) if fault.fatal => return Err(fault.into()),
			Err(fault) => {
				warn!(target = "swarm.locator", chain, index, error = %fault, "element query failed, retrying")
			}
		}

		let now = tokio::time::Instant::now();
		if now >= deadline {
			return Ok(None);
		}
		tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use async_trait::async_trait;

	use super::*;
	use crate::error::{DriverFault, DriverResult, JoinError};

	/// Minimal scripted driver: each locator either matches a named element
	/// or nothing, and every query is counted per strategy tag.
	#[derive(Default)]
	struct ScriptedDriver {
		/// Tags whose `find_all` yields one element.
		matches: Vec<String>,
		/// Tags whose element never becomes interactable.
		inert: Vec<String>,
		queries: Mutex<Vec<String>>,
		query_count: AtomicUsize,
	}

	impl ScriptedDriver {
		fn matching(tags: &[&str]) -> Self {
			Self {
				matches: tags.iter().map(|t| t.to_string()).collect(),
				..Self::default()
			}
		}

		fn queried_tags(&self) -> Vec<String> {
			self.queries.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl Driver for ScriptedDriver {
		type Elem = String;

		async fn navigate(&self, _url: &str) -> DriverResult<()> {
			Ok(())
		}

		async fn current_url(&self) -> DriverResult<String> {
			Ok(String::new())
		}

		async fn page_title(&self) -> DriverResult<String> {
			Ok(String::new())
		}

		async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<String>> {
			self.queries.lock().unwrap().push(locator.tag.clone());
			self.query_count.fetch_add(1, Ordering::SeqCst);
			if self.matches.contains(&locator.tag) || self.inert.contains(&locator.tag) {
				Ok(vec![locator.tag.clone()])
			} else {
				Ok(Vec::new())
			}
		}

		async fn is_interactable(&self, element: &String) -> DriverResult<bool> {
			Ok(!self.inert.contains(element))
		}

		async fn click(&self, _element: &String) -> DriverResult<()> {
			Ok(())
		}

		async fn element_text(&self, element: &String) -> DriverResult<String> {
			Ok(element.clone())
		}

		async fn element_attribute(&self, _element: &String, _name: &str) -> DriverResult<Option<String>> {
			Ok(None)
		}

		async fn enter_frame(&self, _frame: &String) -> DriverResult<()> {
			Ok(())
		}

		async fn leave_frames(&self) -> DriverResult<()> {
			Ok(())
		}

		async fn ready_state(&self) -> DriverResult<String> {
			Ok("complete".into())
		}

		async fn quit(&self) -> DriverResult<()> {
			Ok(())
		}
	}

	fn chain_of(tags: &[&str], wait: Duration) -> StrategyChain {
		StrategyChain::new(
			"test",
			tags.iter().map(|t| LocatorStrategy::new(Locator::tag(t), wait)).collect(),
		)
	}

	#[tokio::test]
	async fn first_matching_strategy_wins_and_later_ones_are_never_tried() {
		let driver = ScriptedDriver::matching(&["b"]);
		let chain = chain_of(&["a", "b", "c"], Duration::ZERO);

		let resolved = resolve(&driver, &chain).await.unwrap().unwrap();
		assert_eq!(resolved.strategy, 1);
		assert_eq!(resolved.element, "b");
		assert_eq!(driver.queried_tags(), vec!["a", "b"]);
	}

	#[tokio::test(start_paused = true)]
	async fn exhausted_chain_returns_none_within_total_budget() {
		let driver = ScriptedDriver::matching(&[]);
		let chain = chain_of(&["a", "b"], Duration::from_secs(2));

		let started = tokio::time::Instant::now();
		let resolved = resolve(&driver, &chain).await.unwrap();
		assert!(resolved.is_none());
		assert_eq!(started.elapsed(), chain.total_budget());
	}

	#[tokio::test]
	async fn zero_budget_strategy_probes_exactly_once() {
		let driver = ScriptedDriver::matching(&[]);
		let chain = chain_of(&["a"], Duration::ZERO);

		assert!(resolve(&driver, &chain).await.unwrap().is_none());
		assert_eq!(driver.query_count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn non_interactable_match_does_not_resolve() {
		let driver = ScriptedDriver {
			inert: vec!["a".into()],
			..ScriptedDriver::default()
		};
		let chain = chain_of(&["a"], Duration::ZERO);

		assert!(resolve(&driver, &chain).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn fatal_fault_propagates_out_of_the_resolver() {
		struct DeadDriver;

		#[async_trait]
		impl Driver for DeadDriver {
			type Elem = String;

			async fn navigate(&self, _url: &str) -> DriverResult<()> {
				Ok(())
			}
			async fn current_url(&self) -> DriverResult<String> {
				Ok(String::new())
			}
			async fn page_title(&self) -> DriverResult<String> {
				Ok(String::new())
			}
			async fn find_all(&self, _locator: &Locator) -> DriverResult<Vec<String>> {
				Err(DriverFault::fatal("invalid session id"))
			}
			async fn is_interactable(&self, _element: &String) -> DriverResult<bool> {
				Ok(false)
			}
			async fn click(&self, _element: &String) -> DriverResult<()> {
				Ok(())
			}
			async fn element_text(&self, _element: &String) -> DriverResult<String> {
				Ok(String::new())
			}
			async fn element_attribute(&self, _element: &String, _name: &str) -> DriverResult<Option<String>> {
				Ok(None)
			}
			async fn enter_frame(&self, _frame: &String) -> DriverResult<()> {
				Ok(())
			}
			async fn leave_frames(&self) -> DriverResult<()> {
				Ok(())
			}
			async fn ready_state(&self) -> DriverResult<String> {
				Ok("complete".into())
			}
			async fn quit(&self) -> DriverResult<()> {
				Ok(())
			}
		}

		let chain = chain_of(&["a"], Duration::ZERO);
		let err = resolve(&DeadDriver, &chain).await.unwrap_err();
		assert!(matches!(err, JoinError::Driver(fault) if fault.fatal));
	}
}
