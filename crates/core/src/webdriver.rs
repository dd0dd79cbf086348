//! Production [`Driver`] implementation over the WebDriver wire client.
//!
//! Locators compile to XPath so the whole closed predicate vocabulary maps
//! onto one wire query. Wire faults are classified here: a dead session is
//! fatal to the worker, everything else stays stage-local.

use async_trait::async_trait;
use swarm_driver::{Capabilities, DriverSession, ElementRef};

use crate::driver::{AutomationProfile, Driver, DriverFactory};
use crate::error::{DriverFault, DriverResult};
use crate::locator::{Locator, Predicate};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

fn fault(err: swarm_driver::Error) -> DriverFault {
	DriverFault {
		fatal: err.is_session_fault(),
		message: err.to_string(),
	}
}

fn predicate_xpath(predicate: &Predicate) -> Option<String> {
	match predicate {
		Predicate::TextEquals(needle) => Some(format!("normalize-space(text())='{needle}'")),
		Predicate::TextContains(needle) => Some(format!("contains(text(), '{needle}')")),
		Predicate::TextContainsInsensitive(needle) => Some(format!(
			"contains(translate(text(), '{UPPER}', '{LOWER}'), '{}')",
			needle.to_ascii_lowercase()
		)),
		Predicate::AttributeContains { name, value } => Some(format!("contains(@{name}, '{value}')")),
		Predicate::Any => None,
	}
}

/// Compiles a locator into the XPath sent over the wire.
pub(crate) fn xpath_for(locator: &Locator) -> String {
	let mut conditions = Vec::new();
	if let Some(condition) = predicate_xpath(&locator.predicate) {
		conditions.push(condition);
	}
	if let Some(exclude) = &locator.exclude {
		if let Some(condition) = predicate_xpath(exclude) {
			conditions.push(format!("not({condition})"));
		}
	}

	if conditions.is_empty() {
		format!("//{}", locator.tag)
	} else {
		format!("//{}[{}]", locator.tag, conditions.join(" and "))
	}
}

/// Creates one fresh WebDriver session per worker.
pub struct WebDriverFactory {
	server_url: String,
}

impl WebDriverFactory {
	/// `server_url` is the base URL of a running WebDriver server.
	pub fn new(server_url: impl Into<String>) -> Self {
		Self {
			server_url: server_url.into(),
		}
	}
}

#[async_trait]
impl DriverFactory for WebDriverFactory {
	type Driver = WebDriver;

	async fn start(&self, profile: &AutomationProfile) -> DriverResult<WebDriver> {
		let caps = Capabilities::new()
			.headless(profile.headless)
			.user_data_dir(profile.profile_dir.as_path())
			.user_agent(profile.user_agent.as_str());

		let session = DriverSession::create(&self.server_url, &caps).await.map_err(fault)?;
		let (width, height) = profile.window;
		session.set_window_size(width, height).await.map_err(fault)?;

		Ok(WebDriver { session })
	}
}

/// One worker's live browser session.
pub struct WebDriver {
	session: DriverSession,
}

#[async_trait]
impl Driver for WebDriver {
	type Elem = ElementRef;

	async fn navigate(&self, url: &str) -> DriverResult<()> {
		self.session.navigate(url).await.map_err(fault)
	}

	async fn current_url(&self) -> DriverResult<String> {
		self.session.current_url().await.map_err(fault)
	}

	async fn page_title(&self) -> DriverResult<String> {
		self.session.title().await.map_err(fault)
	}

	async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<ElementRef>> {
		let xpath = xpath_for(locator);
		self.session.find_elements("xpath", &xpath).await.map_err(fault)
	}

	async fn is_interactable(&self, element: &ElementRef) -> DriverResult<bool> {
		let displayed = self.session.is_displayed(element).await.map_err(fault)?;
		if !displayed {
			return Ok(false);
		}
		self.session.is_enabled(element).await.map_err(fault)
	}

	async fn click(&self, element: &ElementRef) -> DriverResult<()> {
		self.session.click(element).await.map_err(fault)
	}

	async fn element_text(&self, element: &ElementRef) -> DriverResult<String> {
		self.session.text(element).await.map_err(fault)
	}

	async fn element_attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
		self.session.attribute(element, name).await.map_err(fault)
	}

	async fn enter_frame(&self, frame: &ElementRef) -> DriverResult<()> {
		self.session.switch_to_frame(frame).await.map_err(fault)
	}

	async fn leave_frames(&self) -> DriverResult<()> {
		self.session.switch_to_default().await.map_err(fault)
	}

	async fn ready_state(&self) -> DriverResult<String> {
		let value = self
			.session
			.execute("return document.readyState")
			.await
			.map_err(fault)?;
		value
			.as_str()
			.map(str::to_string)
			.ok_or_else(|| DriverFault::transient("readyState was not a string"))
	}

	async fn quit(&self) -> DriverResult<()> {
		self.session.quit().await.map_err(fault)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_tag_compiles_without_conditions() {
		assert_eq!(xpath_for(&Locator::tag("iframe")), "//iframe");
	}

	#[test]
	fn exact_text_compiles_to_normalized_comparison() {
		let locator = Locator::matching("button", Predicate::TextEquals("Join".into()));
		assert_eq!(xpath_for(&locator), "//button[normalize-space(text())='Join']");
	}

	#[test]
	fn case_insensitive_text_lowers_both_sides() {
		let locator = Locator::matching("button", Predicate::TextContainsInsensitive("Join".into()));
		let xpath = xpath_for(&locator);
		assert!(xpath.contains("translate(text()"));
		assert!(xpath.ends_with("'join')]"));
	}

	#[test]
	fn exclusion_becomes_a_not_clause() {
		let locator = Locator::matching("button", Predicate::TextContains("Mute".into()))
			.excluding(Predicate::TextContains("Unmute".into()));
		assert_eq!(
			xpath_for(&locator),
			"//button[contains(text(), 'Mute') and not(contains(text(), 'Unmute'))]"
		);
	}

	#[test]
	fn attribute_predicate_targets_the_named_attribute() {
		let locator = Locator::matching(
			"button",
			Predicate::AttributeContains {
				name: "aria-label".into(),
				value: "Mute".into(),
			},
		);
		assert_eq!(xpath_for(&locator), "//button[contains(@aria-label, 'Mute')]");
	}
}
