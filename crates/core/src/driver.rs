//! The automation-driver capability boundary.
//!
//! Everything the harness needs from a UI-automation driver is expressed by
//! [`Driver`]; the production implementation over the WebDriver wire client
//! lives in [`crate::webdriver`], and tests substitute scripted fakes. One
//! driver instance belongs to exactly one worker session and is never
//! shared.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::locator::Locator;

/// Spoofed client identifier applied to every automated browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
	AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Window size applied to every automated browser.
pub const WINDOW_SIZE: (u32, u32) = (800, 600);

/// Per-session browser configuration handed to the driver factory.
///
/// Exactly one profile exists per worker session; `profile_dir` points into
/// a directory owned by that session and removed when it terminates.
#[derive(Debug, Clone)]
pub struct AutomationProfile {
	/// Whether the browser launches without a visible window.
	pub headless: bool,
	/// Spoofed user-agent string.
	pub user_agent: String,
	/// Initial window size.
	pub window: (u32, u32),
	/// Isolated profile directory, unique to this session.
	pub profile_dir: PathBuf,
}

impl AutomationProfile {
	/// Builds the standard profile for one participant.
	pub fn new(headless: bool, profile_dir: PathBuf) -> Self {
		Self {
			headless,
			user_agent: USER_AGENT.to_string(),
			window: WINDOW_SIZE,
			profile_dir,
		}
	}
}

/// Opaque UI-automation capability consumed by the join protocol.
///
/// Element handles are only meaningful to the driver that produced them and
/// only within the scope (document or entered frame) they were found in.
/// Any call may fail with a [`DriverFault`](crate::error::DriverFault);
/// callers treat non-fatal faults as stage-local.
#[async_trait]
pub trait Driver: Send + Sync {
	/// Driver-specific element handle.
	type Elem: Clone + Send + Sync + 'static;

	/// Navigates the session to a URL.
	async fn navigate(&self, url: &str) -> DriverResult<()>;

	/// Returns the current page URL.
	async fn current_url(&self) -> DriverResult<String>;

	/// Returns the current page title.
	async fn page_title(&self) -> DriverResult<String>;

	/// Returns all elements matching a locator, in document order, within
	/// the driver's current scope.
	async fn find_all(&self, locator: &Locator) -> DriverResult<Vec<Self::Elem>>;

	/// Returns whether an element is visible and enabled.
	async fn is_interactable(&self, element: &Self::Elem) -> DriverResult<bool>;

	/// Clicks an element.
	async fn click(&self, element: &Self::Elem) -> DriverResult<()>;

	/// Returns an element's visible text.
	async fn element_text(&self, element: &Self::Elem) -> DriverResult<String>;

	/// Returns a named attribute, `None` when absent.
	async fn element_attribute(&self, element: &Self::Elem, name: &str) -> DriverResult<Option<String>>;

	/// Switches the current scope into a frame element.
	async fn enter_frame(&self, frame: &Self::Elem) -> DriverResult<()>;

	/// Switches the current scope back to the root document.
	async fn leave_frames(&self) -> DriverResult<()>;

	/// Returns the document ready-state of the current scope.
	async fn ready_state(&self) -> DriverResult<String>;

	/// Tears the session down. Called exactly once per session.
	async fn quit(&self) -> DriverResult<()>;
}

/// Creates one fresh driver per worker session.
#[async_trait]
pub trait DriverFactory: Send + Sync {
	type Driver: Driver;

	/// Starts a driver instance configured by `profile`.
	async fn start(&self, profile: &AutomationProfile) -> DriverResult<Self::Driver>;
}
