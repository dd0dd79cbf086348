//! Browser launch profile translated into WebDriver capabilities.

use std::path::PathBuf;

use serde_json::json;

/// Fully owned browser-launch configuration for one remote session.
///
/// Built once per session by the harness and consumed by
/// [`DriverSession::create`](crate::DriverSession::create). The flag set
/// keeps automated Chromium instances quiet and lets them fake media
/// permissions so joining a conference never blocks on a permission prompt.
#[derive(Debug, Clone)]
pub struct Capabilities {
	headless: bool,
	user_data_dir: Option<PathBuf>,
	user_agent: Option<String>,
}

impl Capabilities {
	/// Creates the baseline automation profile.
	pub fn new() -> Self {
		Self {
			headless: true,
			user_data_dir: None,
			user_agent: None,
		}
	}

	/// Sets headless mode (on by default).
	pub fn headless(mut self, headless: bool) -> Self {
		self.headless = headless;
		self
	}

	/// Sets an isolated profile directory for this session.
	pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.user_data_dir = Some(dir.into());
		self
	}

	/// Sets a spoofed client user-agent string.
	pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	/// Renders the profile as W3C `alwaysMatch` capabilities.
	pub fn to_wire(&self) -> serde_json::Value {
		let mut args = vec![
			"--no-sandbox".to_string(),
			"--disable-dev-shm-usage".to_string(),
			"--disable-blink-features=AutomationControlled".to_string(),
			"--disable-extensions".to_string(),
			"--disable-notifications".to_string(),
			"--disable-popup-blocking".to_string(),
			"--use-fake-ui-for-media-stream".to_string(),
			"--use-fake-device-for-media-stream".to_string(),
			"--autoplay-policy=no-user-gesture-required".to_string(),
		];
		if self.headless {
			args.push("--headless".to_string());
		}
		if let Some(dir) = &self.user_data_dir {
			args.push(format!("--user-data-dir={}", dir.display()));
		}
		if let Some(ua) = &self.user_agent {
			args.push(format!("--user-agent={ua}"));
		}

		json!({
			"browserName": "chrome",
			"goog:chromeOptions": {
				"args": args,
				"prefs": {
					"profile.default_content_setting_values.media_stream_mic": 1,
					"profile.default_content_setting_values.media_stream_camera": 1,
					"profile.default_content_settings.popups": 0,
					"profile.managed_default_content_settings.images": 1,
				},
			},
		})
	}
}

impl Default for Capabilities {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args_of(caps: &Capabilities) -> Vec<String> {
		let wire = caps.to_wire();
		wire["goog:chromeOptions"]["args"]
			.as_array()
			.unwrap()
			.iter()
			.map(|v| v.as_str().unwrap().to_string())
			.collect()
	}

	#[test]
	fn default_profile_is_headless_with_fake_media() {
		let args = args_of(&Capabilities::new());
		assert!(args.contains(&"--headless".to_string()));
		assert!(args.contains(&"--use-fake-device-for-media-stream".to_string()));
	}

	#[test]
	fn headful_profile_drops_headless_arg() {
		let args = args_of(&Capabilities::new().headless(false));
		assert!(!args.contains(&"--headless".to_string()));
	}

	#[test]
	fn profile_dir_and_user_agent_are_rendered() {
		let caps = Capabilities::new()
			.user_data_dir("/tmp/profile-7")
			.user_agent("Mozilla/5.0 (test)");
		let args = args_of(&caps);
		assert!(args.contains(&"--user-data-dir=/tmp/profile-7".to_string()));
		assert!(args.contains(&"--user-agent=Mozilla/5.0 (test)".to_string()));
	}

	#[test]
	fn media_permission_prefs_are_granted() {
		let wire = Capabilities::new().to_wire();
		let prefs = &wire["goog:chromeOptions"]["prefs"];
		assert_eq!(prefs["profile.default_content_setting_values.media_stream_mic"], 1);
		assert_eq!(prefs["profile.default_content_setting_values.media_stream_camera"], 1);
	}
}
