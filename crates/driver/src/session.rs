//! Remote WebDriver session handle and command plumbing.

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use crate::caps::Capabilities;
use crate::error::{Error, Result};
use crate::wire::{
	CapabilitiesRequest, ElementRef, LocatorRequest, NewSessionRequest, NewSessionValue,
	ValueEnvelope, WireErrorValue,
};

/// One live remote browser session.
///
/// Owns the session id issued by the WebDriver server; every command is a
/// single HTTP round-trip. The handle is cheap to share within one worker
/// but is never shared across workers.
pub struct DriverSession {
	http: reqwest::Client,
	server_url: String,
	session_id: String,
}

impl DriverSession {
	/// Creates a new session on the given WebDriver server.
	pub async fn create(server_url: &str, caps: &Capabilities) -> Result<Self> {
		let http = reqwest::Client::new();
		let server_url = server_url.trim_end_matches('/').to_string();

		let body = NewSessionRequest {
			capabilities: CapabilitiesRequest {
				always_match: caps.to_wire(),
			},
		};

		let response = http
			.post(format!("{server_url}/session"))
			.json(&body)
			.send()
			.await?;
		let status = response.status();
		let payload: serde_json::Value = response.json().await?;

		if !status.is_success() {
			let err: WireErrorValue = serde_json::from_value(payload["value"].clone())?;
			return Err(Error::SessionNotCreated(format!("{}: {}", err.error, err.message)));
		}

		let value: NewSessionValue = serde_json::from_value(payload["value"].clone())?;
		debug!(target = "swarm_driver", session = %value.session_id, "webdriver session created");

		Ok(Self {
			http,
			server_url,
			session_id: value.session_id,
		})
	}

	/// Returns the remote session id.
	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	/// Navigates the session to a URL.
	pub async fn navigate(&self, url: &str) -> Result<()> {
		self.post("/url", json!({ "url": url })).await
	}

	/// Returns the current page URL.
	pub async fn current_url(&self) -> Result<String> {
		self.get("/url").await
	}

	/// Returns the current page title.
	pub async fn title(&self) -> Result<String> {
		self.get("/title").await
	}

	/// Finds all elements matching a W3C location strategy.
	///
	/// `using` is one of the wire strategy names ("xpath", "tag name",
	/// "link text", "partial link text"). An empty result is not an error.
	pub async fn find_elements(&self, using: &'static str, value: &str) -> Result<Vec<ElementRef>> {
		let body = LocatorRequest {
			using,
			value: value.to_string(),
		};
		let found: Vec<ElementRef> = self.post("/elements", serde_json::to_value(&body)?).await?;
		trace!(target = "swarm_driver", using, value, count = found.len(), "elements query");
		Ok(found)
	}

	/// Clicks an element.
	pub async fn click(&self, element: &ElementRef) -> Result<()> {
		self.post(&format!("/element/{}/click", element.id), json!({})).await
	}

	/// Returns whether an element is rendered on screen.
	pub async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
		self.get(&format!("/element/{}/displayed", element.id)).await
	}

	/// Returns whether an element accepts interaction.
	pub async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
		self.get(&format!("/element/{}/enabled", element.id)).await
	}

	/// Returns an element's visible text.
	pub async fn text(&self, element: &ElementRef) -> Result<String> {
		self.get(&format!("/element/{}/text", element.id)).await
	}

	/// Returns a named attribute, or `None` when the attribute is absent.
	pub async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
		self.get(&format!("/element/{}/attribute/{name}", element.id)).await
	}

	/// Switches the session's browsing context into a frame element.
	pub async fn switch_to_frame(&self, frame: &ElementRef) -> Result<()> {
		self.post("/frame", json!({ "id": frame })).await
	}

	/// Switches the session's browsing context back to the top document.
	pub async fn switch_to_default(&self) -> Result<()> {
		self.post("/frame", json!({ "id": null })).await
	}

	/// Executes a synchronous script in the current browsing context.
	pub async fn execute(&self, script: &str) -> Result<serde_json::Value> {
		self.post("/execute/sync", json!({ "script": script, "args": [] })).await
	}

	/// Resizes the session's window.
	pub async fn set_window_size(&self, width: u32, height: u32) -> Result<()> {
		// window/rect echoes the applied rect back; discard it.
		let _: serde_json::Value = self
			.post("/window/rect", json!({ "width": width, "height": height }))
			.await?;
		Ok(())
	}

	/// Ends the remote session and closes its browser.
	pub async fn quit(&self) -> Result<()> {
		let response = self
			.http
			.delete(format!("{}/session/{}", self.server_url, self.session_id))
			.send()
			.await?;
		Self::decode::<serde_json::Value>(response).await?;
		debug!(target = "swarm_driver", session = %self.session_id, "webdriver session closed");
		Ok(())
	}

	async fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
		let response = self
			.http
			.post(format!("{}/session/{}{path}", self.server_url, self.session_id))
			.json(&body)
			.send()
			.await?;
		Self::decode(response).await
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		let response = self
			.http
			.get(format!("{}/session/{}{path}", self.server_url, self.session_id))
			.send()
			.await?;
		Self::decode(response).await
	}

	async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
		let status = response.status();
		let payload: ValueEnvelope<serde_json::Value> = response.json().await?;

		if !status.is_success() {
			let err: WireErrorValue = serde_json::from_value(payload.value)?;
			return Err(Error::Wire {
				code: err.error,
				message: err.message,
			});
		}

		Ok(serde_json::from_value(payload.value)?)
	}
}
