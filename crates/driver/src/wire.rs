//! Serde types matching the W3C WebDriver wire format.

use serde::{Deserialize, Serialize};

/// W3C web-element identifier key used inside element JSON objects.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque reference to a remote element.
///
/// Valid only for the session that produced it and only until the document
/// it came from is navigated away or the enclosing frame is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
	#[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
	pub id: String,
}

/// Success envelope wrapping every WebDriver response payload.
#[derive(Debug, Deserialize)]
pub struct ValueEnvelope<T> {
	pub value: T,
}

/// Error payload carried inside the envelope on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct WireErrorValue {
	pub error: String,
	pub message: String,
}

/// Body of `POST /session`.
#[derive(Debug, Serialize)]
pub struct NewSessionRequest {
	pub capabilities: CapabilitiesRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
	pub always_match: serde_json::Value,
}

/// Payload of a successful `POST /session` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionValue {
	pub session_id: String,
}

/// Body of `POST /session/{id}/elements`.
#[derive(Debug, Serialize)]
pub struct LocatorRequest {
	pub using: &'static str,
	pub value: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn element_ref_round_trips_w3c_key() {
		let json = format!(r#"{{"{ELEMENT_KEY}":"abc-123"}}"#);
		let el: ElementRef = serde_json::from_str(&json).unwrap();
		assert_eq!(el.id, "abc-123");

		let back = serde_json::to_string(&el).unwrap();
		assert!(back.contains(ELEMENT_KEY));
	}

	#[test]
	fn envelope_decodes_element_list() {
		let json = format!(r#"{{"value":[{{"{ELEMENT_KEY}":"a"}},{{"{ELEMENT_KEY}":"b"}}]}}"#);
		let envelope: ValueEnvelope<Vec<ElementRef>> = serde_json::from_str(&json).unwrap();
		assert_eq!(envelope.value.len(), 2);
		assert_eq!(envelope.value[1].id, "b");
	}

	#[test]
	fn error_value_decodes_code_and_message() {
		let json = r#"{"error":"no such element","message":"Unable to locate element","stacktrace":""}"#;
		let err: WireErrorValue = serde_json::from_str(json).unwrap();
		assert_eq!(err.error, "no such element");
		assert_eq!(err.message, "Unable to locate element");
	}

	#[test]
	fn new_session_value_reads_camel_case_id() {
		let json = r#"{"sessionId":"f00","capabilities":{}}"#;
		let value: NewSessionValue = serde_json::from_str(json).unwrap();
		assert_eq!(value.session_id, "f00");
	}
}
