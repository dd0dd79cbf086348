//! Error types for the WebDriver client.

use thiserror::Error;

/// Result type alias for WebDriver client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to a WebDriver server.
#[derive(Debug, Error)]
pub enum Error {
	/// HTTP transport failure reaching the WebDriver server.
	#[error("WebDriver transport error: {0}")]
	Http(#[from] reqwest::Error),

	/// Response body did not match the expected wire shape.
	#[error("WebDriver wire error: {0}")]
	Json(#[from] serde_json::Error),

	/// Error payload returned by the remote end.
	#[error("{code}: {message}")]
	Wire {
		/// W3C error code (e.g. "no such element", "invalid session id").
		code: String,
		/// Human-readable message from the remote end.
		message: String,
	},

	/// Session creation was rejected before a session id was issued.
	#[error("WebDriver session not created: {0}")]
	SessionNotCreated(String),
}

impl Error {
	/// Returns true when the remote session is dead and no further command
	/// against it can succeed.
	pub fn is_session_fault(&self) -> bool {
		match self {
			Error::Http(err) => err.is_connect() || err.is_timeout(),
			Error::Wire { code, .. } => matches!(
				code.as_str(),
				"invalid session id" | "no such window" | "unknown error" | "session not created"
			),
			Error::SessionNotCreated(_) => true,
			Error::Json(_) => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_session_id_is_a_session_fault() {
		let err = Error::Wire {
			code: "invalid session id".into(),
			message: "session deleted".into(),
		};
		assert!(err.is_session_fault());
	}

	#[test]
	fn missing_element_is_not_a_session_fault() {
		let err = Error::Wire {
			code: "no such element".into(),
			message: "unable to locate".into(),
		};
		assert!(!err.is_session_fault());
	}
}
