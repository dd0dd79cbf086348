//! Failure taxonomy for the join protocol.
//!
//! Chain exhaustion is deliberately not represented here: a locator chain
//! that finds nothing returns `None` from the resolver and the calling
//! stage decides what absence means. Errors in this module are the faults
//! that end a worker's run, each with a fixed mapping to a final outcome
//! state (see `worker::WorkerOutcome`).

use thiserror::Error;

/// Result type alias for join-protocol operations.
pub type Result<T> = std::result::Result<T, JoinError>;

/// Result type alias for raw driver capability calls.
pub type DriverResult<T> = std::result::Result<T, DriverFault>;

/// Fault reported by the automation driver.
///
/// Non-fatal faults (stale element, missing attribute) are stage-local:
/// callers log them and move on. Fatal faults mean the remote session is
/// gone and the worker cannot continue.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DriverFault {
	pub message: String,
	pub fatal: bool,
}

impl DriverFault {
	/// A fault that ends the worker's session.
	pub fn fatal(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			fatal: true,
		}
	}

	/// A fault the current stage may absorb.
	pub fn transient(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			fatal: false,
		}
	}
}

/// Errors that terminate one worker's join protocol.
#[derive(Debug, Error)]
pub enum JoinError {
	/// Mandatory navigation never reached a ready document.
	#[error("navigation to {url} failed")]
	Navigation {
		url: String,
		#[source]
		source: Option<DriverFault>,
	},

	/// The automation layer reported a dead session.
	#[error(transparent)]
	Driver(#[from] DriverFault),

	/// The shutdown signal was observed mid-protocol.
	#[error("shutdown requested")]
	Interrupted,

	/// Anything that does not fit the taxonomy above.
	#[error("{0}")]
	Internal(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn navigation_error_carries_url_and_source() {
		let err = JoinError::Navigation {
			url: "https://example.com/j/1".into(),
			source: Some(DriverFault::fatal("connection refused")),
		};
		assert!(err.to_string().contains("https://example.com/j/1"));
	}

	#[test]
	fn driver_fault_converts_transparently() {
		let err: JoinError = DriverFault::fatal("invalid session id").into();
		assert_eq!(err.to_string(), "invalid session id");
	}
}
