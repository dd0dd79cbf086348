//! Cooperative, process-wide shutdown signal.
//!
//! The single piece of state shared across workers. Set exactly once by the
//! interrupt handler, observed by every worker at its polling points; never
//! cleared within a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;

/// Interval at which long waits re-check the signal.
const SHUTDOWN_POLL: Duration = Duration::from_secs(1);

/// Result of an interruptible wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
	/// The full duration passed without the signal tripping.
	Elapsed,
	/// The signal tripped before the duration passed.
	Interrupted,
}

impl Wait {
	pub fn is_interrupted(self) -> bool {
		self == Wait::Interrupted
	}
}

/// Monotonic running→stopping flag shared by one run.
///
/// Cloning yields another handle to the same flag. Workers only read;
/// [`trigger`](Self::trigger) is called by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
	stopping: Arc<AtomicBool>,
}

impl ShutdownSignal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Transitions the run to stopping. Idempotent; never reverts.
	pub fn trigger(&self) {
		if !self.stopping.swap(true, Ordering::SeqCst) {
			info!(target = "swarm.run", "shutdown requested, draining workers");
		}
	}

	/// Returns whether shutdown has been requested.
	pub fn is_stopping(&self) -> bool {
		self.stopping.load(Ordering::SeqCst)
	}

	/// Sleeps for `duration` in short slices, waking early when the signal
	/// trips. Latency to observe an interrupt is bounded by one poll slice.
	pub async fn sleep(&self, duration: Duration) -> Wait {
		let deadline = tokio::time::Instant::now() + duration;
		loop {
			if self.is_stopping() {
				return Wait::Interrupted;
			}
			let now = tokio::time::Instant::now();
			if now >= deadline {
				return Wait::Elapsed;
			}
			let slice = SHUTDOWN_POLL.min(deadline - now);
			tokio::time::sleep(slice).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signal_is_monotonic() {
		let signal = ShutdownSignal::new();
		assert!(!signal.is_stopping());

		signal.trigger();
		assert!(signal.is_stopping());

		// A second trigger must not flip the flag back.
		signal.trigger();
		assert!(signal.is_stopping());
	}

	#[test]
	fn clones_observe_the_same_flag() {
		let signal = ShutdownSignal::new();
		let observer = signal.clone();
		signal.trigger();
		assert!(observer.is_stopping());
	}

	#[tokio::test(start_paused = true)]
	async fn sleep_runs_to_completion_without_signal() {
		let signal = ShutdownSignal::new();
		let started = tokio::time::Instant::now();
		let wait = signal.sleep(Duration::from_secs(5)).await;
		assert_eq!(wait, Wait::Elapsed);
		assert_eq!(started.elapsed(), Duration::from_secs(5));
	}

	#[tokio::test(start_paused = true)]
	async fn sleep_exits_within_one_poll_of_trigger() {
		let signal = ShutdownSignal::new();
		let trip = signal.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(1500)).await;
			trip.trigger();
		});

		let started = tokio::time::Instant::now();
		let wait = signal.sleep(Duration::from_secs(600)).await;
		assert_eq!(wait, Wait::Interrupted);
		assert!(started.elapsed() <= Duration::from_secs(3));
	}

	#[tokio::test(start_paused = true)]
	async fn pre_tripped_signal_short_circuits_sleep() {
		let signal = ShutdownSignal::new();
		signal.trigger();
		let started = tokio::time::Instant::now();
		let wait = signal.sleep(Duration::from_secs(30)).await;
		assert_eq!(wait, Wait::Interrupted);
		assert_eq!(started.elapsed(), Duration::ZERO);
	}
}
