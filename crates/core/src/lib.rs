//! Concurrent meeting-join stress harness.
//!
//! Simulates many independent participants joining a browser-based
//! conference session through a UI-automation driver. Each participant is
//! a [`worker::WorkerSession`] running as its own task with its own driver
//! instance; the [`scheduler`] spaces launches out and waits for everyone;
//! the only state shared across workers is the monotonic
//! [`shutdown::ShutdownSignal`]. One worker's fault never touches another:
//! every fault is caught at the session boundary and converted into a
//! [`worker::WorkerOutcome`].

pub mod driver;
pub mod error;
pub mod locator;
pub mod scheduler;
pub mod selectors;
pub mod shutdown;
pub mod stages;
pub mod webdriver;
pub mod worker;

pub use driver::{AutomationProfile, Driver, DriverFactory};
pub use error::{DriverFault, DriverResult, JoinError, Result};
pub use locator::{Locator, LocatorStrategy, Predicate, Resolved, StrategyChain, resolve};
pub use scheduler::{LaunchMode, RunConfig, run};
pub use selectors::JoinSelectors;
pub use shutdown::{ShutdownSignal, Wait};
pub use stages::{JoinFlow, Scope, Stage, StageOutcome};
pub use webdriver::{WebDriver, WebDriverFactory};
pub use worker::{FinalState, WorkerOutcome, WorkerSession, WorkerSpec, WorkerState};
