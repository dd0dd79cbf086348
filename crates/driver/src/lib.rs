//! Thin async client for the W3C WebDriver wire protocol.
//!
//! This crate owns the remote-session lifecycle (create, command, quit) and
//! the serde types matching the shapes data takes on the wire. It knows
//! nothing about meetings or join protocols; higher-level behavior lives in
//! `swarm-core`, which consumes this client behind its `Driver` trait.
//!
//! Types here are pure data plus one HTTP session handle. Every command may
//! fail with a [`Error`]; [`Error::is_session_fault`] classifies faults
//! that mean the remote session is gone for good.

mod caps;
mod error;
mod session;
mod wire;

pub use caps::Capabilities;
pub use error::{Error, Result};
pub use session::DriverSession;
pub use wire::{ELEMENT_KEY, ElementRef};
