//! Oxicord sync - the real-time synchronization core of the Oxicord client.
//!
//! Remote events flow through a per-family pipeline into a session cache,
//! read-state tracker and navigation state machine. Every change to what the
//! user sees goes through a single UI gateway.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the pipeline, services and UI gateway.
pub mod application;
/// Domain layer containing entities, events, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "oxicord-sync";
