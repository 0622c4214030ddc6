//! Telemetry: structured logging infrastructure.
//!
//! Warden emits `tracing` events (access decisions, compliance diagnostics,
//! error metrics labels) and leaves collection to the embedding application.
//! [`init_logging`] installs a subscriber for applications and test harnesses
//! that do not bring their own.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig};
