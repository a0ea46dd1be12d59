//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build tracer → Register globally → Load remote config → Services
//!     (config load fails → tracer closed → error returned)
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Services::shutdown → tracer flushed → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: tracer first, then config
//! - Every acquired resource is released on every exit path

pub mod shutdown;
pub mod startup;

pub use shutdown::wait_for_signal;
pub use startup::{bootstrap, finish_startup, start_tracing, Services, StartupError};
