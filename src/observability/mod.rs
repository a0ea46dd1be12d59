//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     build_tracer(service, collector) → TracerHandle + TracerCloser
//!     register_global(&handle)         → process-wide, write-once
//!     init_logging(config, handle)     → fmt layer + tracing→OTel bridge
//!
//! Requests:
//!     Context / tracing::Span → trace_id.rs → trace id text (or "")
//!
//! Shutdown:
//!     TracerCloser::close → flush buffered spans to the collector
//! ```
//!
//! # Design Decisions
//! - Span export, sampling and buffering belong to the OpenTelemetry SDK
//! - Trace id lookups never fail; absence is an empty string
//! - Trace ids are read straight from the active span context

pub mod logging;
pub mod trace_id;
pub mod tracer;

pub use logging::{init_logging, LoggingError};
pub use trace_id::{
    current_trace_identifier, extract_trace_identifier, lookup_trace_identifier, TraceIdentity,
    TraceLookup,
};
pub use tracer::{
    build_tracer, is_registered, register_global, registered, ShutdownError, TracerCloser,
    TracerHandle, TracingInitError,
};
