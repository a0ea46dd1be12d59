//! Microservice bootstrap helpers: remote configuration and distributed tracing.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod remote;

pub use config::schema::{ConnectionParameters, ServiceConfig};
pub use observability::{build_tracer, extract_trace_identifier, TracerCloser, TracerHandle};
pub use remote::{ConfigBootstrapper, ConfigError, ConfigHandle};
