//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → consul section feeds remote::ConfigBootstrapper
//!     → tracing section feeds observability::tracer
//! ```
//!
//! # Design Decisions
//! - The local file only says where to find things; service settings live in
//!   the remote store (see `remote`)
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigFileError};
pub use schema::{
    ConnectionParameters, LogFormat, ObservabilityConfig, ServiceConfig, TracingConfig,
    DEFAULT_PREFIX,
};
pub use validation::ValidationError;
