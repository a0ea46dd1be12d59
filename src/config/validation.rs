//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports valid, timeouts > 0)
//! - Check addresses have the `host:port` shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a service config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("consul.host must not be empty")]
    EmptyConsulHost,

    #[error("consul.port must be greater than 0")]
    InvalidConsulPort,

    #[error("consul.timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("consul.scheme must be http or https, got `{0}`")]
    UnsupportedScheme(String),

    #[error("tracing.service_name must not be empty")]
    EmptyServiceName,

    #[error("tracing.collector_address `{0}` is not host:port")]
    InvalidCollectorAddress(String),

    #[error("observability.log_level `{0}` is not a known level")]
    UnknownLogLevel(String),
}

/// Validate a parsed config, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let consul = &config.consul;
    if consul.host.trim().is_empty() {
        errors.push(ValidationError::EmptyConsulHost);
    }
    if consul.port == 0 {
        errors.push(ValidationError::InvalidConsulPort);
    }
    if consul.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if consul.scheme != "http" && consul.scheme != "https" {
        errors.push(ValidationError::UnsupportedScheme(consul.scheme.clone()));
    }

    // Tracing settings only matter when a tracer will be built.
    if config.tracing.enabled {
        if config.tracing.service_name.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceName);
        }
        if !is_host_port(&config.tracing.collector_address) {
            errors.push(ValidationError::InvalidCollectorAddress(
                config.tracing.collector_address.clone(),
            ));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `address` is `host:port` with a non-empty host and a non-zero port.
pub fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains('/') && matches!(port.parse::<u16>(), Ok(p) if p > 0)
        }
        None => false,
    }
}
