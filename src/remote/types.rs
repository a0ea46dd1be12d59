//! Remote configuration error definitions.

use thiserror::Error;

/// Errors that can occur while bootstrapping or reading remote configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Connection parameters or the HTTP client could not be set up.
    #[error("Config source initialization failed: {0}")]
    InitializationFailed(String),

    /// The store could not be read, or returned something unusable.
    #[error("Config load from {address} failed: {reason}")]
    LoadFailed { address: String, reason: String },

    /// No value exists at the requested path.
    #[error("No config value at `{0}`")]
    Missing(String),

    /// A value exists but does not deserialize into the requested type.
    #[error("Config value at `{path}` has unexpected shape: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn load(address: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for remote configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::load("127.0.0.1:8500", "connection refused");
        assert_eq!(
            err.to_string(),
            "Config load from 127.0.0.1:8500 failed: connection refused"
        );

        let err = ConfigError::Missing("mysql/host".into());
        assert!(err.to_string().contains("mysql/host"));
    }
}
