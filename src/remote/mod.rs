//! Remote configuration bootstrap.
//!
//! # Data Flow
//! ```text
//! ConnectionParameters (host, port, prefix)
//!     → consul.rs (HTTP client + GET /v1/kv/<prefix>?recurse=true)
//!     → consul.rs (base64 decode, strip prefix, fold into tree)
//!     → ConfigHandle (immutable snapshot, owned by the caller)
//! ```
//!
//! # Design Decisions
//! - One load at call time; no watch, no refresh, no retry
//! - A prefix with no keys is an empty config, not an error
//! - Keys are read without repeating the prefix

pub mod consul;
pub mod handle;
pub mod types;

pub use consul::ConsulSource;
pub use handle::ConfigHandle;
pub use types::{ConfigError, ConfigResult};

use crate::config::schema::ConnectionParameters;

/// Builds a [`ConfigHandle`] from a single read of the remote store.
#[derive(Debug, Clone)]
pub struct ConfigBootstrapper {
    params: ConnectionParameters,
}

impl ConfigBootstrapper {
    pub fn new(params: ConnectionParameters) -> Self {
        Self { params }
    }

    /// Load `host:port` under `prefix` with default client settings.
    pub async fn build(host: &str, port: u16, prefix: &str) -> ConfigResult<ConfigHandle> {
        Self::new(ConnectionParameters::new(host, port, prefix))
            .load()
            .await
    }

    /// Perform the load. Consumes the bootstrapper; parameters are not retained.
    pub async fn load(self) -> ConfigResult<ConfigHandle> {
        let source = ConsulSource::new(&self.params)?;

        match source.read().await {
            Ok((tree, loaded_keys)) => {
                tracing::info!(
                    address = %source.address(),
                    prefix = %self.params.prefix,
                    keys = loaded_keys,
                    "Remote configuration loaded"
                );
                Ok(ConfigHandle::new(tree, source.address(), loaded_keys))
            }
            Err(e) => {
                tracing::warn!(
                    address = %source.address(),
                    prefix = %self.params.prefix,
                    error = %e,
                    "Remote configuration load failed"
                );
                Err(e)
            }
        }
    }
}
