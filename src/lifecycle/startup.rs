//! Startup orchestration.
//!
//! # Responsibilities
//! - Build and register the tracer (when enabled)
//! - Load the remote configuration snapshot
//! - Release whatever was acquired if a later step fails
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned to the caller
//! - Tracer first, so the config load is already traced and logged with it
//! - No retry: an unreachable store aborts startup

use thiserror::Error;

use crate::config::schema::{ServiceConfig, TracingConfig};
use crate::observability::tracer::{
    build_tracer, register_global, ShutdownError, TracerCloser, TracerHandle, TracingInitError,
};
use crate::remote::{ConfigBootstrapper, ConfigError, ConfigHandle};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Tracing setup failed: {0}")]
    Tracing(#[from] TracingInitError),

    #[error("Remote configuration failed: {0}")]
    Config(#[from] ConfigError),
}

/// Everything a service acquires at startup.
#[derive(Debug)]
pub struct Services {
    pub config: ConfigHandle,
    pub tracer: Option<TracerHandle>,
    closer: Option<TracerCloser>,
}

impl Services {
    /// Flush and release the tracer.
    pub fn shutdown(mut self) -> Result<(), ShutdownError> {
        match self.closer.take() {
            Some(closer) => closer.close(),
            None => Ok(()),
        }
    }
}

/// A built tracer together with its release capability.
pub type TracerParts = (TracerHandle, TracerCloser);

/// Build the tracer if tracing is enabled.
///
/// When `register` is set the tracer becomes the process-wide tracer; a
/// tracer that is already registered is left in place.
pub fn start_tracing(
    config: &TracingConfig,
    register: bool,
) -> Result<Option<TracerParts>, StartupError> {
    if !config.enabled {
        tracing::info!("Tracing disabled");
        return Ok(None);
    }

    let (handle, closer) = build_tracer(&config.service_name, &config.collector_address)?;
    if register {
        if let Err(e) = register_global(&handle) {
            tracing::warn!(error = %e, "Keeping previously registered tracer");
        }
    }
    Ok(Some((handle, closer)))
}

/// Load the remote configuration, taking ownership of an already built tracer.
///
/// The tracer is closed before returning if the load fails.
pub async fn finish_startup(
    config: &ServiceConfig,
    tracer: Option<TracerParts>,
) -> Result<Services, StartupError> {
    let (tracer, closer) = match tracer {
        Some((handle, closer)) => (Some(handle), Some(closer)),
        None => (None, None),
    };

    let remote = match ConfigBootstrapper::new(config.consul.clone()).load().await {
        Ok(remote) => remote,
        Err(e) => {
            if let Some(closer) = closer {
                if let Err(close_err) = closer.close() {
                    tracing::warn!(error = %close_err, "Tracer release after failed startup");
                }
            }
            return Err(e.into());
        }
    };

    Ok(Services {
        config: remote,
        tracer,
        closer,
    })
}

/// Acquire the tracer (if enabled) and the remote configuration.
pub async fn bootstrap(config: &ServiceConfig, register: bool) -> Result<Services, StartupError> {
    let tracer = start_tracing(&config.tracing, register)?;
    finish_startup(config, tracer).await
}
