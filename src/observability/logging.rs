//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Bridge `tracing` spans into the distributed tracer when one is built
//! - Configure log level at runtime
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use thiserror::Error;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::observability::tracer::{TracerHandle, INSTRUMENTATION_SCOPE, SPAN_LOG_TARGET};

/// Error returned when the global subscriber cannot be installed.
#[derive(Debug, Error)]
#[error("Failed to install log subscriber: {0}")]
pub struct LoggingError(#[from] tracing_subscriber::util::TryInitError);

/// Install the global subscriber.
///
/// With a tracer, `tracing` spans are exported as distributed-trace spans, so
/// handlers can read their trace id from `tracing::Span::current()`.
pub fn init_logging(
    config: &ObservabilityConfig,
    tracer: Option<&TracerHandle>,
) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    let otel_layer = tracer.map(|handle| {
        tracing_opentelemetry::layer()
            .with_tracer(handle.tracer(INSTRUMENTATION_SCOPE))
            .with_filter(bridge_filter())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Targets that are active while spans are being exported. Bridging them would
/// feed the exporter its own work, whatever `RUST_LOG` lets through.
const EXPORT_PATH_TARGETS: &[&str] = &[
    SPAN_LOG_TARGET,
    "h2",
    "hyper",
    "hyper_util",
    "tonic",
    "tower",
    "reqwest",
    "opentelemetry",
    "opentelemetry_sdk",
    "opentelemetry_otlp",
];

/// Per-layer filter for the tracing-to-OpenTelemetry bridge.
fn bridge_filter() -> Targets {
    EXPORT_PATH_TARGETS
        .iter()
        .fold(Targets::new().with_default(LevelFilter::TRACE), |targets, target| {
            targets.with_target(*target, LevelFilter::OFF)
        })
}

fn default_directives(level: &str) -> String {
    format!("{level},h2=warn,hyper=warn,tonic=warn,tower=warn,reqwest=warn")
}
