//! Service bootstrap demo.
//!
//! Starts the way a real service built on this crate would, then waits for a
//! shutdown signal.
//!
//! ```text
//!   service.toml ──▶ config::loader ──▶ ServiceConfig
//!                                           │
//!             ┌─────────────────────────────┴──────────────┐
//!             ▼                                            ▼
//!   observability::tracer                          remote (Consul KV)
//!   build + register global                        one-shot load
//!             │                                            │
//!             └──────────────▶ lifecycle::Services ◀───────┘
//!                                    │
//!                         SIGTERM/SIGINT → close tracer
//! ```

use std::path::PathBuf;

use clap::Parser;

use service_common::config::{load_config, ServiceConfig};
use service_common::lifecycle::{finish_startup, start_tracing, wait_for_signal};
use service_common::observability::{current_trace_identifier, init_logging};

#[derive(Parser)]
#[command(name = "service-common")]
#[command(about = "Bootstrap remote configuration and tracing for a service", long_about = None)]
struct Cli {
    /// Path to the service config file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the loaded remote configuration as JSON and exit.
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    // Tracer before logging, so `tracing` spans are bridged to it.
    let tracer = start_tracing(&config.tracing, true)?;
    init_logging(&config.observability, tracer.as_ref().map(|(handle, _)| handle))?;

    tracing::info!("service-common v0.1.0 starting");

    let services = finish_startup(&config, tracer).await?;

    tracing::info_span!("startup").in_scope(|| {
        tracing::info!(
            consul = %config.consul.address(),
            prefix = %config.consul.prefix,
            keys = services.config.len(),
            trace_id = %current_trace_identifier(),
            "Configuration loaded"
        );
    });

    if cli.dump {
        println!("{}", serde_json::to_string_pretty(services.config.as_value())?);
    } else {
        wait_for_signal().await;
    }

    services.shutdown()?;
    tracing::info!("Shutdown complete");
    Ok(())
}
