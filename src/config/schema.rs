//! Configuration schema definitions.
//!
//! This module defines the local configuration file of a service that uses
//! the bootstrap helpers. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Key namespace used by services that do not name one explicitly.
pub const DEFAULT_PREFIX: &str = "/micro/config";

/// Root configuration for a service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Remote configuration store connection.
    pub consul: ConnectionParameters,

    /// Distributed tracing settings.
    pub tracing: TracingConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Connection parameters for the remote key-value configuration store.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionParameters {
    /// Store host (e.g., "127.0.0.1").
    pub host: String,

    /// Store HTTP port.
    pub port: u16,

    /// Key namespace. Empty addresses the whole key space.
    pub prefix: String,

    /// URL scheme used to reach the store.
    pub scheme: String,

    /// ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,

    /// Datacenter to query instead of the agent's own.
    pub datacenter: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ConnectionParameters {
    /// Parameters for `host:port` under `prefix`, other fields defaulted.
    pub fn new(host: impl Into<String>, port: u16, prefix: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// `host:port` form of the store address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.url_host(), self.port)
    }

    /// Host as it appears in a URL authority; IPv6 literals are bracketed.
    pub fn url_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8500,
            prefix: DEFAULT_PREFIX.to_string(),
            scheme: "http".to_string(),
            token: None,
            datacenter: None,
            timeout_secs: 10,
        }
    }
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Build and register a tracer at startup.
    pub enabled: bool,

    /// Service name reported to the tracing backend.
    pub service_name: String,

    /// Collector address (`host:port`).
    pub collector_address: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "service-common".to_string(),
            collector_address: "127.0.0.1:4317".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
