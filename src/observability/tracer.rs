//! Distributed tracer construction and lifecycle.
//!
//! # Responsibilities
//! - Build an OpenTelemetry tracer provider that exports to a collector
//! - Log every finished span locally
//! - Hand out a closer that flushes buffered spans on shutdown
//! - Register one provider process-wide for ambient trace-id lookups
//!
//! # Design Decisions
//! - Constant sampling: every trace is recorded
//! - Batched export flushed on a 1 second timer (and whenever the buffer fills)
//! - OTLP over gRPC; Jaeger accepts it natively on its collector port

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, Context};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{
    BatchConfigBuilder, BatchSpanProcessor, Sampler, SdkTracer, SdkTracerProvider, Span, SpanData,
    SpanProcessor,
};
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tokio::runtime::RuntimeFlavor;

use crate::config::validation::is_host_port;
use crate::observability::trace_id::{lookup_span, TraceLookup};

/// Interval at which buffered spans are pushed to the collector.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// `tracing` target used for the local span log.
pub const SPAN_LOG_TARGET: &str = "service_common::spans";

/// Instrumentation scope name for tracers handed out by this crate.
pub const INSTRUMENTATION_SCOPE: &str = "service-common";

static GLOBAL_TRACER: OnceLock<TracerHandle> = OnceLock::new();

/// Errors that can occur while building or registering a tracer.
#[derive(Debug, Error)]
pub enum TracingInitError {
    #[error("Service name must not be empty")]
    InvalidServiceName,

    #[error("Collector address `{0}` is not host:port")]
    InvalidCollectorAddress(String),

    #[error("Tracer must be built inside a Tokio runtime")]
    NoRuntime,

    #[error("Tracer needs a multi-threaded Tokio runtime")]
    CurrentThreadRuntime,

    #[error("Span exporter error: {0}")]
    Exporter(String),

    #[error("A tracer is already registered for this process")]
    AlreadyRegistered,
}

/// Error returned when flushing and shutting down a tracer fails.
#[derive(Debug, Error)]
#[error("Tracer shutdown failed: {0}")]
pub struct ShutdownError(String);

/// Tracer client used to start spans.
#[derive(Debug, Clone)]
pub struct TracerHandle {
    provider: SdkTracerProvider,
    service_name: String,
    closed: Arc<AtomicBool>,
}

impl TracerHandle {
    /// A tracer for the given instrumentation scope.
    pub fn tracer(&self, scope: &'static str) -> SdkTracer {
        self.provider.tracer(scope)
    }

    pub fn provider(&self) -> &SdkTracerProvider {
        &self.provider
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Whether the closer paired with this handle has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Trace identifier of the span active in `cx`, or `""`.
    ///
    /// Holding the handle is proof a tracer exists, so no global
    /// registration is required.
    pub fn trace_identifier(&self, cx: &Context) -> String {
        lookup_span(cx).into_identifier()
    }

    /// Diagnostic form of [`TracerHandle::trace_identifier`].
    pub fn lookup_trace_identifier(&self, cx: &Context) -> TraceLookup {
        lookup_span(cx)
    }
}

/// Release capability for a built tracer.
///
/// [`TracerCloser::close`] flushes buffered spans and stops the background
/// exporter. Later calls do nothing. Dropping an unclosed closer closes it.
#[derive(Debug)]
pub struct TracerCloser {
    provider: SdkTracerProvider,
    closed: Arc<AtomicBool>,
}

impl TracerCloser {
    /// Flush and shut down the tracer.
    pub fn close(&self) -> Result<(), ShutdownError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Tracer already closed");
            return Ok(());
        }

        match self.provider.shutdown() {
            Ok(()) => {
                tracing::info!("Tracer flushed and closed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tracer shutdown reported an error");
                Err(ShutdownError(e.to_string()))
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for TracerCloser {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

/// Span processor that writes every finished span to the local log.
#[derive(Debug, Default)]
pub struct SpanLogger;

impl SpanProcessor for SpanLogger {
    fn on_start(&self, _span: &mut Span, _cx: &Context) {}

    fn on_end(&self, span: SpanData) {
        let duration_ms = span
            .end_time
            .duration_since(span.start_time)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();

        tracing::info!(
            target: SPAN_LOG_TARGET,
            trace_id = %span.span_context.trace_id(),
            span_id = %span.span_context.span_id(),
            parent_span_id = %span.parent_span_id,
            name = %span.name,
            duration_ms,
            "Reporting span"
        );
    }

    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown(&self) -> OTelSdkResult {
        Ok(())
    }
}

/// Build a tracer for `service_name` exporting to `collector_address` (`host:port`).
///
/// Must be called inside a multi-threaded Tokio runtime. The exporter's
/// connection runs on that runtime while [`TracerCloser::close`] blocks the
/// calling thread, so a current-thread runtime could never finish the flush.
/// The returned closer must be invoked during shutdown so buffered spans
/// reach the collector.
pub fn build_tracer(
    service_name: &str,
    collector_address: &str,
) -> Result<(TracerHandle, TracerCloser), TracingInitError> {
    if service_name.trim().is_empty() {
        return Err(TracingInitError::InvalidServiceName);
    }
    if !is_host_port(collector_address) {
        return Err(TracingInitError::InvalidCollectorAddress(
            collector_address.to_string(),
        ));
    }
    let endpoint: url::Url = format!("http://{}", collector_address)
        .parse()
        .map_err(|_| TracingInitError::InvalidCollectorAddress(collector_address.to_string()))?;

    match tokio::runtime::Handle::try_current() {
        Err(_) => return Err(TracingInitError::NoRuntime),
        Ok(runtime) if runtime.runtime_flavor() == RuntimeFlavor::CurrentThread => {
            return Err(TracingInitError::CurrentThreadRuntime)
        }
        Ok(_) => {}
    }

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.as_str().trim_end_matches('/'))
        .build()
        .map_err(|e| TracingInitError::Exporter(e.to_string()))?;

    let batch = BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_scheduled_delay(FLUSH_INTERVAL)
                .build(),
        )
        .build();

    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .with_span_processor(SpanLogger)
        .with_span_processor(batch)
        .build();

    tracing::info!(
        service_name = %service_name,
        collector = %collector_address,
        flush_interval_ms = FLUSH_INTERVAL.as_millis() as u64,
        "Tracer initialized"
    );

    let closed = Arc::new(AtomicBool::new(false));
    let handle = TracerHandle {
        provider: provider.clone(),
        service_name: service_name.to_string(),
        closed: closed.clone(),
    };
    let closer = TracerCloser { provider, closed };
    Ok((handle, closer))
}

/// Register `handle` as the process-wide tracer. Succeeds once per process.
pub fn register_global(handle: &TracerHandle) -> Result<(), TracingInitError> {
    GLOBAL_TRACER
        .set(handle.clone())
        .map_err(|_| TracingInitError::AlreadyRegistered)?;
    global::set_tracer_provider(handle.provider.clone());

    tracing::debug!(service_name = %handle.service_name, "Tracer registered globally");
    Ok(())
}

/// The process-wide tracer, if one was registered.
pub fn registered() -> Option<&'static TracerHandle> {
    GLOBAL_TRACER.get()
}

pub fn is_registered() -> bool {
    GLOBAL_TRACER.get().is_some()
}
