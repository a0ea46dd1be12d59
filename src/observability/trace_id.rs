//! Trace identifier extraction.
//!
//! Request handlers use this to stamp logs and responses with the id of the
//! trace they run under. Extraction never fails: every absence degrades to an
//! empty identifier, with [`TraceLookup`] available when the reason matters.

use opentelemetry::trace::{SpanContext, TraceContextExt};
use opentelemetry::Context;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::tracer;

/// Anything that can report the trace it belongs to.
pub trait TraceIdentity {
    /// Hex trace id, or `None` when no valid trace is attached.
    fn trace_identifier(&self) -> Option<String>;
}

impl TraceIdentity for SpanContext {
    fn trace_identifier(&self) -> Option<String> {
        self.is_valid().then(|| self.trace_id().to_string())
    }
}

impl TraceIdentity for Context {
    fn trace_identifier(&self) -> Option<String> {
        if !self.has_active_span() {
            return None;
        }
        self.span().span_context().trace_identifier()
    }
}

impl TraceIdentity for tracing::Span {
    fn trace_identifier(&self) -> Option<String> {
        self.context().trace_identifier()
    }
}

/// Outcome of a trace identifier lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLookup {
    /// An active, valid span was found.
    Found(String),
    /// The context carries no span.
    NoActiveSpan,
    /// A span is attached but its context is not valid (e.g. a no-op tracer's span).
    InvalidSpanContext,
    /// No tracer has been registered for this process.
    NoRegisteredTracer,
}

impl TraceLookup {
    /// The identifier, or `""` for every non-found outcome.
    pub fn into_identifier(self) -> String {
        match self {
            TraceLookup::Found(id) => id,
            _ => String::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TraceLookup::Found(_))
    }
}

/// Look up the trace id of `cx` through the process-wide tracer.
pub fn lookup_trace_identifier(cx: &Context) -> TraceLookup {
    match lookup_span(cx) {
        TraceLookup::NoActiveSpan => TraceLookup::NoActiveSpan,
        _ if !tracer::is_registered() => TraceLookup::NoRegisteredTracer,
        found => found,
    }
}

/// Trace id of the span active in `cx`, or `""` when there is none or no
/// tracer is registered.
pub fn extract_trace_identifier(cx: &Context) -> String {
    lookup_trace_identifier(cx).into_identifier()
}

/// Trace id of the current `tracing` span, or `""`.
pub fn current_trace_identifier() -> String {
    if !tracer::is_registered() {
        return String::new();
    }
    tracing::Span::current()
        .trace_identifier()
        .unwrap_or_default()
}

pub(crate) fn lookup_span(cx: &Context) -> TraceLookup {
    if !cx.has_active_span() {
        return TraceLookup::NoActiveSpan;
    }
    match cx.span().span_context().trace_identifier() {
        Some(id) => TraceLookup::Found(id),
        None => TraceLookup::InvalidSpanContext,
    }
}
