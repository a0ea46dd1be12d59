//! Tracer construction, trace id reads through an explicit handle, and startup release.

use opentelemetry::trace::{Span, TraceContextExt, Tracer};
use opentelemetry::Context;
use service_common::config::ServiceConfig;
use service_common::lifecycle::{bootstrap, finish_startup, start_tracing, StartupError};
use service_common::observability::{
    build_tracer, extract_trace_identifier, TraceLookup, TracingInitError,
};

mod common;

#[tokio::test(flavor = "multi_thread")]
async fn test_closer_flushes_with_no_spans() {
    let (handle, closer) = build_tracer("order-service", "127.0.0.1:6831").unwrap();
    assert_eq!(handle.service_name(), "order-service");

    assert!(closer.close().is_ok());
    // Closing twice is safe and reports success.
    assert!(closer.close().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handle_reads_active_trace_id() {
    let (handle, closer) = build_tracer("order-service", "127.0.0.1:6831").unwrap();

    let span = handle.tracer("tests").start("handle-request");
    let cx = Context::current_with_span(span);
    let expected = cx.span().span_context().trace_id().to_string();

    let id = handle.trace_identifier(&cx);
    assert_eq!(id, expected);
    assert_eq!(id.len(), 32);
    assert_eq!(handle.trace_identifier(&cx), id);

    // Child spans share the trace id.
    let child = handle
        .tracer("tests")
        .start_with_context("child", &cx);
    let child_cx = cx.with_span(child);
    assert_eq!(handle.trace_identifier(&child_cx), id);
    child_cx.span().end();

    assert_eq!(handle.trace_identifier(&Context::new()), "");
    assert_eq!(
        handle.lookup_trace_identifier(&Context::new()),
        TraceLookup::NoActiveSpan
    );

    // Nothing is registered in this test binary.
    assert_eq!(extract_trace_identifier(&cx), "");

    cx.span().end();
    let _ = closer.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_span_ended_before_read_keeps_its_id() {
    let (handle, closer) = build_tracer("order-service", "127.0.0.1:6831").unwrap();

    let mut span = handle.tracer("tests").start("short-lived");
    span.end();
    let cx = Context::new().with_span(span);

    assert_eq!(handle.trace_identifier(&cx).len(), 32);
    let _ = closer.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_config_load_aborts_startup() {
    let addr = common::closed_port().await;

    let mut config = ServiceConfig::default();
    config.consul.port = addr.port();
    config.consul.timeout_secs = 2;
    config.tracing.collector_address = "127.0.0.1:6831".into();

    let parts = start_tracing(&config.tracing, false).unwrap();
    let handle = parts.as_ref().map(|(handle, _)| handle.clone()).unwrap();
    assert!(!handle.is_closed());

    let err = finish_startup(&config, parts).await.unwrap_err();
    assert!(matches!(err, StartupError::Config(_)));
    // The tracer is released before the error is returned.
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_current_thread_startup_is_rejected() {
    let mut config = ServiceConfig::default();
    config.tracing.collector_address = "127.0.0.1:6831".into();

    let err = bootstrap(&config, false).await.unwrap_err();
    assert!(matches!(
        err,
        StartupError::Tracing(TracingInitError::CurrentThreadRuntime)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_startup_without_tracing() {
    let (addr, _) = common::start_mock_consul(
        200,
        common::kv_body(&[("micro/config/name", Some(r#""orders""#))]),
    )
    .await;

    let mut config = ServiceConfig::default();
    config.consul.port = addr.port();
    config.tracing.enabled = false;

    let services = bootstrap(&config, false).await.unwrap();
    assert!(services.tracer.is_none());
    assert_eq!(services.config.get_str(&["name"]), Some("orders"));
    assert!(services.shutdown().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_startup_with_tracing() {
    let (addr, _) = common::start_mock_consul(404, String::new()).await;

    let mut config = ServiceConfig::default();
    config.consul.port = addr.port();
    config.tracing.service_name = "order-service".into();
    config.tracing.collector_address = "127.0.0.1:6831".into();

    let services = bootstrap(&config, false).await.unwrap();
    assert!(services.config.is_empty());
    assert_eq!(
        services.tracer.as_ref().map(|t| t.service_name()),
        Some("order-service")
    );
    let handle = services.tracer.clone().unwrap();
    assert!(!handle.is_closed());
    assert!(services.shutdown().is_ok());
    assert!(handle.is_closed());
}
