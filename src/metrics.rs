//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("adnstream_http_requests_total", "Total number of HTTP requests"),
        &["endpoint", "status"]
    ).expect("metric can be created");

    // OAuth Metrics
    pub static ref OAUTH_EXCHANGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("adnstream_oauth_exchanges_total", "Total number of OAuth2 code exchanges"),
        &["outcome"]
    ).expect("metric can be created");

    // Stream Metrics
    pub static ref STREAM_FETCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("adnstream_stream_fetches_total", "Total number of global stream fetches"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref STREAM_FETCH_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "adnstream_stream_fetch_duration_seconds",
            "Global stream fetch duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("adnstream_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(OAUTH_EXCHANGES_TOTAL.clone()))
            .expect("OAUTH_EXCHANGES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STREAM_FETCHES_TOTAL.clone()))
            .expect("STREAM_FETCHES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STREAM_FETCH_DURATION_SECONDS.clone()))
            .expect("STREAM_FETCH_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
