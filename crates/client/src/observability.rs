use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder,
};

use crate::operation::Operation;

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "apikeys_client_requests_total",
        "Total exchanges with the API key service by outcome",
        &["operation", "outcome"]
    )
    .expect("register requests_total")
});

pub static RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "apikeys_client_retries_total",
        "Total retry attempts for idempotent reads",
        &["operation"]
    )
    .expect("register retries_total")
});

pub static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "apikeys_client_request_duration_seconds",
        "Duration of a single exchange in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register request_duration")
});

pub fn record_outcome(operation: Operation, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[operation.as_str(), outcome]).inc();
}

pub fn record_retry(operation: Operation) {
    RETRIES_TOTAL.with_label_values(&[operation.as_str()]).inc();
}

pub fn observe_duration(operation: Operation, secs: f64) {
    REQUEST_DURATION.with_label_values(&[operation.as_str()]).observe(secs);
}

/// Text exposition of everything in the default registry.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("metrics encode error: {e}");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
