use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "delivery_client_requests_total",
        "Total requests sent to the backend"
    )
    .expect("register requests_total")
});

pub static REQUEST_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "delivery_client_request_errors_total",
        "Failed requests by error kind",
        &["kind"]
    )
    .expect("register request_errors_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "delivery_client_request_duration_seconds",
        "Request duration in seconds",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]
    )
    .expect("register request_duration")
});

pub static CANCELLED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "delivery_client_cancelled_total",
        "Requests aborted by cancel_all or timeout"
    )
    .expect("register cancelled_total")
});

pub static SESSION_TEARDOWNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "delivery_client_session_teardowns_total",
        "Completed session teardowns (logout or expiry)"
    )
    .expect("register session_teardowns_total")
});

/// Text exposition of the default registry.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {e}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
