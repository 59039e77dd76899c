use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mecanix_gateway_requests_total",
        "Total calls issued through the gateway client"
    )
    .expect("register requests_total")
});

pub static FAILED_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mecanix_gateway_failed_requests_total",
        "Total calls that resolved with an error"
    )
    .expect("register failed_requests_total")
});

pub static RETRIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mecanix_gateway_retries_total",
        "Total automatic resends after network failures"
    )
    .expect("register retries_total")
});

pub static SESSION_EXPIRED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mecanix_gateway_session_expired_total",
        "Total 401 responses that ended the session"
    )
    .expect("register session_expired_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "mecanix_gateway_request_duration_seconds",
        "Duration of a single dispatch in seconds",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register request_duration")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {e}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_metrics_include_gateway_counters() {
        REQUESTS_TOTAL.inc();
        RETRIES_TOTAL.inc_by(0);
        let text = encode_metrics();
        assert!(text.contains("mecanix_gateway_requests_total"));
        assert!(text.contains("mecanix_gateway_retries_total"));
    }
}
