use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Global metrics instance.
pub static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Metrics collector for the finance backend.
#[derive(Debug, Clone, Default)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_ms: f64) {
        counter!("finance_http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
        histogram!("finance_http_request_duration_ms", "method" => method.to_string(), "path" => path.to_string()).record(duration_ms);
    }

    pub fn record_transaction_created(&self, trans_type: &str, prepared: bool) {
        counter!("finance_transactions_created_total", "type" => trans_type.to_string(), "prepared" => prepared.to_string()).increment(1);
    }

    pub fn record_transaction_deleted(&self) {
        counter!("finance_transactions_deleted_total").increment(1);
    }

    pub fn record_registration(&self, user_type: &str) {
        counter!("finance_registrations_total", "user_type" => user_type.to_string()).increment(1);
    }

    pub fn record_login(&self, success: bool) {
        counter!("finance_logins_total", "success" => success.to_string()).increment(1);
    }

    pub fn record_image_uploaded(&self, size_bytes: u64) {
        counter!("finance_images_uploaded_total").increment(1);
        histogram!("finance_image_size_bytes").record(size_bytes as f64);
    }

    pub fn record_analytics_query(&self, kind: &str, duration_ms: f64) {
        histogram!("finance_analytics_query_duration_ms", "kind" => kind.to_string()).record(duration_ms);
    }
}

/// Timer for measuring operation latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for LatencyTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the Prometheus recorder once and returns its handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    let handle = METRICS_HANDLE.get_or_init(|| handle).clone();
    METRICS.get_or_init(Metrics::new);

    Ok(handle)
}

fn describe_metrics() {
    describe_counter!("finance_http_requests_total", Unit::Count, "Total HTTP requests");
    describe_histogram!("finance_http_request_duration_ms", Unit::Milliseconds, "HTTP request latency in milliseconds");

    describe_counter!("finance_transactions_created_total", Unit::Count, "Total number of transactions created");
    describe_counter!("finance_transactions_deleted_total", Unit::Count, "Total number of transactions marked deleted");

    describe_counter!("finance_registrations_total", Unit::Count, "Total number of registered users");
    describe_counter!("finance_logins_total", Unit::Count, "Total number of login attempts");

    describe_counter!("finance_images_uploaded_total", Unit::Count, "Total number of uploaded article images");
    describe_histogram!("finance_image_size_bytes", Unit::Bytes, "Uploaded article image size");

    describe_histogram!("finance_analytics_query_duration_ms", Unit::Milliseconds, "Analytics query latency in milliseconds");
}

/// Returns the global metrics instance.
pub fn get_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_timer() {
        let timer = LatencyTimer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10.0);
        assert!(timer.elapsed_secs() >= 0.01);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let metrics = get_metrics();
        metrics.record_http_request("GET", "/api/v1/categories", 200, 1.5);
        metrics.record_transaction_created("credit", false);
        metrics.record_image_uploaded(1024);
    }
}
