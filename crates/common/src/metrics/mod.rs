//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all StoreKeep metrics
pub const METRICS_PREFIX: &str = "storekeep";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_work_orders_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total work orders created"
    );

    describe_counter!(
        format!("{}_pm_work_orders_generated_total", METRICS_PREFIX),
        Unit::Count,
        "Work orders generated by the PM roller"
    );

    describe_counter!(
        format!("{}_import_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Bulk import rows processed, by outcome"
    );

    describe_counter!(
        format!("{}_mail_sent_total", METRICS_PREFIX),
        Unit::Count,
        "Outbound mail attempts, by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a created work order, labeled by origin (manual, public, pm, request)
pub fn record_work_order_created(origin: &str) {
    counter!(
        format!("{}_work_orders_created_total", METRICS_PREFIX),
        "origin" => origin.to_string()
    )
    .increment(1);
}

/// Record a PM roller pass
pub fn record_pm_generation(generated: usize, skipped: usize) {
    counter!(
        format!("{}_pm_work_orders_generated_total", METRICS_PREFIX),
        "outcome" => "generated"
    )
    .increment(generated as u64);
    counter!(
        format!("{}_pm_work_orders_generated_total", METRICS_PREFIX),
        "outcome" => "skipped"
    )
    .increment(skipped as u64);
}

/// Record bulk import row outcomes
pub fn record_import_rows(kind: &str, imported: usize, failed: usize) {
    counter!(
        format!("{}_import_rows_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "outcome" => "imported"
    )
    .increment(imported as u64);
    counter!(
        format!("{}_import_rows_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "outcome" => "failed"
    )
    .increment(failed as u64);
}

/// Record an outbound mail attempt
pub fn record_mail(success: bool) {
    let outcome = if success { "sent" } else { "failed" };
    counter!(
        format!("{}_mail_sent_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/api/workorders");
        metrics.finish(200);
    }
}
