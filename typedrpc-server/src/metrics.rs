//! Dispatch metrics
//!
//! OpenTelemetry instruments recorded by the dispatcher when metrics are
//! enabled on the builder. They go through the global meter provider, so
//! they are no-ops until [`typedrpc_core::init_observability`] installs one.
//!
//! # Metrics Collected
//!
//! - **typedrpc.dispatch.requests.total**: requests dispatched, by method and status
//! - **typedrpc.dispatch.request.duration**: dispatch latency in seconds
//! - **typedrpc.dispatch.batch.size**: entries per batch, by mode
//! - **typedrpc.dispatch.errors.total**: error responses, by JSON-RPC error kind

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instruments recorded by the dispatcher
#[derive(Clone)]
pub struct DispatchMetrics {
    /// Requests dispatched
    pub requests_total: Counter<u64>,
    /// Dispatch duration in seconds
    pub request_duration: Histogram<f64>,
    /// Entries per batch
    pub batch_size: Histogram<u64>,
    /// Error responses
    pub errors_total: Counter<u64>,
}

impl DispatchMetrics {
    /// Instruments on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        // global::meter wants a 'static name; one leak per dispatcher build
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Instruments on a caller-provided meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("typedrpc.dispatch.requests.total")
                .with_description("Total number of JSON-RPC requests dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("typedrpc.dispatch.request.duration")
                .with_description("Request dispatch duration in seconds")
                .with_unit("s")
                .build(),
            batch_size: meter
                .u64_histogram("typedrpc.dispatch.batch.size")
                .with_description("Number of entries in batch requests")
                .build(),
            errors_total: meter
                .u64_counter("typedrpc.dispatch.errors.total")
                .with_description("Total number of error responses")
                .build(),
        }
    }

    /// Record one dispatched request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record a batch
    pub fn record_batch(&self, size: u64, mode: &str) {
        self.batch_size
            .record(size, &[KeyValue::new("mode", mode.to_string())]);
    }

    /// Record an error response
    pub fn record_error(&self, kind: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_kind", kind.to_string())]);
    }
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = DispatchMetrics::new("test-dispatch");

        metrics.record_request("add", "success", 0.1);
        metrics.record_batch(10, "parallel");
        metrics.record_error("invalid_params");
    }

    #[test]
    fn test_request_metrics() {
        let metrics = DispatchMetrics::new("test-dispatch-req");

        metrics.record_request("add", "success", 0.05);
        metrics.record_request("divide", "error", 0.01);
        metrics.record_error("method_not_found");
        metrics.record_error("application");
    }
}
