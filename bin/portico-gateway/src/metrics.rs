//! Gateway metrics for Prometheus
//!
//! Tracks proxied operations, error rates, transfer volume, and latency.

use std::fmt::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Proxied operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOperation {
    GetObject,
    PutObject,
}

impl GatewayOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetObject => "GetObject",
            Self::PutObject => "PutObject",
        }
    }
}

/// Per-operation metrics
#[derive(Debug, Default)]
struct OperationMetrics {
    /// Total requests
    requests_total: AtomicU64,
    /// Successful requests (2xx)
    requests_success: AtomicU64,
    /// Client errors (4xx)
    requests_client_error: AtomicU64,
    /// Server errors (5xx)
    requests_server_error: AtomicU64,
    /// Total request bytes
    request_bytes_total: AtomicU64,
    /// Total response bytes
    response_bytes_total: AtomicU64,
    /// Latency sum in microseconds
    latency_sum_us: AtomicU64,
}

impl OperationMetrics {
    fn record(&self, status_code: u16, request_bytes: u64, response_bytes: u64, latency_us: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if (200..300).contains(&status_code) {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else if (400..500).contains(&status_code) {
            self.requests_client_error.fetch_add(1, Ordering::Relaxed);
        } else if status_code >= 500 {
            self.requests_server_error.fetch_add(1, Ordering::Relaxed);
        }

        self.request_bytes_total
            .fetch_add(request_bytes, Ordering::Relaxed);
        self.response_bytes_total
            .fetch_add(response_bytes, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
    }
}

/// Gateway metrics collector
#[derive(Debug)]
pub struct GatewayMetrics {
    get_object: OperationMetrics,
    put_object: OperationMetrics,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl GatewayMetrics {
    fn new() -> Self {
        Self {
            get_object: OperationMetrics::default(),
            put_object: OperationMetrics::default(),
            start_time: Instant::now(),
        }
    }

    const fn operation(&self, op: GatewayOperation) -> &OperationMetrics {
        match op {
            GatewayOperation::GetObject => &self.get_object,
            GatewayOperation::PutObject => &self.put_object,
        }
    }

    /// Record one proxied operation
    pub fn record_operation(
        &self,
        op: GatewayOperation,
        status_code: u16,
        request_bytes: u64,
        response_bytes: u64,
        latency_us: u64,
    ) {
        self.operation(op)
            .record(status_code, request_bytes, response_bytes, latency_us);
    }

    /// Export all metrics in Prometheus text exposition format
    pub fn export_prometheus(&self) -> String {
        type Load = fn(&OperationMetrics) -> u64;
        let counters: [(&str, &str, Load); 7] = [
            (
                "portico_requests_total",
                "Total requests by operation",
                |m| m.requests_total.load(Ordering::Relaxed),
            ),
            (
                "portico_requests_success_total",
                "Requests answered with 2xx",
                |m| m.requests_success.load(Ordering::Relaxed),
            ),
            (
                "portico_requests_client_error_total",
                "Requests answered with 4xx",
                |m| m.requests_client_error.load(Ordering::Relaxed),
            ),
            (
                "portico_requests_server_error_total",
                "Requests answered with 5xx",
                |m| m.requests_server_error.load(Ordering::Relaxed),
            ),
            (
                "portico_request_bytes_total",
                "Bytes received in request bodies",
                |m| m.request_bytes_total.load(Ordering::Relaxed),
            ),
            (
                "portico_response_bytes_total",
                "Bytes sent in response bodies",
                |m| m.response_bytes_total.load(Ordering::Relaxed),
            ),
            (
                "portico_latency_sum_microseconds",
                "Sum of request latencies",
                |m| m.latency_sum_us.load(Ordering::Relaxed),
            ),
        ];

        let mut out = String::new();
        for (name, help, load) in counters {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            for op in [GatewayOperation::GetObject, GatewayOperation::PutObject] {
                let _ = writeln!(
                    out,
                    "{name}{{operation=\"{}\"}} {}",
                    op.as_str(),
                    load(self.operation(op))
                );
            }
        }

        let _ = writeln!(out, "# HELP portico_uptime_seconds Gateway uptime");
        let _ = writeln!(out, "# TYPE portico_uptime_seconds gauge");
        let _ = writeln!(
            out,
            "portico_uptime_seconds {}",
            self.start_time.elapsed().as_secs()
        );
        out
    }
}

static GATEWAY_METRICS: OnceLock<GatewayMetrics> = OnceLock::new();

/// Global metrics registry
pub fn gateway_metrics() -> &'static GatewayMetrics {
    GATEWAY_METRICS.get_or_init(GatewayMetrics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_export() {
        let metrics = GatewayMetrics::new();
        metrics.record_operation(GatewayOperation::GetObject, 200, 0, 4, 120);
        metrics.record_operation(GatewayOperation::GetObject, 404, 0, 0, 80);
        metrics.record_operation(GatewayOperation::PutObject, 500, 5, 0, 300);

        let out = metrics.export_prometheus();
        assert!(out.contains("portico_requests_total{operation=\"GetObject\"} 2"));
        assert!(out.contains("portico_requests_success_total{operation=\"GetObject\"} 1"));
        assert!(out.contains("portico_requests_client_error_total{operation=\"GetObject\"} 1"));
        assert!(out.contains("portico_requests_server_error_total{operation=\"PutObject\"} 1"));
        assert!(out.contains("portico_request_bytes_total{operation=\"PutObject\"} 5"));
        assert!(out.contains("portico_uptime_seconds"));
    }
}
