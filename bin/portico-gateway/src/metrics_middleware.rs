//! Metrics middleware for automatic proxy operation tracking
//!
//! Intercepts all requests and records metrics based on the HTTP method.

use crate::metrics::{GatewayOperation, gateway_metrics};
use axum::{
    body::Body,
    extract::Request,
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Map the HTTP method onto a proxied operation
fn extract_operation(method: &Method) -> Option<GatewayOperation> {
    if *method == Method::GET {
        Some(GatewayOperation::GetObject)
    } else if *method == Method::PUT {
        Some(GatewayOperation::PutObject)
    } else {
        None
    }
}

fn content_length(headers: &axum::http::HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Metrics middleware that records proxy operation metrics
pub async fn metrics_layer(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // Skip the metrics and health endpoints
    let path = request.uri().path();
    if path == "/metrics" || path == "/health" {
        return next.run(request).await;
    }

    let operation = extract_operation(request.method());
    let request_bytes = content_length(request.headers());

    let response = next.run(request).await;

    if let Some(op) = operation {
        let status_code = response.status().as_u16();
        let latency_us = start.elapsed().as_micros() as u64;
        let response_bytes = content_length(response.headers());
        gateway_metrics().record_operation(op, status_code, request_bytes, response_bytes, latency_us);
    }

    response
}
