use prometheus::TEXT_FORMAT;
use service_core::axum::{http::header, response::IntoResponse};

use crate::services::metrics::get_metrics;

/// Prometheus exposition of request, reconciliation and cache counters.
pub async fn metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], get_metrics())
}
