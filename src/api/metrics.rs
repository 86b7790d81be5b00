//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring and observability.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::metrics::{HTTP_REQUESTS_TOTAL, REGISTRY};

/// Metrics endpoint handler
///
/// Returns all metrics in Prometheus text format.
async fn metrics_handler(_user: CurrentUser) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, encoder.format_type())],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// Create metrics router
///
/// Exposes the `/metrics` endpoint to signed-in users.
pub fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Count every request by matched route and response status
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint.as_str(), response.status().as_str()])
        .inc();

    response
}
