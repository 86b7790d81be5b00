//! API layer
//!
//! HTTP handlers for:
//! - The global stream page
//! - Metrics (Prometheus)

pub mod metrics;
mod stream;

pub use metrics::{metrics_router, track_requests};
pub use stream::global_stream;
