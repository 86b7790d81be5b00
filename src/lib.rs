//! adnstream - sign in with App.net and read the global stream
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - GET /             global stream (signed in)              │
//! │  - GET /auth/login   OAuth2 redirect + code exchange        │
//! │  - GET /auth/logout  clear session                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Session codec / Provider                     │
//! │  - HMAC-signed session cookie                               │
//! │  - App.net OAuth2 client + stream fetcher                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: stream page and metrics endpoint
//! - `auth`: OAuth flow, session cookie, guards
//! - `provider`: App.net client behind `OAuthProvider` / `StreamFetcher`
//! - `views`: HTML rendering
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod views;

use std::sync::Arc;

use provider::{AppNetClient, OAuthProvider, StreamFetcher};

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is immutable.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Session cookie signer
    pub sessions: Arc<auth::SessionCodec>,

    /// OAuth2 client
    pub oauth: Arc<dyn OAuthProvider>,

    /// Stream reader
    pub streams: Arc<dyn StreamFetcher>,
}

impl AppState {
    /// Initialize application state backed by App.net
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or a provider URL is invalid
    pub fn new(config: config::AppConfig) -> error::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("adnstream/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let appnet = Arc::new(AppNetClient::new(&config.provider, http_client)?);
        tracing::info!(
            api = %config.provider.api_base_url,
            "App.net client initialized"
        );

        Ok(Self::with_provider(config, appnet.clone(), appnet))
    }

    /// Initialize application state with explicit provider implementations
    pub fn with_provider(
        config: config::AppConfig,
        oauth: Arc<dyn OAuthProvider>,
        streams: Arc<dyn StreamFetcher>,
    ) -> Self {
        let sessions = auth::SessionCodec::new(
            config.auth.cookie_secret.as_bytes().to_vec(),
            config.auth.session_max_age,
        );

        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            oauth,
            streams,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware, routing::get};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/", get(api::global_stream))
        .route("/health", get(health_check))
        .merge(auth::auth_router())
        .merge(api::metrics_router())
        .layer(middleware::from_fn(api::track_requests))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
