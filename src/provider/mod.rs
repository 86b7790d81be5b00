//! App.net provider integration
//!
//! Two seams separate the route handlers from the social network:
//! - [`OAuthProvider`]: builds the consent redirect and exchanges codes
//! - [`StreamFetcher`]: reads the global stream with an access token
//!
//! [`AppNetClient`] implements both over HTTP.

mod appnet;

pub use appnet::AppNetClient;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// Parameters for the consent redirect (first leg)
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
}

/// Parameters for the code exchange (second leg)
///
/// `redirect_uri` must be byte-identical to the one sent in the first leg.
#[derive(Debug, Clone)]
pub struct TokenExchangeParams {
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
}

/// Successful code exchange
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Opaque user profile, stored in the session as-is
    pub profile: serde_json::Value,
}

/// OAuth2 authorization-code client
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL of the provider's consent page for these parameters
    fn authorization_redirect(&self, params: &AuthorizationParams) -> Result<Url, AppError>;

    /// Exchange an authorization code for an access token and user profile
    ///
    /// # Errors
    /// Returns [`AppError::AuthFailed`] when the provider does not hand back
    /// a user, or a transport error.
    async fn exchange_code(&self, params: &TokenExchangeParams) -> Result<TokenGrant, AppError>;
}

/// Why a stream could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Token rejected by the provider
    #[error("access token rejected")]
    Unauthorized,

    /// Anything else: transport failure, bad status, missing data
    #[error("stream request failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        StreamError::Upstream(err.to_string())
    }
}

/// Authenticated feed reader
#[async_trait]
pub trait StreamFetcher: Send + Sync {
    /// Fetch the global stream as seen by the token's user
    async fn global_stream(&self, access_token: &str) -> Result<Vec<Post>, StreamError>;
}

/// A post in an App.net stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Provider-rendered HTML body
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<PostUser>,
    #[serde(default)]
    pub num_replies: u64,
    #[serde(default)]
    pub num_reposts: u64,
    /// Deleted posts come back as stubs without text
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostUser {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}
