//! HTTP client for App.net
//!
//! Every API response is wrapped in an envelope:
//! `{ "meta": { "code": 200 }, "data": ... }`.

use axum::async_trait;
use serde::Deserialize;
use url::Url;

use super::{
    AuthorizationParams, OAuthProvider, Post, StreamError, StreamFetcher, TokenExchangeParams,
    TokenGrant,
};
use crate::config::ProviderConfig;
use crate::error::AppError;

const GLOBAL_STREAM_PATH: &str = "/stream/0/posts/stream/global";
const CURRENT_USER_PATH: &str = "/stream/0/users/me";

/// App.net OAuth2 and stream client
pub struct AppNetClient {
    http: reqwest::Client,
    authorize_url: Url,
    token_url: Url,
    api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token: Option<TokenInfo>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    user: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    meta: Meta,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    code: u16,
    #[serde(default)]
    error_message: Option<String>,
}

impl AppNetClient {
    /// Create a client from provider configuration
    ///
    /// # Errors
    /// Returns error if a configured URL does not parse
    pub fn new(config: &ProviderConfig, http: reqwest::Client) -> crate::error::Result<Self> {
        let authorize_url = Url::parse(&config.authorize_url)
            .map_err(|e| AppError::Config(format!("provider.authorize_url: {e}")))?;
        let token_url = Url::parse(&config.token_url)
            .map_err(|e| AppError::Config(format!("provider.token_url: {e}")))?;

        Ok(Self {
            http,
            authorize_url,
            token_url,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Look up the token owner when the token response carries no user
    async fn current_user(&self, access_token: &str) -> crate::error::Result<serde_json::Value> {
        let response = self
            .http
            .get(self.api_url(CURRENT_USER_PATH))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "users/me returned {}",
                response.status()
            )));
        }

        let envelope: Envelope<serde_json::Value> = response.json().await?;
        envelope
            .data
            .filter(serde_json::Value::is_object)
            .ok_or(AppError::AuthFailed)
    }
}

#[async_trait]
impl OAuthProvider for AppNetClient {
    fn authorization_redirect(&self, params: &AuthorizationParams) -> Result<Url, AppError> {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &params.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &params.redirect_uri)
            .append_pair("scope", &params.scope);
        Ok(url)
    }

    async fn exchange_code(&self, params: &TokenExchangeParams) -> Result<TokenGrant, AppError> {
        let form = [
            ("client_id", params.client_id.as_str()),
            ("client_secret", params.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", params.redirect_uri.as_str()),
            ("code", params.code.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "App.net token endpoint rejected the code");
            return Err(AppError::AuthFailed);
        }

        let token: TokenResponse = response.json().await?;
        if let Some(error) = token.error {
            tracing::warn!(error = %error, "App.net token endpoint returned an error");
            return Err(AppError::AuthFailed);
        }

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::AuthFailed)?;

        let user = match token.token.and_then(|info| info.user) {
            Some(user) if user.is_object() => user,
            _ => self.current_user(&access_token).await?,
        };

        let mut profile = user;
        if let Some(fields) = profile.as_object_mut() {
            fields.insert(
                "access_token".to_string(),
                serde_json::Value::String(access_token.clone()),
            );
        }

        Ok(TokenGrant {
            access_token,
            profile,
        })
    }
}

#[async_trait]
impl StreamFetcher for AppNetClient {
    async fn global_stream(&self, access_token: &str) -> Result<Vec<Post>, StreamError> {
        let response = self
            .http
            .get(self.api_url(GLOBAL_STREAM_PATH))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StreamError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StreamError::Upstream(format!("status {status}")));
        }

        let envelope: Envelope<Vec<Post>> = response.json().await?;
        if envelope.meta.code == 401 {
            return Err(StreamError::Unauthorized);
        }

        envelope.data.ok_or_else(|| {
            StreamError::Upstream(
                envelope
                    .meta
                    .error_message
                    .unwrap_or_else(|| "response carried no data".to_string()),
            )
        })
    }
}
