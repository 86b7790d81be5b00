//! App.net OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with App.net.
//! Both legs are served by the same route: without `code` the visitor is
//! sent to App.net, with `code` the code is exchanged for a session.

use axum::{
    Router,
    extract::{Host, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;

use super::session::{Session, SessionCodec};
use super::{LOGIN_PATH, LOGOUT_PATH};
use crate::AppState;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::metrics::OAUTH_EXCHANGES_TOTAL;
use crate::provider::{AuthorizationParams, TokenExchangeParams};

/// Create authentication router
///
/// Routes:
/// - GET /auth/login - Redirect to App.net, or complete the exchange
/// - GET /auth/logout - Clear the session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login))
        .route(LOGOUT_PATH, get(logout))
}

/// Query parameters accepted by the login route
///
/// A repeated parameter keeps its last value.
#[derive(Debug, Default)]
struct LoginQuery {
    /// Where to go once signed in
    next: Option<String>,
    /// Authorization code, present on the way back from App.net
    code: Option<String>,
    /// Set by App.net when the user denies access
    error: Option<String>,
    error_description: Option<String>,
}

impl LoginQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::default(), |mut query, (key, value)| {
                match key.as_str() {
                    "next" => query.next = Some(value),
                    "code" => query.code = Some(value),
                    "error" => query.error = Some(value),
                    "error_description" => query.error_description = Some(value),
                    _ => {}
                }
                query
            })
    }
}

// =============================================================================
// Login
// =============================================================================

/// GET /auth/login
///
/// # Steps
/// 1. Build the callback URL from the request host and `next`
/// 2. Without `code`: redirect to App.net's consent page
/// 3. With `code`: exchange it, store the session, redirect to `next`
async fn login(
    State(state): State<AppState>,
    host: Option<Host>,
    Query(pairs): Query<Vec<(String, String)>>,
    jar: CookieJar,
) -> Result<Response> {
    let query = LoginQuery::from_pairs(pairs);
    let next = sanitize_next(query.next.as_deref());
    let host = host.map(|Host(host)| host);
    let redirect_uri = callback_url(&state.config.server, host.as_deref(), &next);

    let code = query.code.filter(|code| !code.is_empty());

    let Some(code) = code else {
        if let Some(error) = query.error {
            tracing::warn!(
                error = %error,
                description = query.error_description.as_deref().unwrap_or(""),
                "App.net declined the authorization request"
            );
            OAUTH_EXCHANGES_TOTAL.with_label_values(&["denied"]).inc();
            return Err(AppError::AuthFailed);
        }

        let url = state.oauth.authorization_redirect(&AuthorizationParams {
            client_id: state.config.provider.client_id.clone(),
            redirect_uri,
            scope: state.config.provider.scope.clone(),
        })?;
        tracing::info!("Redirecting to App.net for authorization");
        return Ok(Redirect::to(url.as_str()).into_response());
    };

    tracing::info!("Received authorization code from App.net");
    let grant = state
        .oauth
        .exchange_code(&TokenExchangeParams {
            redirect_uri,
            client_id: state.config.provider.client_id.clone(),
            client_secret: state.config.provider.client_secret.clone(),
            code,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Token exchange failed");
            OAUTH_EXCHANGES_TOTAL.with_label_values(&["failed"]).inc();
            AppError::AuthFailed
        })?;
    OAUTH_EXCHANGES_TOTAL.with_label_values(&["ok"]).inc();

    let session = Session::new(
        grant.access_token,
        grant.profile,
        state.sessions.max_age_seconds(),
    )?;
    let token = state.sessions.encode(&session)?;
    let cookie = state.sessions.session_cookie(
        &state.config.auth.cookie_name,
        token,
        state.config.should_use_secure_cookies(),
    );

    tracing::info!(
        user = session.display_name().unwrap_or("unknown"),
        "App.net login successful"
    );

    Ok((jar.add(cookie), Redirect::to(&next)).into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// GET /auth/logout
///
/// Clears the session cookie, signed in or not, and redirects to `next`.
async fn logout(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    jar: CookieJar,
) -> impl IntoResponse {
    let next = LoginQuery::from_pairs(pairs).next;
    let clear = SessionCodec::clear(&state.config.auth.cookie_name);
    (jar.add(clear), Redirect::to(&sanitize_next(next.as_deref())))
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept only local absolute paths as post-login destinations
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Callback URL registered with App.net for this request
///
/// Must be rebuilt byte-for-byte on both legs of the flow, so `next`
/// is always encoded the same way.
fn callback_url(server: &ServerConfig, host: Option<&str>, next: &str) -> String {
    let host = host.unwrap_or(&server.domain);
    format!(
        "{}://{}{}?next={}",
        server.protocol,
        host,
        LOGIN_PATH,
        urlencoding::encode(next)
    )
}
