//! Authentication guards
//!
//! The session cookie is the only credential. Pages redirect anonymous
//! visitors to the login flow; machine endpoints answer 401 instead.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{Uri, request::Parts},
    response::Redirect,
};
use axum_extra::extract::CookieJar;

use super::LOGIN_PATH;
use super::session::Session;
use crate::AppState;
use crate::error::AppError;

/// Read and verify the session cookie, if any
pub fn current_session(jar: &CookieJar, state: &AppState) -> Option<Session> {
    let cookie = jar.get(&state.config.auth.cookie_name)?;
    state.sessions.decode(cookie.value())
}

/// Guard for pages that need a signed-in user
///
/// Returns the session, or a redirect to the login flow that brings
/// the visitor back to `uri` afterwards.
///
/// # Usage
/// ```ignore
/// let session = match require_session(&jar, &state, &uri) {
///     Ok(session) => session,
///     Err(redirect) => return redirect.into_response(),
/// };
/// ```
pub fn require_session(jar: &CookieJar, state: &AppState, uri: &Uri) -> Result<Session, Redirect> {
    current_session(jar, state).ok_or_else(|| {
        let next = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Redirect::to(&format!(
            "{LOGIN_PATH}?next={}",
            urlencoding::encode(next)
        ))
    })
}

/// Extractor for current authenticated user
///
/// Rejects with 401 when no valid session cookie is present.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {:?}", session.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentUser(session));
        }

        let state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let session = current_session(&jar, &state).ok_or(AppError::Unauthorized)?;
        parts.extensions.insert(session.clone());

        Ok(CurrentUser(session))
    }
}
