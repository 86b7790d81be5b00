//! Global stream page

use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::auth::{LOGIN_PATH, require_session};
use crate::metrics::{STREAM_FETCH_DURATION_SECONDS, STREAM_FETCHES_TOTAL};
use crate::provider::StreamError;
use crate::views;

/// GET /
///
/// Renders the global stream for the signed-in user. Any failure to load
/// the stream sends the visitor back through login, since App.net answers
/// stale tokens the same way it answers everything else it refuses.
pub async fn global_stream(
    State(state): State<AppState>,
    jar: CookieJar,
    uri: Uri,
) -> Response {
    let session = match require_session(&jar, &state, &uri) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    let timer = STREAM_FETCH_DURATION_SECONDS.start_timer();
    let result = state.streams.global_stream(&session.access_token).await;
    timer.observe_duration();

    match result {
        Ok(posts) => {
            STREAM_FETCHES_TOTAL.with_label_values(&["ok"]).inc();
            tracing::debug!(posts = posts.len(), "Global stream fetched");
            Html(views::stream_page(session.display_name(), &posts)).into_response()
        }
        Err(StreamError::Unauthorized) => {
            STREAM_FETCHES_TOTAL.with_label_values(&["unauthorized"]).inc();
            tracing::info!("Access token rejected; session may have expired");
            Redirect::to(LOGIN_PATH).into_response()
        }
        Err(error @ StreamError::Upstream(_)) => {
            STREAM_FETCHES_TOTAL.with_label_values(&["failed"]).inc();
            tracing::warn!(%error, "Global stream fetch failed");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
