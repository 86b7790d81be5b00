//! E2E tests for the App.net OAuth flow and session cookie

mod common;

use common::{
    StreamReply, StubOAuth, StubStream, TestServer, location, session_cookie_value, set_cookies,
};
use url::Url;

#[tokio::test]
async fn test_login_without_code_redirects_to_provider() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?next=%2Fsomewhere"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    let target = Url::parse(&location(&response)).expect("absolute provider URL");
    assert_eq!(target.host_str(), Some("account.app.net"));

    let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    let redirect_uri = pairs
        .iter()
        .find(|(k, _)| k == "redirect_uri")
        .map(|(_, v)| v.clone())
        .expect("redirect_uri parameter");
    assert_eq!(
        redirect_uri,
        format!("http://{}/auth/login?next=%2Fsomewhere", server.host)
    );
    assert!(pairs.contains(&("client_id".to_string(), "test-client-id".to_string())));
    assert!(pairs.contains(&("scope".to_string(), "basic,stream".to_string())));
    assert!(server.oauth.exchanges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_defaults_next_to_root() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login"))
        .send()
        .await
        .expect("request succeeds");

    let target = Url::parse(&location(&response)).unwrap();
    let redirect_uri = target
        .query_pairs()
        .find(|(k, _)| k == "redirect_uri")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_eq!(
        redirect_uri,
        format!("http://{}/auth/login?next=%2F", server.host)
    );
}

#[tokio::test]
async fn test_callback_exchanges_code_and_sets_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?next=%2Fsomewhere&code=abc123"))
        .send()
        .await
        .expect("request succeeds");

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/somewhere");

    let exchanges = server.oauth.exchanges.lock().unwrap().clone();
    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].code, "abc123");
    assert_eq!(exchanges[0].client_id, "test-client-id");
    assert_eq!(exchanges[0].client_secret, "test-client-secret");
    assert_eq!(
        exchanges[0].redirect_uri,
        format!("http://{}/auth/login?next=%2Fsomewhere", server.host)
    );

    let cookies = set_cookies(&response);
    let value = session_cookie_value(&cookies).expect("session cookie issued");
    assert!(cookies.iter().any(|c| c.contains("HttpOnly")));

    let session = server
        .state
        .sessions
        .decode(&value)
        .expect("issued cookie decodes");
    assert_eq!(session.access_token, "T");
    assert_eq!(session.profile["name"], "Alice");
}

#[tokio::test]
async fn test_callback_redirect_uri_matches_first_leg() {
    let server = TestServer::new().await;

    let first = server
        .client
        .get(server.url("/auth/login?next=%2F%3Fpage%3D2"))
        .send()
        .await
        .unwrap();
    let sent = Url::parse(&location(&first))
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "redirect_uri")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    // App.net appends the code to the registered callback URL
    let callback = format!("{sent}&code=xyz");
    let second = server.client.get(&callback).send().await.unwrap();

    assert!(second.status().is_redirection());
    assert_eq!(location(&second), "/?page=2");
    let exchanges = server.oauth.exchanges.lock().unwrap().clone();
    assert_eq!(exchanges[0].redirect_uri, sent);
}

#[tokio::test]
async fn test_callback_without_next_redirects_home() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?code=abc123"))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_callback_without_user_is_server_error() {
    let server = TestServer::with(
        StubOAuth::returning(None),
        StubStream::new(StreamReply::Posts(Vec::new())),
    )
    .await;

    let response = server
        .client
        .get(server.url("/auth/login?code=abc123"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert!(session_cookie_value(&set_cookies(&response)).is_none());
    let body = response.text().await.unwrap();
    assert_eq!(body, "App.Net auth failed");
}

#[tokio::test]
async fn test_provider_denial_is_server_error() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?error=access_denied&error_description=nope"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert!(server.oauth.exchanges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_next_uses_last_value() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?next=%2Fa&next=%2Fb&code=abc123"))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/b");
    let exchanges = server.oauth.exchanges.lock().unwrap().clone();
    assert_eq!(
        exchanges[0].redirect_uri,
        format!("http://{}/auth/login?next=%2Fb", server.host)
    );
}

#[tokio::test]
async fn test_offsite_next_is_ignored() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/auth/login?code=abc&next=https%3A%2F%2Fevil.example"))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let server = TestServer::new().await;
    let cookie = server.session_cookie("T", serde_json::json!({ "name": "Alice" }));

    let response = server
        .client
        .get(server.url("/auth/logout?next=%2Fbye"))
        .header("Cookie", cookie)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/bye");
    let cookies = set_cookies(&response);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("user=;") && c.contains("Max-Age=0")),
        "expected removal cookie, got: {cookies:?}"
    );
}

#[tokio::test]
async fn test_logout_is_idempotent_when_signed_out() {
    let server = TestServer::new().await;

    for _ in 0..2 {
        let response = server
            .client
            .get(server.url("/auth/logout"))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/");
        assert!(
            set_cookies(&response)
                .iter()
                .any(|c| c.starts_with("user=;"))
        );
    }
}
