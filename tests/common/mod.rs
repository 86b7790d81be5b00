//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use adnstream::{
    AppState, config,
    error::AppError,
    provider::{
        AuthorizationParams, OAuthProvider, Post, StreamError, StreamFetcher, TokenExchangeParams,
        TokenGrant,
    },
};
use axum::async_trait;
use tokio::net::TcpListener;
use url::Url;

pub const COOKIE_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// Test configuration pointing at the real App.net URLs
pub fn test_config() -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "localhost".to_string(),
            protocol: "http".to_string(),
        },
        auth: config::AuthConfig {
            cookie_secret: COOKIE_SECRET.to_string(),
            cookie_name: "user".to_string(),
            session_max_age: 3600,
        },
        provider: config::ProviderConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            authorize_url: config::DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: config::DEFAULT_TOKEN_URL.to_string(),
            api_base_url: config::DEFAULT_API_BASE_URL.to_string(),
            scope: config::DEFAULT_SCOPE.to_string(),
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
        config_path: None,
    }
}

/// OAuth provider double that records exchanges
pub struct StubOAuth {
    /// Profile handed back by the exchange; `None` simulates "no user"
    pub profile: Option<serde_json::Value>,
    pub exchanges: Mutex<Vec<TokenExchangeParams>>,
}

impl StubOAuth {
    pub fn returning(profile: Option<serde_json::Value>) -> Self {
        Self {
            profile,
            exchanges: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OAuthProvider for StubOAuth {
    fn authorization_redirect(&self, params: &AuthorizationParams) -> Result<Url, AppError> {
        let mut url = Url::parse(config::DEFAULT_AUTHORIZE_URL).unwrap();
        url.query_pairs_mut()
            .append_pair("client_id", &params.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &params.redirect_uri)
            .append_pair("scope", &params.scope);
        Ok(url)
    }

    async fn exchange_code(&self, params: &TokenExchangeParams) -> Result<TokenGrant, AppError> {
        self.exchanges.lock().unwrap().push(params.clone());
        let profile = self.profile.clone().ok_or(AppError::AuthFailed)?;
        let access_token = profile
            .get("access_token")
            .and_then(|v| v.as_str())
            .unwrap_or("T")
            .to_string();
        Ok(TokenGrant {
            access_token,
            profile,
        })
    }
}

/// What the stream double answers with
#[derive(Clone)]
pub enum StreamReply {
    Posts(Vec<Post>),
    Unauthorized,
    Upstream,
}

/// Stream fetcher double that counts calls
pub struct StubStream {
    pub reply: StreamReply,
    pub calls: AtomicUsize,
    pub tokens: Mutex<Vec<String>>,
}

impl StubStream {
    pub fn new(reply: StreamReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamFetcher for StubStream {
    async fn global_stream(&self, access_token: &str) -> Result<Vec<Post>, StreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(access_token.to_string());
        match &self.reply {
            StreamReply::Posts(posts) => Ok(posts.clone()),
            StreamReply::Unauthorized => Err(StreamError::Unauthorized),
            StreamReply::Upstream => Err(StreamError::Upstream("status 503".to_string())),
        }
    }
}

pub fn sample_posts() -> Vec<Post> {
    serde_json::from_value(serde_json::json!([
        {
            "id": "1001",
            "text": "hello from the global stream",
            "user": { "username": "bob", "name": "Bob" },
            "num_replies": 3
        },
        {
            "id": "1002",
            "text": "second post",
            "html": "<span itemscope=\"https://app.net/schemas/Post\">second post</span>"
        }
    ]))
    .unwrap()
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub host: String,
    pub state: AppState,
    pub oauth: Arc<StubOAuth>,
    pub stream: Arc<StubStream>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Server whose exchange yields Alice and whose stream has two posts
    pub async fn new() -> Self {
        Self::with(
            StubOAuth::returning(Some(
                serde_json::json!({ "access_token": "T", "name": "Alice", "username": "alice" }),
            )),
            StubStream::new(StreamReply::Posts(sample_posts())),
        )
        .await
    }

    pub async fn with(oauth: StubOAuth, stream: StubStream) -> Self {
        let oauth = Arc::new(oauth);
        let stream = Arc::new(stream);
        let state = AppState::with_provider(test_config(), oauth.clone(), stream.clone());

        // Redirects are asserted on, never followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = adnstream::build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{addr}"),
            host: addr.to_string(),
            state,
            oauth,
            stream,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Mint a valid session cookie header value
    pub fn session_cookie(&self, access_token: &str, profile: serde_json::Value) -> String {
        let session = adnstream::auth::Session::new(access_token.to_string(), profile, 3600).unwrap();
        let token = self.state.sessions.encode(&session).unwrap();
        format!("user={token}")
    }
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// Value of the `user` cookie in a Set-Cookie header list
pub fn session_cookie_value(set_cookies: &[String]) -> Option<String> {
    set_cookies.iter().find_map(|header| {
        let pair = header.split(';').next()?;
        let value = pair.strip_prefix("user=")?;
        (!value.is_empty()).then(|| value.to_string())
    })
}
