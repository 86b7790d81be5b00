//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml)
//! 3. Explicit configuration file (`--config`)
//! 4. Environment variables (override)

use serde::Deserialize;
use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
    /// Configuration file this instance was loaded from, if any
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (default: 8888)
    pub port: u16,
    /// Public host, used when a request carries no Host header
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://stream.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Cookie signing secret (32+ bytes)
    pub cookie_secret: String,
    /// Session cookie name (default: "user")
    pub cookie_name: String,
    /// Session max age in seconds (default: 2678400 = 31 days)
    pub session_max_age: i64,
}

/// OAuth2 provider configuration (App.net)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    /// REST API root, e.g. "https://alpha-api.app.net"
    pub api_base_url: String,
    /// Comma-separated scopes requested at login
    pub scope: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_AUTHORIZE_URL: &str = "https://account.app.net/oauth/authenticate";
pub const DEFAULT_TOKEN_URL: &str = "https://account.app.net/oauth/access_token";
pub const DEFAULT_API_BASE_URL: &str = "https://alpha-api.app.net";
pub const DEFAULT_SCOPE: &str = "basic,stream";
/// Upper bound for `auth.session_max_age` (about 68 years)
pub const MAX_SESSION_MAX_AGE: i64 = i32::MAX as i64;

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. `config_path` (required when given)
    /// 4. Environment variables (ADNSTREAM__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load(config_path: Option<&Path>) -> crate::error::Result<Self> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.domain", format!("localhost:{DEFAULT_PORT}"))?
            .set_default("server.protocol", "http")?
            .set_default("auth.cookie_name", "user")?
            .set_default("auth.session_max_age", 2_678_400)?
            .set_default("provider.authorize_url", DEFAULT_AUTHORIZE_URL)?
            .set_default("provider.token_url", DEFAULT_TOKEN_URL)?
            .set_default("provider.api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("provider.scope", DEFAULT_SCOPE)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = config_path {
            builder = builder
                .add_source(File::from(path).required(true))
                .set_override("config_path", path.to_string_lossy().into_owned())?;
        }

        let config = builder
            .add_source(
                Environment::with_prefix("ADNSTREAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub(crate) fn validate(&self) -> crate::error::Result<()> {
        const MIN_COOKIE_SECRET_BYTES: usize = 32;

        if self.auth.cookie_secret.len() < MIN_COOKIE_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.cookie_secret must be at least {MIN_COOKIE_SECRET_BYTES} bytes"
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_max_age > MAX_SESSION_MAX_AGE {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_max_age must be at most {MAX_SESSION_MAX_AGE} seconds"
            )));
        }

        if self.auth.cookie_name.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "auth.cookie_name must not be empty".to_string(),
            ));
        }

        if self.provider.client_id.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "provider.client_id must not be empty".to_string(),
            ));
        }

        if self.provider.client_secret.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "provider.client_secret must not be empty".to_string(),
            ));
        }

        for (key, value) in [
            ("provider.authorize_url", &self.provider.authorize_url),
            ("provider.token_url", &self.provider.token_url),
            ("provider.api_base_url", &self.provider.api_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| crate::error::AppError::Config(format!("{key}: {e}")))?;
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    // Url::host_str keeps the brackets on IPv6 literals.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}

/// Minimal valid configuration for unit tests
#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            domain: "localhost:8888".to_string(),
            protocol: "http".to_string(),
        },
        auth: AuthConfig {
            cookie_secret: "x".repeat(32),
            cookie_name: "user".to_string(),
            session_max_age: 2_678_400,
        },
        provider: ProviderConfig {
            client_id: "adn-client-id".to_string(),
            client_secret: "adn-client-secret".to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
        config_path: None,
    }
}
