//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// User session data
///
/// Stored in a signed cookie. Holds the App.net access token
/// and the profile returned by the token exchange, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// App.net OAuth2 access token
    pub access_token: String,
    /// User profile as returned by App.net
    pub profile: serde_json::Value,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        access_token: String,
        profile: serde_json::Value,
        max_age_seconds: i64,
    ) -> crate::error::Result<Self> {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(max_age_seconds)
            .and_then(|max_age| now.checked_add_signed(max_age))
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "session max age of {max_age_seconds}s is out of range"
                ))
            })?;

        Ok(Self {
            access_token,
            profile,
            created_at: now,
            expires_at,
        })
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Best-effort human readable name from the profile blob
    pub fn display_name(&self) -> Option<&str> {
        ["name", "username"]
            .iter()
            .find_map(|key| self.profile.get(*key).and_then(|v| v.as_str()))
            .filter(|name| !name.is_empty())
    }
}

/// Signs and verifies session cookie values
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub struct SessionCodec {
    secret: Vec<u8>,
    max_age_seconds: i64,
}

impl SessionCodec {
    pub fn new(secret: impl Into<Vec<u8>>, max_age_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            max_age_seconds,
        }
    }

    pub fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    fn mac(&self) -> crate::error::Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AppError::Encryption(e.to_string()))
    }

    /// Create a signed session token
    ///
    /// # Errors
    /// Returns error if the session cannot be serialized
    pub fn encode(&self, session: &Session) -> crate::error::Result<String> {
        let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        Ok(format!("{payload_b64}.{signature_b64}"))
    }

    /// Verify and decode a session token
    ///
    /// Anything that is not a well-formed, correctly signed and unexpired
    /// token yields `None`.
    pub fn decode(&self, token: &str) -> Option<Session> {
        match self.verify(token) {
            Ok(session) => Some(session),
            Err(reason) => {
                tracing::debug!(reason, "Rejected session cookie");
                None
            }
        }
    }

    fn verify(&self, token: &str) -> Result<Session, &'static str> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or("malformed")?;
        if signature_b64.contains('.') {
            return Err("malformed");
        }

        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| "bad signature encoding")?;

        let mut mac = self.mac().map_err(|_| "bad key")?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| "signature mismatch")?;

        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| "bad payload encoding")?;
        let session: Session =
            serde_json::from_slice(&payload).map_err(|_| "bad payload")?;

        if session.is_expired() {
            return Err("expired");
        }

        Ok(session)
    }

    /// Build the cookie carrying an encoded session
    pub fn session_cookie(&self, name: &str, value: String, secure: bool) -> Cookie<'static> {
        Cookie::build((name.to_string(), value))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(self.max_age_seconds))
            .build()
    }

    /// Build a removal cookie that expires the session immediately
    pub fn clear(name: &str) -> Cookie<'static> {
        let mut cookie = Cookie::build((name.to_string(), "")).path("/").build();
        cookie.make_removal();
        cookie
    }
}
