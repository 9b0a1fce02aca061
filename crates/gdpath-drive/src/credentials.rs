//! Stored OAuth credentials
//!
//! The credential file is written once by the (external) setup flow and read
//! by every gdpath invocation. It uses the JSON layout of the classic Google
//! client libraries:
//!
//! ```json
//! {
//!   "access_token": "...",
//!   "refresh_token": "...",
//!   "client_id": "...",
//!   "client_secret": "...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "token_expiry": "2026-01-15T10:00:00Z",
//!   "invalid": false
//! }
//! ```
//!
//! Unknown fields are ignored and dropped on save.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use gdpath_core::config::Config;
use oauth2::{
    basic::BasicClient, ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// File name searched for when no explicit path is configured
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Tokens are treated as expired this long before their actual expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    TOKEN_URL.to_string()
}

/// OAuth credentials authorizing both service handles
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for API requests
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// When the access token expires; `None` means unknown
    #[serde(default)]
    pub token_expiry: Option<DateTime<Utc>>,
    /// Set by the setup flow when the grant was revoked
    #[serde(default)]
    pub invalid: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .field("token_expiry", &self.token_expiry)
            .field("invalid", &self.invalid)
            .finish()
    }
}

impl Credentials {
    /// Credentials holding only an access token (no refresh possible)
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            client_id: None,
            client_secret: None,
            token_uri: default_token_uri(),
            token_expiry: None,
            invalid: false,
        }
    }

    /// Locates the credential file
    ///
    /// An explicit path wins; otherwise `credentials.json` is searched in the
    /// working directory, then in the gdpath config directory.
    pub fn find(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        [
            PathBuf::from(CREDENTIALS_FILE),
            Config::config_dir().join(CREDENTIALS_FILE),
        ]
        .into_iter()
        .find(|candidate| candidate.exists())
    }

    /// Reads credentials from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
        let credentials: Credentials = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials in {}", path.display()))?;
        debug!(path = %path.display(), "Loaded credentials");
        Ok(credentials)
    }

    /// Writes credentials back to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize credentials")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write credentials to {}", path.display()))?;
        debug!(path = %path.display(), "Saved credentials");
        Ok(())
    }

    /// Returns true if the access token has expired (or is about to)
    pub fn is_expired(&self) -> bool {
        self.token_expiry
            .map(|expiry| Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiry)
            .unwrap_or(false)
    }

    /// Validity flag: usable to authorize calls right now
    pub fn is_valid(&self) -> bool {
        !self.invalid && !self.access_token.is_empty() && !self.is_expired()
    }

    /// Whether a refresh grant can be attempted
    pub fn can_refresh(&self) -> bool {
        !self.invalid && self.refresh_token.is_some() && self.client_id.is_some()
    }

    /// Exchanges the refresh token for a fresh access token
    pub async fn refreshed(&self) -> Result<Self> {
        let refresh_token = self
            .refresh_token
            .clone()
            .context("Credentials carry no refresh token")?;
        let client_id = self
            .client_id
            .clone()
            .context("Credentials carry no client_id")?;

        let mut client = BasicClient::new(ClientId::new(client_id))
            .set_token_uri(TokenUrl::new(self.token_uri.clone()).context("Invalid token URL")?);
        if let Some(secret) = &self.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        info!("Refreshing access token");

        let http_client = reqwest::Client::new();
        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        let token_expiry = token_result
            .expires_in()
            .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));

        Ok(Self {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or(Some(refresh_token)),
            token_expiry: Some(token_expiry),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_json(json: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(json.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_load_full_file() {
        let tmp = write_json(
            r#"{
                "access_token": "ya29.token",
                "refresh_token": "1//refresh",
                "client_id": "client.apps.googleusercontent.com",
                "client_secret": "secret",
                "token_uri": "https://oauth2.googleapis.com/token",
                "token_expiry": "2099-01-01T00:00:00Z",
                "invalid": false,
                "user_agent": null
            }"#,
        );

        let creds = Credentials::load(tmp.path()).unwrap();
        assert_eq!(creds.access_token, "ya29.token");
        assert!(creds.is_valid());
        assert!(creds.can_refresh());
    }

    #[test]
    fn test_minimal_file_defaults() {
        let tmp = write_json(r#"{"access_token": "abc"}"#);
        let creds = Credentials::load(tmp.path()).unwrap();
        assert_eq!(creds.token_uri, TOKEN_URL);
        assert!(creds.is_valid());
        assert!(!creds.can_refresh());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let mut creds = Credentials::from_access_token("abc");
        creds.token_expiry = Some(Utc::now() - Duration::minutes(5));
        assert!(creds.is_expired());
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_invalid_flag() {
        let mut creds = Credentials::from_access_token("abc");
        creds.invalid = true;
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let tmp = write_json("not json");
        assert!(Credentials::load(tmp.path()).is_err());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CREDENTIALS_FILE);
        let mut creds = Credentials::from_access_token("abc");
        creds.refresh_token = Some("r".into());
        creds.save(&path).unwrap();

        assert_eq!(Credentials::load(&path).unwrap(), creds);
    }

    #[test]
    fn test_find_prefers_explicit_path() {
        let explicit = PathBuf::from("/somewhere/creds.json");
        assert_eq!(Credentials::find(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::from_access_token("super-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_refresh_against_token_endpoint() {
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let creds = Credentials {
            access_token: "stale".into(),
            refresh_token: Some("1//refresh".into()),
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            token_uri: format!("{}/token", server.uri()),
            token_expiry: Some(Utc::now() - Duration::hours(1)),
            invalid: false,
        };
        assert!(!creds.is_valid());

        let fresh = creds.refreshed().await.expect("refresh");
        assert_eq!(fresh.access_token, "fresh-token");
        assert_eq!(fresh.refresh_token.as_deref(), Some("1//refresh"));
        assert!(fresh.is_valid());
    }
}
