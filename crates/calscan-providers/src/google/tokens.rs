//! OAuth token persistence.
//!
//! The token file is a single JSON object. Files written by Google's Python
//! client (`token`, `expiry`) load as well as the ones written here
//! (`access_token`, `expires_at`).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;

/// Seconds shaved off every expiry so a token is refreshed before Google
/// starts rejecting it.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// A persisted OAuth grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    #[serde(alias = "token")]
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When the access token expires.
    #[serde(default, alias = "expiry")]
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Client the grant was issued to; needed to refresh it.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Secret of the client the grant was issued to.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// When the tokens were last refreshed.
    #[serde(default = "Utc::now")]
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a new token info from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            client_id: None,
            client_secret: None,
            last_refresh: Utc::now(),
        }
    }

    /// Records the client that issued the grant.
    pub fn with_client(mut self, credentials: &OAuthCredentials) -> Self {
        self.client_id = Some(credentials.client_id.clone());
        self.client_secret = Some(credentials.client_secret.clone());
        self
    }

    /// The issuing client, if both halves were persisted.
    pub fn client_credentials(&self) -> Option<OAuthCredentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(OAuthCredentials::new(id, secret)),
            _ => None,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the access token is expired at `now`.
    ///
    /// Tokens without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Returns true if the token has the required scopes.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Returns true if a refresh can be attempted.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Updates the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_BUFFER_SECS)
}

/// File-backed token storage.
///
/// Writes go through a temp file and a rename, and the result is made
/// readable by the owner only on Unix.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: Option<TokenInfo>,
}

impl TokenStorage {
    /// Creates a new token storage at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: None,
        }
    }

    /// Loads tokens from disk into memory.
    ///
    /// Returns Ok(true) if tokens were loaded, Ok(false) if no file exists.
    pub fn load(&mut self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no token file");
            self.tokens = None;
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e)).with_source(e)
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {}", e))
        })?;

        info!(path = %self.path.display(), "loaded tokens");
        self.tokens = Some(tokens);
        Ok(true)
    }

    /// Saves the current tokens to disk.
    pub fn save(&self) -> ProviderResult<()> {
        let tokens = self
            .tokens
            .as_ref()
            .ok_or_else(|| ProviderError::internal("no tokens to save"))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
                    .with_source(e)
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {}", e)))?;

        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
                .with_source(e)
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
                .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }

        debug!(path = %self.path.display(), "saved tokens");
        Ok(())
    }

    /// Returns the current tokens, if any.
    pub fn get(&self) -> Option<&TokenInfo> {
        self.tokens.as_ref()
    }

    /// Replaces the in-memory tokens and saves them to disk.
    ///
    /// The in-memory copy is updated even when the write fails.
    pub fn set(&mut self, tokens: TokenInfo) -> ProviderResult<()> {
        self.tokens = Some(tokens);
        self.save()
    }

    /// Clears the stored tokens (both in memory and on disk).
    pub fn clear(&mut self) -> ProviderResult<()> {
        self.tokens = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
                    .with_source(e)
            })?;
            info!(path = %self.path.display(), "cleared tokens");
        }
        Ok(())
    }

    /// Returns the token storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> TokenInfo {
        TokenInfo::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["scope1".to_string()],
        )
    }

    #[test]
    fn token_info_creation() {
        let token = sample_token();
        assert_eq!(token.access_token, "access-token");
        assert!(token.can_refresh());
        assert!(token.expires_at.is_some());
        assert!(!token.is_expired());
    }

    #[test]
    fn expiry_includes_buffer() {
        let token = TokenInfo::new("access", None, Some(30), vec![]);
        assert!(token.is_expired());
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = TokenInfo::new("access", None, None, vec![]);
        assert!(!token.is_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn token_info_scope_check() {
        let token = TokenInfo::new(
            "access",
            None,
            None,
            vec!["scope1".to_string(), "scope2".to_string()],
        );

        assert!(token.has_scopes(&["scope1".to_string()]));
        assert!(token.has_scopes(&["scope1".to_string(), "scope2".to_string()]));
        assert!(!token.has_scopes(&["scope3".to_string()]));
    }

    #[test]
    fn empty_refresh_token_cannot_refresh() {
        let token = TokenInfo::new("access", Some(String::new()), None, vec![]);
        assert!(!token.can_refresh());
    }

    #[test]
    fn client_credentials_roundtrip() {
        let creds = OAuthCredentials::new("id.apps.googleusercontent.com", "secret");
        let token = sample_token().with_client(&creds);
        assert_eq!(token.client_credentials(), Some(creds));
        assert_eq!(sample_token().client_credentials(), None);
    }

    #[test]
    fn loads_python_client_layout() {
        let json = r#"{
            "token": "ya29.a0",
            "refresh_token": "1//0g",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/calendar"],
            "universe_domain": "googleapis.com",
            "expiry": "2025-02-05T10:00:00.123456Z"
        }"#;

        let token: TokenInfo = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "ya29.a0");
        assert_eq!(token.refresh_token.as_deref(), Some("1//0g"));
        assert_eq!(
            token.client_id.as_deref(),
            Some("id.apps.googleusercontent.com")
        );
        assert!(token.is_expired());
        assert!(token.has_scopes(&["https://www.googleapis.com/auth/calendar".to_string()]));
    }

    #[test]
    fn token_storage_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        let mut storage = TokenStorage::new(&path);
        storage.set(sample_token()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let mut reloaded = TokenStorage::new(&path);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.get(), storage.get());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        TokenStorage::new(&path).set(sample_token()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn token_storage_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let mut storage = TokenStorage::new(&path);

        storage.set(TokenInfo::new("access", None, None, vec![])).unwrap();
        assert!(path.exists());

        storage.clear().unwrap();
        assert!(!path.exists());
        assert!(storage.get().is_none());
    }

    #[test]
    fn token_storage_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = TokenStorage::new(dir.path().join("token.json"));
        assert!(!storage.load().unwrap());
        assert!(storage.get().is_none());
    }

    #[test]
    fn token_storage_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{ not json").unwrap();

        let mut storage = TokenStorage::new(&path);
        let err = storage.load().unwrap_err();
        assert!(err.message().contains("parse"));
        assert!(storage.get().is_none());
    }
}
