//! Credential manager: turns whatever is on disk into a usable session.
//!
//! Order of attempts:
//!
//! 1. stored token, if unexpired and covering the required scopes
//! 2. refresh grant, if the stored token carries a refresh token
//! 3. interactive consent flow
//!
//! Every newly obtained token is persisted; a failed write is logged and
//! the session is still returned.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

use super::tokens::{TokenInfo, TokenStorage};

/// Result of a refresh grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    /// The new access token.
    pub access_token: String,
    /// Lifetime in seconds, if reported.
    pub expires_in: Option<i64>,
}

/// OAuth operations the credential manager depends on.
pub trait Authorizer: Send + Sync {
    /// Runs the refresh grant for `token`.
    fn refresh<'a>(&'a self, token: &'a TokenInfo) -> BoxFuture<'a, ProviderResult<RefreshedToken>>;

    /// Runs the interactive consent flow for `scopes`.
    fn authorize<'a>(&'a self, scopes: &'a [String]) -> BoxFuture<'a, ProviderResult<TokenInfo>>;
}

/// An access token known to be unexpired when it was handed out.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Builds a session from `token` if it is still valid at `now`.
    pub fn from_token(token: &TokenInfo, now: DateTime<Utc>) -> Option<Self> {
        if token.access_token.is_empty() || token.is_expired_at(now) {
            return None;
        }
        Some(Self {
            access_token: token.access_token.clone(),
            expires_at: token.expires_at,
        })
    }

    /// The bearer token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// When the token stops being accepted, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Loads, refreshes and persists OAuth tokens.
#[derive(Debug)]
pub struct CredentialManager<A> {
    storage: TokenStorage,
    authorizer: A,
    scopes: Vec<String>,
}

impl<A: Authorizer> CredentialManager<A> {
    /// Creates a manager over `storage` requiring `scopes`.
    pub fn new(storage: TokenStorage, authorizer: A, scopes: Vec<String>) -> Self {
        Self {
            storage,
            authorizer,
            scopes,
        }
    }

    /// Returns a valid session, authorizing interactively as a last resort.
    ///
    /// # Errors
    ///
    /// Returns the interactive flow's error when every other option is
    /// exhausted.
    pub async fn obtain_session(&mut self) -> ProviderResult<Session> {
        if let Err(e) = self.storage.load() {
            warn!(
                path = %self.storage.path().display(),
                "ignoring unreadable token file: {}", e
            );
        }

        if let Some(mut token) = self.storage.get().cloned() {
            if !token.has_scopes(&self.scopes) {
                info!("stored token does not cover the required scopes");
            } else if let Some(session) = Session::from_token(&token, Utc::now()) {
                debug!("using stored access token");
                return Ok(session);
            } else if token.can_refresh() {
                debug!("access token expired, refreshing");
                match self.authorizer.refresh(&token).await {
                    Ok(refreshed) => {
                        token.update_access_token(refreshed.access_token, refreshed.expires_in);
                        if let Some(session) = self.persist(token) {
                            return Ok(session);
                        }
                        warn!("refreshed token is already expired");
                    }
                    Err(e) => warn!("token refresh failed: {}", e),
                }
            } else {
                info!("access token expired and no refresh token is stored");
            }
        }

        self.interactive().await
    }

    /// Discards stored tokens and runs the interactive flow.
    pub async fn reauthorize(&mut self) -> ProviderResult<Session> {
        if let Err(e) = self.storage.clear() {
            warn!("failed to remove stored tokens: {}", e);
        }
        self.interactive().await
    }

    /// Returns the token storage.
    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }

    async fn interactive(&mut self) -> ProviderResult<Session> {
        info!("starting interactive authorization");
        let token = self.authorizer.authorize(&self.scopes).await?;
        self.persist(token).ok_or_else(|| {
            ProviderError::authentication("authorization returned an expired token")
                .with_provider("google")
        })
    }

    fn persist(&mut self, token: TokenInfo) -> Option<Session> {
        let session = Session::from_token(&token, Utc::now());
        if let Err(e) = self.storage.set(token) {
            warn!(
                path = %self.storage.path().display(),
                "failed to persist tokens: {}", e
            );
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

    #[derive(Default)]
    struct FakeAuthorizer {
        refresh_ok: bool,
        authorize_ok: bool,
        refresh_calls: AtomicUsize,
        authorize_calls: AtomicUsize,
    }

    impl FakeAuthorizer {
        fn new(refresh_ok: bool, authorize_ok: bool) -> Self {
            Self {
                refresh_ok,
                authorize_ok,
                ..Self::default()
            }
        }

        fn refreshes(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        fn authorizations(&self) -> usize {
            self.authorize_calls.load(Ordering::SeqCst)
        }
    }

    impl Authorizer for FakeAuthorizer {
        fn refresh<'a>(
            &'a self,
            _token: &'a TokenInfo,
        ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let ok = self.refresh_ok;
            Box::pin(async move {
                if ok {
                    Ok(RefreshedToken {
                        access_token: "refreshed".to_string(),
                        expires_in: Some(3600),
                    })
                } else {
                    Err(ProviderError::authentication("invalid_grant"))
                }
            })
        }

        fn authorize<'a>(
            &'a self,
            scopes: &'a [String],
        ) -> BoxFuture<'a, ProviderResult<TokenInfo>> {
            self.authorize_calls.fetch_add(1, Ordering::SeqCst);
            let ok = self.authorize_ok;
            Box::pin(async move {
                if ok {
                    Ok(TokenInfo::new(
                        "interactive",
                        Some("refresh".to_string()),
                        Some(3600),
                        scopes.to_vec(),
                    ))
                } else {
                    Err(ProviderError::authentication("authorization denied: access_denied"))
                }
            })
        }
    }

    fn scopes() -> Vec<String> {
        vec![SCOPE.to_string()]
    }

    fn write_token(path: &Path, token: TokenInfo) {
        TokenStorage::new(path).set(token).unwrap();
    }

    fn expired_token(refresh_token: Option<&str>) -> TokenInfo {
        let mut token = TokenInfo::new("stale", refresh_token.map(str::to_string), None, scopes());
        token.expires_at = Some(Utc::now() - Duration::hours(1));
        token
    }

    fn manager(path: &Path, authorizer: FakeAuthorizer) -> CredentialManager<FakeAuthorizer> {
        CredentialManager::new(TokenStorage::new(path), authorizer, scopes())
    }

    #[test]
    fn session_requires_unexpired_token() {
        let now = Utc::now();
        assert!(Session::from_token(&expired_token(None), now).is_none());
        assert!(Session::from_token(&TokenInfo::new("", None, None, vec![]), now).is_none());

        let session =
            Session::from_token(&TokenInfo::new("abc", None, Some(3600), vec![]), now).unwrap();
        assert_eq!(session.access_token(), "abc");
        assert!(session.expires_at().is_some());
        assert!(!format!("{:?}", session).contains("abc"));
    }

    #[tokio::test]
    async fn absent_token_runs_interactive_flow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let mut manager = manager(&path, FakeAuthorizer::new(true, true));

        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
        assert_eq!(manager.authorizer.authorizations(), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn absent_token_and_denied_consent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(&dir.path().join("token.json"), FakeAuthorizer::new(true, false));

        let err = manager.obtain_session().await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn valid_token_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, TokenInfo::new("stored", None, Some(3600), scopes()));

        let mut manager = manager(&path, FakeAuthorizer::new(false, false));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "stored");
        assert_eq!(manager.authorizer.refreshes(), 0);
        assert_eq!(manager.authorizer.authorizations(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, expired_token(Some("refresh-me")));

        let mut manager = manager(&path, FakeAuthorizer::new(true, false));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "refreshed");
        assert_eq!(manager.authorizer.authorizations(), 0);

        let mut reloaded = TokenStorage::new(&path);
        reloaded.load().unwrap();
        let token = reloaded.get().unwrap();
        assert_eq!(token.access_token, "refreshed");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-me"));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_goes_interactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, expired_token(None));

        let mut manager = manager(&path, FakeAuthorizer::new(true, true));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
        assert_eq!(manager.authorizer.refreshes(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_interactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, expired_token(Some("revoked")));

        let mut manager = manager(&path, FakeAuthorizer::new(false, true));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
        assert_eq!(manager.authorizer.refreshes(), 1);
        assert_eq!(manager.authorizer.authorizations(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_and_denied_consent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, expired_token(Some("revoked")));

        let mut manager = manager(&path, FakeAuthorizer::new(false, false));
        assert!(manager.obtain_session().await.is_err());
    }

    #[tokio::test]
    async fn missing_scope_goes_interactive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(
            &path,
            TokenInfo::new(
                "readonly",
                Some("refresh".to_string()),
                Some(3600),
                vec!["https://www.googleapis.com/auth/calendar.readonly".to_string()],
            ),
        );

        let mut manager = manager(&path, FakeAuthorizer::new(true, true));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
        assert_eq!(manager.authorizer.refreshes(), 0);
    }

    #[tokio::test]
    async fn corrupt_token_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut manager = manager(&path, FakeAuthorizer::new(true, true));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
    }

    #[tokio::test]
    async fn persisted_token_round_trips_without_interaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let mut first = manager(&path, FakeAuthorizer::new(false, true));
        let issued = first.obtain_session().await.unwrap();

        let mut second = manager(&path, FakeAuthorizer::new(false, false));
        let reloaded = second.obtain_session().await.unwrap();
        assert_eq!(reloaded, issued);
        assert_eq!(second.authorizer.authorizations(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let mut manager = manager(&blocker.join("token.json"), FakeAuthorizer::new(true, true));
        let session = manager.obtain_session().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
    }

    #[tokio::test]
    async fn reauthorize_discards_valid_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, TokenInfo::new("stored", None, Some(3600), scopes()));

        let mut manager = manager(&path, FakeAuthorizer::new(true, true));
        let session = manager.reauthorize().await.unwrap();
        assert_eq!(session.access_token(), "interactive");
        assert_eq!(manager.storage().get().unwrap().access_token, "interactive");
    }
}
