//! Authentication command.

use calscan_providers::google::{CredentialManager, GoogleAuthorizer, GoogleConfig, TokenStorage};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Builds the credential manager over the configured token file.
pub fn credential_manager(google: &GoogleConfig) -> AppResult<CredentialManager<GoogleAuthorizer>> {
    let authorizer = GoogleAuthorizer::new(google).map_err(AppError::config)?;
    Ok(CredentialManager::new(
        TokenStorage::new(google.token_path.clone()),
        authorizer,
        google.scopes.clone(),
    ))
}

/// Makes sure a usable Google token is stored.
///
/// With `force`, stored tokens are discarded and the browser flow always
/// runs.
pub async fn auth(config: &AppConfig, force: bool) -> AppResult<()> {
    let google = config.google_config()?;
    let mut manager = credential_manager(&google)?;

    if force {
        println!("Discarding stored tokens and starting Google authorization...");
    }
    let session = if force {
        manager.reauthorize().await
    } else {
        manager.obtain_session().await
    }
    .map_err(AppError::Auth)?;

    println!("Authenticated with Google.");
    println!("Token file: {}", manager.storage().path().display());
    if let Some(expires_at) = session.expires_at() {
        println!("Access token valid until {}", expires_at.to_rfc3339());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_uses_configured_token_path() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("credentials.json");
        std::fs::write(
            &secret,
            r#"{"installed":{"client_id":"id.apps.googleusercontent.com","client_secret":"s"}}"#,
        )
        .unwrap();

        let google = GoogleConfig::new()
            .with_token_path(dir.path().join("token.json"))
            .with_client_secret_path(&secret);
        let manager = credential_manager(&google).unwrap();

        assert_eq!(manager.storage().path(), dir.path().join("token.json"));
        assert!(manager.storage().get().is_none());
    }
}
