//! Configuration commands.

use std::path::Path;

use calscan_providers::google::OAuthCredentials;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &AppConfig, path: Option<&Path>) -> AppResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
    let default_path = AppConfig::default_path();
    println!("# config.toml ({})", path.unwrap_or(&default_path).display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, including secrets and the OAuth client file.
pub fn validate(config: &AppConfig) -> AppResult<()> {
    config.validate()?;
    config.openai_config()?;
    println!("Inference API key resolved.");

    let google = config.google_config()?;
    if google.token_path.exists() {
        println!("Token file: {}", google.token_path.display());
    } else {
        OAuthCredentials::from_file(&google.client_secret_path)
            .and_then(|c| c.validate())
            .map_err(|e| AppError::Config(format!("no token stored and {}", e)))?;
        println!(
            "No token stored yet; `calscan auth` will use {}",
            google.client_secret_path.display()
        );
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: Option<&Path>) -> AppResult<()> {
    match path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: {}", AppConfig::default_path().display()),
    }
    println!("data: {}", AppConfig::default_data_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_google_paths(dir: &Path) -> AppConfig {
        let mut config = AppConfig::parse(
            r#"
[calendar]
target_calendar_id = "me@example.com"
monitored_calendar_id = "friend@example.com"

[inference]
api_key = "sk-test"
"#,
        )
        .unwrap();
        config.google.token_path = Some(dir.join("token.json"));
        config.google.client_secret_path = Some(dir.join("credentials.json"));
        config
    }

    #[test]
    fn validate_requires_client_secret_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_google_paths(dir.path());

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("no token stored"));
    }

    #[test]
    fn validate_accepts_client_secret_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("credentials.json"),
            r#"{"installed":{"client_id":"id.apps.googleusercontent.com","client_secret":"s"}}"#,
        )
        .unwrap();
        let config = config_with_google_paths(dir.path());

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn validate_accepts_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token.json"), "{}").unwrap();
        let config = config_with_google_paths(dir.path());

        assert!(validate(&config).is_ok());
    }

    #[test]
    fn dump_serializes_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_google_paths(dir.path());
        assert!(dump(&config, None).is_ok());
    }
}
