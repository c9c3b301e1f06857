//! Application configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/calscan/config.toml`. Paths may start with `~/`. The inference
//! API key supports secret references (`pass::…`, `env::…`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use calscan_providers::google::GoogleConfig;
use calscan_providers::openai::OpenAiConfig;

use crate::error::{AppError, AppResult};
use crate::pipeline::PipelineSettings;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Which calendars to read and write.
    pub calendar: CalendarSettings,
    /// Google OAuth and API settings.
    pub google: GoogleSettings,
    /// Language-model settings.
    pub inference: InferenceSettings,
    /// Log file settings.
    pub logging: LoggingSettings,
}

/// Calendar selection and reminder text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar that receives the reminder.
    pub target_calendar_id: String,
    /// Calendar whose events are scanned.
    pub monitored_calendar_id: String,
    /// Text placed before the event list in the reminder description.
    pub reminder_prefix: String,
    /// Skip the write when a reminder already occupies today's slot.
    pub skip_duplicates: bool,
}

/// Google OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Token file; defaults to `~/.local/share/calscan/token.json`.
    pub token_path: Option<PathBuf>,
    /// OAuth client JSON; defaults to `~/.config/calscan/credentials.json`.
    pub client_secret_path: Option<PathBuf>,
    /// Ports tried for the OAuth redirect; `[0, 0]` lets the OS choose.
    pub loopback_port_range: (u16, u16),
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            token_path: None,
            client_secret_path: None,
            loopback_port_range: (0, 0),
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// API key or secret reference.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// API root.
    pub base_url: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_key: "env::OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: OpenAiConfig::DEFAULT_BASE_URL.to_string(),
            timeout_secs: OpenAiConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file; defaults to `~/.local/share/calscan/reminder.log`.
    pub file: Option<PathBuf>,
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the file at `path`, or the default location when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses TOML text.
    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calscan")
    }

    /// Returns the default data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calscan")
    }

    /// Checks everything that can be checked without network or secrets.
    pub fn validate(&self) -> AppResult<()> {
        if self.calendar.target_calendar_id.trim().is_empty() {
            return Err(AppError::Config(
                "calendar.target_calendar_id must not be empty".to_string(),
            ));
        }
        if self.calendar.monitored_calendar_id.trim().is_empty() {
            return Err(AppError::Config(
                "calendar.monitored_calendar_id must not be empty".to_string(),
            ));
        }
        if self.inference.model.trim().is_empty() {
            return Err(AppError::Config("inference.model must not be empty".to_string()));
        }
        if self.inference.timeout_secs == 0 {
            return Err(AppError::Config("inference.timeout_secs must be positive".to_string()));
        }

        self.google_config()?;
        self.openai_config_with_key(String::new())?;
        self.log_level()?;
        Ok(())
    }

    /// Google settings with defaults filled in and `~/` expanded.
    pub fn google_config(&self) -> AppResult<GoogleConfig> {
        let mut config = GoogleConfig::new()
            .with_timeout(Duration::from_secs(self.google.timeout_secs))
            .with_loopback_port_range(
                self.google.loopback_port_range.0,
                self.google.loopback_port_range.1,
            );

        if let Some(ref path) = self.google.token_path {
            config = config.with_token_path(expand_home(path));
        }
        if let Some(ref path) = self.google.client_secret_path {
            config = config.with_client_secret_path(expand_home(path));
        }

        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    /// Inference settings with the API key resolved.
    pub fn openai_config(&self) -> AppResult<OpenAiConfig> {
        let api_key = crate::secret::resolve(&self.inference.api_key)
            .map_err(|e| AppError::Config(format!("failed to resolve inference.api_key: {}", e)))?;
        let config = self.openai_config_with_key(api_key)?;
        config.validate().map_err(AppError::config)?;
        Ok(config)
    }

    fn openai_config_with_key(&self, api_key: String) -> AppResult<OpenAiConfig> {
        Ok(OpenAiConfig::new(api_key)
            .and_then(|c| c.with_base_url(&self.inference.base_url))
            .map_err(AppError::config)?
            .with_timeout(Duration::from_secs(self.inference.timeout_secs)))
    }

    /// Settings handed to the orchestrator.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            monitored_calendar_id: self.calendar.monitored_calendar_id.clone(),
            target_calendar_id: self.calendar.target_calendar_id.clone(),
            reminder_prefix: self.calendar.reminder_prefix.clone(),
            model: self.inference.model.clone(),
            skip_duplicates: self.calendar.skip_duplicates,
        }
    }

    /// The log file, defaulting to `reminder.log` in the data directory.
    pub fn log_file(&self) -> PathBuf {
        match self.logging.file {
            Some(ref path) => expand_home(path),
            None => Self::default_data_dir().join("reminder.log"),
        }
    }

    /// The configured log level.
    pub fn log_level(&self) -> AppResult<Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| {
                AppError::Config(format!("invalid logging.level: {:?}", self.logging.level))
            })
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
