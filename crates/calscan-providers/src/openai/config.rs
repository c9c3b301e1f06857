//! OpenAI connection settings.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Settings for the Responses API client.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Bearer API key.
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for API requests.
    pub user_agent: String,
}

impl OpenAiConfig {
    /// Default API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Creates a configuration for the public API.
    pub fn new(api_key: impl Into<String>) -> ProviderResult<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: parse_base_url(Self::DEFAULT_BASE_URL)?,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calscan/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: &str) -> ProviderResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The `responses` endpoint under [`base_url`](Self::base_url).
    pub fn responses_url(&self) -> ProviderResult<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("responses").map_err(|e| {
            ProviderError::configuration(format!("invalid responses URL: {}", e))
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::configuration("OpenAI API key is empty"));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::configuration("timeout must be positive"));
        }
        Ok(())
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn parse_base_url(raw: &str) -> ProviderResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ProviderError::configuration(format!("invalid base URL {:?}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ProviderError::configuration(format!(
            "base URL {:?} cannot have paths",
            raw
        )));
    }
    Ok(url)
}
