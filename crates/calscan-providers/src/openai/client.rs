//! Responses API client.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::backend::BoxFuture;
use crate::error::{ProviderError, ProviderResult};
use crate::generator::{GenerationRequest, TextGenerator};

use super::config::OpenAiConfig;

const PROVIDER_NAME: &str = "openai";

/// Calls `POST {base_url}/responses`.
#[derive(Debug)]
pub struct ResponsesClient {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ResponsesClient {
    /// Creates a client from validated settings.
    pub fn new(config: &OpenAiConfig) -> ProviderResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            endpoint: config.responses_url()?,
            api_key: config.api_key.clone(),
        })
    }

    /// Sends one request and returns the generated text.
    pub async fn create_response(&self, request: &GenerationRequest) -> ProviderResult<String> {
        debug!(
            model = %request.model,
            endpoint = %self.endpoint,
            "sending generation request"
        );

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e).with_provider(PROVIDER_NAME))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e))
                .with_provider(PROVIDER_NAME)
        })?;

        if !status.is_success() {
            return Err(
                ProviderError::from_status(status.as_u16(), &error_message(&body))
                    .with_provider(PROVIDER_NAME),
            );
        }

        extract_text(&body)
    }
}

impl TextGenerator for ResponsesClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(self.create_response(request))
    }
}

/// Response body; only the fields carrying text are read.
#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Top-level `output_text` if present, else every `output_text` part
/// concatenated in order.
fn extract_text(body: &str) -> ProviderResult<String> {
    let parsed: ResponsesBody = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
            .with_provider(PROVIDER_NAME)
    })?;

    if let Some(text) = parsed.output_text {
        return Ok(text);
    }

    let parts: Vec<&str> = parsed
        .output
        .iter()
        .flat_map(|item| &item.content)
        .filter(|part| part.kind == "output_text")
        .map(|part| part.text.as_str())
        .collect();

    if parts.is_empty() {
        return Err(ProviderError::inference("response contained no output text")
            .with_provider(PROVIDER_NAME));
    }
    Ok(parts.concat())
}

/// The API's `error.message` when the body has one, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}
