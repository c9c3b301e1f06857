//! Text-generation abstraction used by the significance filter.

use serde::Serialize;

use calscan_core::significance::{SIGNIFICANCE_PROMPT, TEMPERATURE, TOP_P};

use crate::backend::BoxFuture;
use crate::error::ProviderResult;

/// One instruction-following completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Model identifier, e.g. `gpt-4o-mini`.
    pub model: String,
    /// System-level instructions.
    pub instructions: String,
    /// User input text.
    pub input: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
}

impl GenerationRequest {
    /// Builds the significance-filter request for a joined title list.
    pub fn significance(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: SIGNIFICANCE_PROMPT.to_string(),
            input: input.into(),
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

/// A backend that turns a [`GenerationRequest`] into text.
pub trait TextGenerator: Send + Sync {
    /// Returns the name of this generator (e.g., "openai").
    fn name(&self) -> &str;

    /// Runs a single completion and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network, authentication or quota failures,
    /// or when the response carries no text.
    fn generate<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ProviderResult<String>>;
}
