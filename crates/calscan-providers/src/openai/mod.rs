//! OpenAI Responses API backend for [`TextGenerator`](crate::TextGenerator).

mod client;
mod config;

pub use client::ResponsesClient;
pub use config::OpenAiConfig;
