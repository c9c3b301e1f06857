//! External collaborators: calendar backend and text generation.
//!
//! - [`CalendarBackend`] - list events in a window, insert one event
//! - [`TextGenerator`] - one instruction-following completion
//! - [`google`] - Google Calendar v3 with OAuth PKCE and token persistence
//! - [`openai`] - OpenAI Responses API
//! - [`ProviderError`] - Error type shared by all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐     ┌────────────────────┐
//! │ CredentialManager  │     │   OpenAI API       │
//! └─────────┬──────────┘     └─────────┬──────────┘
//!           │ Session                  │
//!           ▼                          ▼
//! ┌────────────────────┐     ┌────────────────────┐
//! │GoogleCalendarClient│     │  ResponsesClient   │
//! └─────────┬──────────┘     └─────────┬──────────┘
//!           │ CalendarBackend          │ TextGenerator
//!           └────────────┬─────────────┘
//!                        ▼
//!                   orchestrator
//! ```

pub mod backend;
pub mod error;
pub mod generator;
pub mod google;
pub mod openai;

pub use backend::{BoxFuture, CalendarBackend, ErrorBackend, InsertedEvent};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use generator::{GenerationRequest, TextGenerator};
