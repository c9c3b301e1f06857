//! CLI, configuration and the daily scan pipeline
//!
//! This crate provides the `calscan` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod secret;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use pipeline::{Orchestrator, PipelineSettings, RunOutcome};
