//! Tracing setup for calscan
//!
//! Each run appends one line per record (timestamp, level, message) to a log
//! file, optionally mirrored to stderr.
//!
//! # Usage
//!
//! ```ignore
//! use calscan_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default().with_log_file("reminder.log"))?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, MakeWriter},
    prelude::*,
    registry::LookupSpan,
};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// The log file could not be created or opened for appending
    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        /// Path that was being opened
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// JSON lines
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The default log level when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Append-only log file; stderr is used when unset
    pub log_file: Option<PathBuf>,
    /// Also write to stderr when a log file is set
    pub mirror_stderr: bool,
    /// Custom env filter directive (overrides default_level if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            log_file: None,
            mirror_stderr: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for `--debug` runs: debug level, source locations, stderr copy.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_location: true,
            include_target: true,
            mirror_stderr: true,
            ..Self::default()
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the log file
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn build_env_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref filter) = self.env_filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("calscan={}", self.default_level))))
    }
}

/// Initialize tracing with the given configuration.
///
/// This should be called once at the start of the application.
/// The `RUST_LOG` environment variable can be used to override the default level.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set, if the
/// env filter directive is invalid, or if the log file cannot be opened.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = build_subscriber(&config)?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds the subscriber without installing it.
///
/// Useful for scoping a subscriber to one future or thread.
pub fn build_subscriber(
    config: &TracingConfig,
) -> Result<impl Subscriber + Send + Sync + 'static, TracingError> {
    let env_filter = config.build_env_filter()?;

    let file_layer = match config.log_file {
        Some(ref path) => {
            let file = open_log_file(path)?;
            Some(fmt_layer(config, Mutex::new(file), false))
        }
        None => None,
    };

    let stderr_layer = (config.log_file.is_none() || config.mirror_stderr)
        .then(|| fmt_layer(config, io::stderr, true));

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer))
}

fn fmt_layer<S, W>(
    config: &TracingConfig,
    writer: W,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target);

    match config.output_format {
        TracingOutputFormat::Compact => layer.compact().boxed(),
        TracingOutputFormat::Json => layer.json().boxed(),
    }
}

/// Opens `path` for appending, creating it and its parent directories.
pub fn open_log_file(path: &Path) -> Result<File, TracingError> {
    let to_error = |source| TracingError::LogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_location);
        assert!(config.log_file.is_none());
        assert!(!config.mirror_stderr);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn test_debug_config() {
        let config = TracingConfig::debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_location);
        assert!(config.mirror_stderr);
    }

    #[test]
    fn test_builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Json)
            .with_log_file("/tmp/reminder.log")
            .with_env_filter("calscan=trace");

        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/reminder.log")));
        assert_eq!(config.env_filter, Some("calscan=trace".to_string()));
    }

    #[test]
    fn test_invalid_env_filter() {
        let config = TracingConfig::default().with_env_filter("calscan=[");
        assert!(matches!(
            config.build_env_filter(),
            Err(TracingError::EnvFilter(_))
        ));
    }

    #[test]
    fn test_subscriber_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminder.log");
        let config = TracingConfig::default()
            .with_log_file(&path)
            .with_env_filter("info");

        let subscriber = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("hello from the scan");
            tracing::debug!("too verbose");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO"));
        assert!(content.contains("hello from the scan"));
        assert!(!content.contains("too verbose"));
    }

    #[test]
    fn test_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reminder.log");

        let mut first = open_log_file(&path).unwrap();
        writeln!(first, "first").unwrap();
        drop(first);

        let mut second = open_log_file(&path).unwrap();
        writeln!(second, "second").unwrap();
        drop(second);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
