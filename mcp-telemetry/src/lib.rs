//! Observability utilities for the server.
//!
//! Logs always go to stderr: stdout is reserved for protocol frames.

#![warn(missing_docs, clippy::pedantic)]

use std::io;

use anyhow::{Context, anyhow};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Rendering of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    filter: String,
    format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new("info", LogFormat::Pretty)
    }
}

impl LogSettings {
    /// Creates settings from an `EnvFilter` directive string and a format.
    #[must_use]
    pub fn new(filter: impl Into<String>, format: LogFormat) -> Self {
        Self {
            filter: filter.into(),
            format,
        }
    }

    /// Returns the filter directives, e.g. `info,mcp_kernel=debug`.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the output format.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Parses the filter directives.
    ///
    /// # Errors
    ///
    /// Returns an error when the directives are malformed.
    pub fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        EnvFilter::try_new(&self.filter)
            .with_context(|| format!("invalid log filter `{}`", self.filter))
    }
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error when the filter is malformed or a subscriber is already
/// installed.
pub fn init_tracing(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = settings.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    match settings.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
