//! Configuration management for the server.
//!
//! Every setting is a command-line flag that can also be supplied through a
//! `TW_MCP_*` environment variable.

#![warn(missing_docs, clippy::pedantic)]

use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use http::Uri;
use mcp_policy::AccessPolicy;
use mcp_telemetry::{LogFormat, LogSettings};
use serde::Serialize;

/// Settings consumed once during startup.
#[derive(Debug, Clone, Args, Serialize)]
pub struct ServerConfig {
    /// Base URL of the Teamwork installation.
    #[arg(
        long,
        env = "TW_MCP_API_URL",
        default_value = "https://example.teamwork.com"
    )]
    pub api_url: String,

    /// Bearer token sent with every API request.
    #[arg(long, env = "TW_MCP_BEARER_TOKEN", hide_env_values = true)]
    #[serde(skip)]
    pub bearer_token: Option<String>,

    /// Expose read tools only.
    #[arg(long, env = "TW_MCP_READ_ONLY")]
    pub read_only: bool,

    /// Expose delete tools (ignored in read-only mode).
    #[arg(long, env = "TW_MCP_ALLOW_DELETE")]
    pub allow_delete: bool,

    /// Toolsets or methods to enable, comma separated; `all` enables everything.
    #[arg(
        long,
        env = "TW_MCP_TOOLSETS",
        value_delimiter = ',',
        default_value = "all"
    )]
    pub toolsets: Vec<String>,

    /// Timeout for a single API request, in seconds.
    #[arg(long, env = "TW_MCP_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Maximum number of tool calls served concurrently.
    #[arg(long, env = "TW_MCP_MAX_CONCURRENCY", default_value_t = 16)]
    pub max_concurrency: usize,

    /// Log filter directives, e.g. `info,mcp_kernel=debug`.
    #[arg(long, env = "TW_MCP_LOG", default_value = "info")]
    pub log_filter: String,

    /// Log output format.
    #[arg(long, env = "TW_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Checks values clap cannot validate on its own.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed API URL, a zero timeout, or zero
    /// concurrency.
    pub fn validate(&self) -> anyhow::Result<()> {
        let uri = self.api_uri()?;
        if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.host().is_none() {
            bail!("api url `{}` must be an absolute http(s) URL", self.api_url);
        }
        if self.request_timeout == 0 {
            bail!("request timeout must be at least one second");
        }
        if self.max_concurrency == 0 {
            bail!("max concurrency must be at least 1");
        }
        Ok(())
    }

    /// Parses the API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL cannot be parsed.
    pub fn api_uri(&self) -> anyhow::Result<Uri> {
        self.api_url
            .parse::<Uri>()
            .with_context(|| format!("invalid api url `{}`", self.api_url))
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Returns the access policy implied by the read-only and delete switches.
    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.read_only, self.allow_delete)
    }

    /// Returns the logging settings.
    #[must_use]
    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_filter.clone(), self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: ServerConfig,
    }

    fn parse(args: &[&str]) -> ServerConfig {
        let argv = std::iter::once("tw-mcp").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().config
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.api_url, "https://example.teamwork.com");
        assert_eq!(config.toolsets, ["all"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 16);
        assert!(!config.read_only);
        assert!(!config.allow_delete);
        assert_eq!(config.log_settings(), LogSettings::default());
        config.validate().unwrap();
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--read-only",
            "--allow-delete",
            "--toolsets",
            "tickets,twprojects-list_tasks",
            "--log-format",
            "json",
        ]);

        assert_eq!(config.toolsets, ["tickets", "twprojects-list_tasks"]);
        assert_eq!(config.log_format, LogFormat::Json);

        let policy = config.access_policy();
        assert!(policy.read_only());
        assert!(policy.allow_delete());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let relative = parse(&["--api-url", "/just/a/path"]);
        assert!(relative.validate().is_err());

        let zero = parse(&["--request-timeout", "0"]);
        let err = zero.validate().expect_err("zero timeout");
        assert!(err.to_string().contains("timeout"));

        let idle = parse(&["--max-concurrency", "0"]);
        assert!(idle.validate().is_err());
    }

    #[test]
    fn token_is_never_serialized() {
        let config = parse(&["--bearer-token", "secret"]);
        assert_eq!(config.bearer_token.as_deref(), Some("secret"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"read_only\":false"));
    }
}
