//! Structured logging initialization
//!
//! The pipeline itself only emits `tracing` events and spans (a `dispatch`
//! span per request, registration logs, rejected and failed requests). This
//! module installs a `tracing-subscriber` stack for binaries that want those
//! events on stdout:
//! - JSON output for production, pretty output for development
//! - `RUST_LOG` overrides the configured level when set
//! - Optional non-blocking writer via `tracing-appender`
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `HANDLR_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `HANDLR_LOG_FORMAT` | `json` | json/pretty |
//! | `HANDLR_LOG_ASYNC` | `true` | buffer output on a background thread |
//! | `HANDLR_LOG_TARGET_FILTER` | unset | extra comma-separated filter directives |
//! | `HANDLR_LOG_INCLUDE_LOCATION` | `false` | include file:line |

use anyhow::{Context, Result};
use std::env;
use std::sync::OnceLock;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Flush guard of the background writer installed by [`init_logging_with_config`].
static WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a non-blocking background writer
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("HANDLR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("HANDLR_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env::var("HANDLR_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            target_filter: env::var("HANDLR_LOG_TARGET_FILTER").ok(),
            include_location: env::var("HANDLR_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// The filter this configuration installs. `RUST_LOG` wins over
    /// `log_level`; target directives are added on top.
    ///
    /// # Errors
    ///
    /// A target directive that does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        let directives = self.target_filter.iter().flat_map(|f| f.split(','));
        for filter in directives.map(str::trim).filter(|f| !f.is_empty()) {
            let directive: Directive = filter
                .parse()
                .with_context(|| format!("Invalid log filter directive {filter:?}"))?;
            env_filter = env_filter.add_directive(directive);
        }
        Ok(env_filter)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::default_prod()
    }
}

/// Initialize logging from `HANDLR_LOG_*`, overriding the level.
///
/// # Example
///
/// ```no_run
/// handlr::otel::init_logging("info").expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: &str) -> Result<()> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Install the global subscriber described by `config`.
///
/// With `async_logging` the output goes through a `tracing-appender`
/// background writer whose guard lives until the process exits.
///
/// # Errors
///
/// Fails on an invalid target directive, or when a global subscriber is
/// already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let filter = config.env_filter()?;

    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(writer);
    let fmt_layer = match config.format {
        LogFormat::Json => fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => fmt_layer.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    if let Some(guard) = guard {
        WRITER_GUARD.get_or_init(|| guard);
    }
    Ok(())
}
