//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - JSON, pretty-print and compact output formats
//! - Module-level filtering
//! - Span contexts around guard scopes
//!
//! ## Overview
//!
//! The barrier crates emit `tracing` events with structured fields
//! (`barrier`, `key`, `waited_ms`, `active_scopes`, `purged`). Nothing is
//! printed until the host installs a subscriber, which this module does with
//! `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
//!
//! #[core_async::main]
//! async fn main() {
//!     let config = LoggingConfig::default()
//!         .with_format(LogFormat::Pretty)
//!         .with_level(LogLevel::Debug);
//!
//!     init_logging(config).expect("Failed to initialize logging");
//!
//!     tracing::info!("Application started");
//! }
//! ```

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;

use tracing_subscriber::{
    filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Crates whose events follow the configured level in the default filter.
const WORKSPACE_CRATES: &[&str] = &["core_async", "core_runtime", "core_barrier"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Minimum severity that reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("Unknown log level: {other}"))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_barrier=trace,core_async=warn")
    pub filter: Option<String>,
    /// Emit span enter/exit events
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: false,
            display_target: true,
            // Tasks hop between workers, so the thread is worth seeing by default.
            display_thread_info: true,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable span events
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The filter string is invalid
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => init_pretty_logging(&config, filter),
        LogFormat::Json => init_json_logging(&config, filter),
        LogFormat::Compact => init_compact_logging(&config, filter),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Workspace crates at the configured level, everything else at warn.
        let level = config.level.as_str();
        let mut directives = vec!["warn".to_string()];
        directives.extend(
            WORKSPACE_CRATES
                .iter()
                .map(|krate| format!("{krate}={level}")),
        );
        directives.join(",")
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn span_events(config: &LoggingConfig) -> FmtSpan {
    if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

fn init_pretty_logging(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events(config))
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_json_logging(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(config.enable_spans)
        .with_span_list(config.enable_spans)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_compact_logging(config: &LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events(config))
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}
