//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - Pretty, compact and JSON output formats
//! - Module-level filtering via `EnvFilter`
//! - Mirroring into a host [`LoggerSink`](bridge_traits::time::LoggerSink)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::time::LogLevel;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug);
//! init_logging(config).expect("failed to initialize logging");
//!
//! tracing::info!("core started");
//! ```
//!
//! When a `LoggerSink` is configured, every event that survives filtering is
//! forwarded to the host pipeline as a structured
//! [`LogEntry`](bridge_traits::time::LogEntry) in addition to the standard
//! subscriber output.

use crate::error::{Error, Result};
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format
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

/// Logging configuration
#[derive(Clone, Default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: Option<LogLevel>,
    /// Explicit filter directives; overrides `level` when set
    pub env_filter: Option<String>,
    /// Host sink mirroring
    pub sink: Option<Arc<dyn LoggerSink>>,
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.env_filter = Some(directives.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("env_filter", &self.env_filter)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn map_tracing_level(level: &tracing::Level) -> LogLevel {
    if *level == tracing::Level::TRACE {
        LogLevel::Trace
    } else if *level == tracing::Level::DEBUG {
        LogLevel::Debug
    } else if *level == tracing::Level::INFO {
        LogLevel::Info
    } else if *level == tracing::Level::WARN {
        LogLevel::Warn
    } else {
        LogLevel::Error
    }
}

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when neither an explicit filter nor a level is
/// configured. Fails when a subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = match (&config.env_filter, config.level) {
        (Some(directives), _) => {
            EnvFilter::try_new(directives).map_err(|e| Error::Logging(e.to_string()))?
        }
        (None, Some(level)) => EnvFilter::try_new(level_directive(level))
            .map_err(|e| Error::Logging(e.to_string()))?,
        (None, None) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let sink_layer = config.sink.map(|sink| SinkLayer { sink });
    let registry = tracing_subscriber::registry().with(filter).with(sink_layer);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| Error::Logging(e.to_string()))
}

/// Layer mirroring filtered events into a host `LoggerSink`.
///
/// Sink delivery is async; events are forwarded on the current tokio runtime
/// and dropped when no runtime is available (early startup, plain tests).
struct SinkLayer {
    sink: Arc<dyn LoggerSink>,
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = map_tracing_level(event.metadata().level());
        if level < self.sink.min_level() {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(level, event.metadata().target(), visitor.message);
        if let Some(error) = visitor.fields.remove("error") {
            entry = entry.with_error(error);
        }
        for (key, value) in visitor.fields {
            entry = entry.with_context(key, value);
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let sink = Arc::clone(&self.sink);
            handle.spawn(async move {
                let _ = sink.log(entry).await;
            });
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }
}
