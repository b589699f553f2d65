//! Logging configuration for dq-guard.
//!
//! The library only emits `tracing` events. Two knobs exist:
//!
//! - [`LogConfig`] is held by the analyzers and the plan generator and decides
//!   which optional events they emit (per-column details, SQL text).
//! - [`setup::init_logging`] installs a `tracing-subscriber` stack for
//!   binaries and tests. Library code never calls it.

/// Which optional events the analyzers emit.
///
/// Per-column events are off by default so that wide tables do not flood the
/// log. Completion summaries and `warn!` events for degraded metrics are
/// always emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit one `debug!` event per analyzed column
    pub log_column_details: bool,
    /// Emit the generated aggregate SQL at `debug`
    pub log_sql: bool,
    /// SQL text and other long fields are cut at this many bytes
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_column_details: false,
            log_sql: true,
            max_field_length: 500,
        }
    }
}

impl LogConfig {
    /// Everything, with long SQL kept mostly intact.
    pub fn verbose() -> Self {
        Self {
            log_column_details: true,
            log_sql: true,
            max_field_length: 4096,
        }
    }

    /// Summaries and warnings only.
    pub fn production() -> Self {
        Self {
            log_column_details: false,
            log_sql: false,
            max_field_length: 128,
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }
}

/// Logs a per-column `debug!` event when column details are enabled.
#[macro_export]
macro_rules! log_column {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_column_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Cuts `value` to at most `max_length` bytes on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber installation for binaries and tests.
pub mod setup {
    use tracing::Level;
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    use crate::error::{DqError, Result};

    /// How the global subscriber is built.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Level for everything outside dq-guard (DataFusion, Arrow)
        pub default_level: Level,
        /// Level for dq-guard's own targets
        pub crate_level: Level,
        /// Emit newline-delimited JSON instead of text
        pub json_format: bool,
        /// Log when instrumented spans such as `analyze` close, with timings
        pub span_timings: bool,
        /// Replaces the generated filter directives entirely
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                default_level: Level::WARN,
                crate_level: Level::INFO,
                json_format: false,
                span_timings: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output, dq-guard at `info`, everything else at `warn`.
        pub fn production() -> Self {
            Self {
                json_format: true,
                ..Self::default()
            }
        }

        /// Text output with span timings, dq-guard at `debug`.
        pub fn development() -> Self {
            Self {
                crate_level: Level::DEBUG,
                span_timings: true,
                ..Self::default()
            }
        }

        pub fn with_default_level(mut self, level: Level) -> Self {
            self.default_level = level;
            self
        }

        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_span_timings(mut self, enabled: bool) -> Self {
            self.span_timings = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// The filter directives this configuration stands for.
        pub fn directives(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},dq_guard={}",
                    self.default_level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                ),
            }
        }

        fn span_events(&self) -> FmtSpan {
            if self.span_timings {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            }
        }
    }

    /// Installs the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured directives when set.
    /// Fails with a configuration error when the directives do not parse or
    /// a subscriber is already installed.
    ///
    /// ```rust,no_run
    /// use dq_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development()).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(config.directives()).map_err(|e| {
                DqError::Configuration(format!(
                    "Invalid log filter '{}': {e}",
                    config.directives()
                ))
            })?,
        };

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(config.span_events())
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_span_events(config.span_events())
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| DqError::Configuration(format!("Failed to install subscriber: {e}")))
    }
}
