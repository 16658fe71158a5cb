//! Diagnostic logging.
//!
//! Logs go to stderr through `tracing-subscriber` so that stdout only ever
//! carries the rendered report. `RUST_LOG` takes precedence over the
//! configured level; `PDFDESK_LOG_LEVEL` and `PDFDESK_LOG_JSON` override
//! the config file.

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable overriding the log level.
pub const LEVEL_ENV: &str = "PDFDESK_LOG_LEVEL";
/// Environment variable switching JSON output on or off.
pub const JSON_ENV: &str = "PDFDESK_LOG_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
        }
    }
}

impl LoggingConfig {
    /// Build from config-file values, then apply environment overrides.
    pub fn resolve(level: &str, use_json: bool) -> Self {
        let level = env::var(LEVEL_ENV)
            .ok()
            .and_then(|v| parse_level(&v))
            .or_else(|| parse_level(level))
            .unwrap_or(Level::WARN);

        let use_json = env::var(JSON_ENV)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(use_json);

        Self { level, use_json }
    }

    /// Raise the level to at least DEBUG.
    pub fn verbose(mut self) -> Self {
        if self.level < Level::DEBUG {
            self.level = Level::DEBUG;
        }
        self
    }
}

/// Parse a level name, case-insensitively.
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(config.level).into())
            .from_env_lossy();

        if env::var("RUST_LOG").is_err() {
            for directive in ["h2=warn", "hyper=warn", "reqwest=warn"] {
                if let Ok(d) = directive.parse() {
                    filter = filter.add_directive(d);
                }
            }
        }

        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.use_json {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("warning: logging already initialized: {}", e);
        }
    });
}
