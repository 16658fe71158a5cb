//! Configuration file for pdfdesk.
//!
//! Every field is optional; a missing file means defaults everywhere.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::client::DEFAULT_BASE_URL;
use crate::report::OutputFormat;

/// Config file names looked for in the current directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["pdfdesk.yaml", ".pdfdesk.yaml"];

/// Default template written by `pdfdesk init`.
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/default.yaml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid server url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Where the analysis server lives.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ServerConfig {
    /// Origin of the server (default: http://localhost:5000)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout. Unset means requests wait indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ServerConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct LogConfig {
    /// trace, debug, info, warn or error (default: warn)
    #[serde(default)]
    pub level: Option<String>,
    /// Emit JSON log lines (default: false)
    #[serde(default)]
    pub json: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Load from an explicit path, or discover one, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => discover(),
        };

        match path {
            Some(p) => {
                let config = Self::parse_file(&p)?;
                tracing::debug!(path = %p.display(), "loaded config");
                Ok((config, Some(p)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output.format.unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or("warn")
    }

    pub fn log_json(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

/// Per-user config file, e.g. `~/.config/pdfdesk/config.yaml`.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pdfdesk").map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Find a config file in the current directory, then the user config dir.
pub fn discover() -> Option<PathBuf> {
    discover_in(Path::new(".")).or_else(|| user_config_path().filter(|p| p.is_file()))
}

fn discover_in(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Check a config for values that would fail later.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_base_url(config.server.base_url())?;
    if config.server.timeout_ms == Some(0) {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(())
}

/// The origin must be an absolute http(s) URL.
pub fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = url::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {:?}", other))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
