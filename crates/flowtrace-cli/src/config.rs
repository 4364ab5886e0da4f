//! Configuration for the flowtrace CLI
//!
//! Provides:
//! - Config file discovery (CLI flag, env var, standard path)
//! - TOML parsing with serde
//! - Environment variable overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowtraceConfig {
    /// General settings
    pub general: GeneralSettings,

    /// Output settings
    pub output: OutputSettings,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default output format for reconstructed sequences
    pub format: OutputFormat,
}

/// How reconstructed sequences are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One human-readable line per event
    #[default]
    Text,
    /// One JSON record per line
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "jsonl" => Ok(OutputFormat::Jsonl),
            other => Err(ConfigError::ValidationError(format!(
                "unknown output format: {}",
                other
            ))),
        }
    }
}

/// Loads configuration from disk with discovery and overrides
pub struct ConfigLoader {
    /// Path to config file (if specified via CLI)
    cli_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { cli_path: None }
    }

    /// Set the config path from CLI argument
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Load configuration with the following precedence:
    /// 1. CLI --config flag
    /// 2. FLOWTRACE_CONFIG environment variable
    /// 3. ~/.config/flowtrace/config.toml
    /// 4. Default values
    pub fn load(&self) -> ConfigResult<FlowtraceConfig> {
        let config_path = self.find_config_file();

        let mut config = if let Some(path) = config_path {
            info!("Loading configuration from: {}", path.display());
            self.load_from_file(&path)?
        } else {
            debug!("No config file found, using defaults");
            FlowtraceConfig::default()
        };

        self.apply_env_overrides(&mut config);
        self.validate(&config)?;

        Ok(config)
    }

    /// Find the config file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        // 1. CLI --config flag
        if let Some(path) = &self.cli_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("CLI config path does not exist: {}", path.display());
        }

        // 2. FLOWTRACE_CONFIG environment variable
        if let Ok(env_path) = std::env::var("FLOWTRACE_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
            warn!("FLOWTRACE_CONFIG path does not exist: {}", env_path);
        }

        // 3. ~/.config/flowtrace/config.toml
        if let Some(config_dir) = config_dir() {
            let path = config_dir.join("flowtrace").join("config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Load configuration from a TOML file
    fn load_from_file(&self, path: &Path) -> ConfigResult<FlowtraceConfig> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut FlowtraceConfig) {
        if let Ok(val) = std::env::var("FLOWTRACE_LOG_LEVEL") {
            config.general.log_level = val;
        }
        if let Ok(val) = std::env::var("FLOWTRACE_OUTPUT_FORMAT") {
            match val.parse() {
                Ok(format) => config.output.format = format,
                Err(_) => warn!("Ignoring invalid FLOWTRACE_OUTPUT_FORMAT: {}", val),
            }
        }
    }

    /// Validate the configuration
    fn validate(&self, config: &FlowtraceConfig) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.general.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "invalid log level: {}",
                config.general.log_level
            )));
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the user's config directory
fn config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })
}
