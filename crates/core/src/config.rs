//! TOML-based configuration for tfusers.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! historical behaviour: read `users.csv`, write `variables.auto.tfvars`,
//! assign to `users`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::converter::ConvertOptions;
use crate::errors::ConfigError;
use crate::tfvars;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Conversion settings.
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Input, output, and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Directory export to read.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Variables file to write.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Name of the Terraform variable the mapping is assigned to.
    #[serde(default = "default_variable")]
    pub variable: String,

    /// Field delimiter; must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_input() -> PathBuf {
    PathBuf::from("users.csv")
}
fn default_output() -> PathBuf {
    PathBuf::from("variables.auto.tfvars")
}
fn default_variable() -> String {
    tfvars::DEFAULT_VARIABLE.into()
}
fn default_delimiter() -> String {
    ",".into()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            variable: default_variable(),
            delimiter: default_delimiter(),
        }
    }
}

impl ConvertConfig {
    /// The delimiter as a byte, if it is a single usable ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() && !matches!(*b, b'"' | b'\n' | b'\r') => Ok(*b),
            _ => Err(ConfigError::InvalidValue {
                field: "convert.delimiter".into(),
                detail: format!(
                    "'{}' is not a single ASCII character other than a quote or newline",
                    self.delimiter.escape_default()
                ),
            }),
        }
    }

    /// Build the options for a [`Converter`](crate::converter::Converter).
    pub fn to_options(&self) -> Result<ConvertOptions, ConfigError> {
        Ok(ConvertOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            variable: self.variable.clone(),
            delimiter: self.delimiter_byte()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.convert.input.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "convert.input".into(),
                detail: "input path must not be empty".into(),
            });
        }
        if self.convert.output.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "convert.output".into(),
                detail: "output path must not be empty".into(),
            });
        }
        if !tfvars::is_valid_variable_name(&self.convert.variable) {
            return Err(ConfigError::InvalidValue {
                field: "convert.variable".into(),
                detail: format!(
                    "'{}' is not a valid Terraform variable name",
                    self.convert.variable
                ),
            });
        }
        self.convert.delimiter_byte()?;

        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "log.level".into(),
                    detail: format!("unknown level '{}'", other),
                })
            }
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// A commented default configuration file.
    pub fn default_toml() -> &'static str {
        r#"# tfusers configuration

[convert]
# CSV export of the user directory. The first row must be the header.
input = "users.csv"
# Terraform variables file to (re)generate.
output = "variables.auto.tfvars"
# Variable the login -> user mapping is assigned to.
variable = "users"
delimiter = ","

[log]
level = "warn"
"#
    }
}
