//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file found in this order:
//! 1. Command-line argument (highest priority)
//! 2. `VRQ_CONFIG` environment variable
//! 3. User config directory (`~/.config/vrq/config.toml` on Linux)
//! 4. Compiled defaults (no file)
//!
//! A missing default-location file is not an error; an explicitly named
//! file that does not exist is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::pool::PairingMode;
use crate::sink::remote_form::{FieldMapping, DEFAULT_TIMEOUT};
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "VRQ_CONFIG";
pub const QUESTIONS_ENV_VAR: &str = "VRQ_QUESTIONS_PER_PARTICIPANT";
pub const ADMIN_PASSWORD_ENV_VAR: &str = "VRQ_ADMIN_PASSWORD";

pub const DEFAULT_QUESTIONS_PER_PARTICIPANT: usize = 10;
pub const DEFAULT_QA_PORT: u16 = 5790;
pub const DEFAULT_DR_PORT: u16 = 5791;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 6 * 60 * 60;

/// Bootstrap configuration shared by vrq-qa and vrq-dr
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Questions asked per participant (capped by pool size)
    pub questions_per_participant: usize,

    /// Plain images, `<image_dir>/<group>/<file>`
    pub image_dir: PathBuf,

    /// Annotated images, same layout as `image_dir`
    pub annotated_image_dir: PathBuf,

    pub pairing: PairingMode,

    /// Sessions are dropped this long after they start, active or not
    pub session_ttl_secs: u64,

    /// Admin view password; admin view is locked when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    pub bind_host: String,
    pub qa_port: u16,
    pub dr_port: u16,

    pub sink: SinkConfig,

    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            questions_per_participant: DEFAULT_QUESTIONS_PER_PARTICIPANT,
            image_dir: PathBuf::from("Question/images"),
            annotated_image_dir: PathBuf::from("Question/images_bbox"),
            pairing: PairingMode::Position,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            admin_password: None,
            bind_host: "127.0.0.1".to_string(),
            qa_port: DEFAULT_QA_PORT,
            dr_port: DEFAULT_DR_PORT,
            sink: SinkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where finished sessions are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Local CSV file
    Csv { path: PathBuf },

    /// One form POST per row
    RemoteForm {
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        fields: Option<FieldMapping>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Csv {
            path: PathBuf::from("Question/results.csv"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.questions_per_participant == 0 {
            return Err(Error::Config(
                "questions_per_participant must be a positive integer".to_string(),
            ));
        }
        if let SinkConfig::RemoteForm { timeout_secs: 0, .. } = self.sink {
            return Err(Error::Config(
                "sink.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `VRQ_QUESTIONS_PER_PARTICIPANT` and `VRQ_ADMIN_PASSWORD`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(QUESTIONS_ENV_VAR) {
            self.questions_per_participant = value.trim().parse().map_err(|_| {
                Error::Config(format!("{} is not a positive integer: {:?}", QUESTIONS_ENV_VAR, value))
            })?;
        }
        if let Ok(value) = std::env::var(ADMIN_PASSWORD_ENV_VAR) {
            if !value.is_empty() {
                self.admin_password = Some(value);
            }
        }
        self.validate()
    }
}

/// Pick the config file to read, if any
///
/// Returns the path and whether it was named explicitly.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<(PathBuf, bool)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), true));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }

    // Priority 3: User config directory
    dirs::config_dir()
        .map(|d| d.join("vrq").join("config.toml"))
        .filter(|p| p.exists())
        .map(|p| (p, false))
}

/// Resolve, load and validate configuration, then apply env overrides
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some((path, explicit)) => {
            if !path.exists() {
                if explicit {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                warn!("Config file vanished: {}; using defaults", path.display());
                TomlConfig::default()
            } else {
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)?
            }
        }
        None => {
            // Priority 4: Compiled defaults
            warn!("No config file found; using built-in defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides()?;
    Ok(config)
}
