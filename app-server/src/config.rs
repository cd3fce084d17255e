//! `confassist.toml` loading.

use std::path::{Path, PathBuf};

use confassist_chatbot::ChatBotConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "confassist.toml";

pub const DEFAULT_GREETING: &str =
    "Welcome to Nebraska.Code(). Can I answer any questions about the schedule?";

pub const DEFAULT_TITLE: &str = "Nebraska.Code() Assistant";

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Everything the binary reads from `confassist.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub chatbot: ChatBotConfig,

    pub ui: UiConfig,
}

/// Chat page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Socket address the web server listens on.
    pub bind: String,

    /// Page and sidebar title.
    pub title: String,

    /// First assistant turn of every transcript.
    pub greeting: String,

    /// Seconds without a request before a chat session is discarded.
    pub session_idle_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            title: DEFAULT_TITLE.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, `confassist.toml` in the
    /// working directory is used when present, defaults otherwise.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    return Err(ConfigError::NotFound(path));
                }
                debug!("No {} found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config = Self::from_toml(&text, &path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
