use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found")]
    NotFound,
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

fn default_seats() -> u32 {
    5
}

/// Engine configuration stored in ~/.strato/engine.json
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineConfig {
    /// Connection URL for the membership/sharing store
    pub store_url: String,
    /// Endpoint of the object-storage bridge service
    pub bridge_endpoint: String,
    /// Sender address for invitation mail
    #[serde(default)]
    pub mailer_sender: Option<String>,
    /// Seats a newly created workspace starts with
    #[serde(default = "default_seats")]
    pub default_number_of_seats: u32,
}

impl EngineConfig {
    /// Load config from default path (~/.strato/engine.json)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound
            } else {
                ConfigError::Read(e)
            }
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build config from STRATO_* environment variables, for deployments
    /// that mount no config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_url = std::env::var("STRATO_STORE_URL")
            .map_err(|_| ConfigError::Invalid("STRATO_STORE_URL", "not set".into()))?;
        let bridge_endpoint = std::env::var("STRATO_BRIDGE_ENDPOINT")
            .map_err(|_| ConfigError::Invalid("STRATO_BRIDGE_ENDPOINT", "not set".into()))?;
        let mailer_sender = std::env::var("STRATO_MAILER_SENDER").ok();
        let default_number_of_seats = match std::env::var("STRATO_DEFAULT_SEATS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid("STRATO_DEFAULT_SEATS", v))?,
            Err(_) => default_seats(),
        };
        Ok(Self {
            store_url,
            bridge_endpoint,
            mailer_sender,
            default_number_of_seats,
        })
    }

    /// Save config to default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to custom path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self)?)?;
        Ok(())
    }

    /// Get default config path (~/.strato/engine.json)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .expect("Failed to get home directory")
            .join(".strato")
            .join("engine.json")
    }
}
