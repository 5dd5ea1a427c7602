use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::exchange::deribit::TESTNET_URL;
use crate::{Error, Result};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_LOG_FILE: &str = "latency_log.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub log_file: PathBuf,
    pub base_url: String,
    pub timeout_secs: u64,
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            base_url: TESTNET_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials: None,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".into()));
        }
        if let Some(credentials) = &self.credentials {
            if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
                return Err(Error::Config(
                    "client_id and client_secret must both be set".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
