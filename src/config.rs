// Ingest Configuration

use crate::Result;
use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_MS, DEFAULT_TLS_PORT,
};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding one tree document per root thumbprint
    pub output_dir: PathBuf,

    /// Connect and handshake timeout in milliseconds
    pub timeout_ms: u64,

    /// Port used when a hostname carries none
    pub default_port: u16,

    /// Maximum levels attached below a root per merge
    pub max_depth: usize,

    /// Write indented JSON instead of compact documents
    pub pretty: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            default_port: DEFAULT_TLS_PORT,
            max_depth: DEFAULT_MAX_DEPTH,
            pretty: false,
        }
    }
}

impl IngestConfig {
    /// Create config from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            GraphError::FileSystemError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config: IngestConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create example config file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let toml = toml::to_string_pretty(&Self::default())?;
        std::fs::write(path, toml).map_err(|source| GraphError::FileSystemError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(GraphError::ConfigError {
                message: "timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.default_port == 0 {
            return Err(GraphError::ConfigError {
                message: "default_port must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
