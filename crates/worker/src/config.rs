//! Configuration shared by the `intake` binaries
//!
//! Loaded from YAML; every field has a default so an absent file is valid.
//!
//! ```yaml
//! extract:
//!   scan_range: "A1:AM6000"
//!   min_populated: 2
//! worker:
//!   queue_depth: 16
//!   max_concurrent: 1
//! server:
//!   addr: "0.0.0.0:3000"
//!   body_limit_bytes: 52428800
//! ```

use crate::error::ConfigError;
use intake_sheet::{ExtractOptions, DEFAULT_MIN_POPULATED, DEFAULT_SCAN_RANGE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable overriding `server.addr`
pub const ADDR_ENV: &str = "INTAKE_ADDR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntakeConfig {
    pub extract: ExtractConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Hard scan cap, anchored at A1
    pub scan_range: String,
    pub min_populated: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            scan_range: DEFAULT_SCAN_RANGE.to_string(),
            min_populated: DEFAULT_MIN_POPULATED,
        }
    }
}

impl ExtractConfig {
    pub fn to_options(&self) -> Result<ExtractOptions, ConfigError> {
        let options = ExtractOptions::from_scan_range(&self.scan_range).map_err(|e| {
            ConfigError::Invalid {
                field: "extract.scan_range",
                reason: e.to_string(),
            }
        })?;
        Ok(options.with_min_populated(self.min_populated))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Requests that may wait before `submit` applies backpressure
    pub queue_depth: usize,
    /// Pipelines allowed to run at once
    pub max_concurrent: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            queue_depth: 16,
            max_concurrent: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub addr: String,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: "0.0.0.0:3000".to_string(),
            body_limit_bytes: 50 * 1024 * 1024,
        }
    }
}

impl IntakeConfig {
    /// Load from a YAML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded config file");
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        Ok(config.with_addr_override(std::env::var(ADDR_ENV).ok()))
    }

    /// Parse and validate YAML text
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: IntakeConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the listen address when an override is present
    #[must_use]
    pub fn with_addr_override(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            self.server.addr = addr;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extract.to_options()?;
        if self.worker.queue_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "worker.queue_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.worker.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                field: "worker.max_concurrent",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
