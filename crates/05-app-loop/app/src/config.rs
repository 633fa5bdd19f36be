use hub::{DEFAULT_INTENT_BUDGET, DEFAULT_REPORT_BUDGET};
use sandbox::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} must be at least 1")]
    ZeroBudget(&'static str),
}

/// Session tunables: engine options plus scheduler budgets.
///
/// Every key is optional; missing ones keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub engine: EngineOptions,
    /// Intents reduced per scheduler tick.
    pub intent_budget: usize,
    /// Reports drained per scheduler tick.
    pub report_budget: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            intent_budget: DEFAULT_INTENT_BUDGET,
            report_budget: DEFAULT_REPORT_BUDGET,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.intent_budget == 0 {
            return Err(ConfigError::ZeroBudget("intent_budget"));
        }
        if self.report_budget == 0 {
            return Err(ConfigError::ZeroBudget("report_budget"));
        }
        Ok(())
    }
}
