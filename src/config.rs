use std::path::Path;

use crate::{
    foundation::error::{FivedError, FivedResult},
    optimizer::model::DEFAULT_LEARNING_RATE,
    render::backend::BackendKind,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub enabled: bool,
    pub learning_rate: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Runtime configuration.
///
/// Every field has a default, so an empty JSON object is a valid config file.
/// Environment variables override the file:
///
/// - `FIVED_BACKEND`: `auto`, `software` or `gpu`
/// - `FIVED_OPTIMIZER`: `0`, `false` or `off` disables the optimizer
/// - `FIVED_LEARNING_RATE`: positive float
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    pub optimizer: OptimizerConfig,
}

impl Config {
    pub fn from_json_str(s: &str) -> FivedResult<Self> {
        let config: Config = serde_json::from_str(s)
            .map_err(|e| FivedError::config(format!("invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: &Path) -> FivedResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FivedError::config(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn with_env_overrides(self) -> FivedResult<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> FivedResult<Self> {
        if let Some(v) = lookup("FIVED_BACKEND") {
            self.backend = v.parse()?;
        }
        if let Some(v) = lookup("FIVED_OPTIMIZER") {
            self.optimizer.enabled = !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        if let Some(v) = lookup("FIVED_LEARNING_RATE") {
            self.optimizer.learning_rate = v.trim().parse::<f64>().map_err(|_| {
                FivedError::config(format!("FIVED_LEARNING_RATE is not a number: '{v}'"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> FivedResult<()> {
        let lr = self.optimizer.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return Err(FivedError::config(format!(
                "optimizer.learning_rate must be a positive number, got {lr}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
