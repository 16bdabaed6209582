//! Pipeline settings: default weights and thresholds for new evaluations,
//! plus the time budgets the sequencer enforces.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, ThresholdConfig, WeightConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningSettings {
    /// Used when an `EvaluationRequest` carries no weights of its own.
    pub weights: WeightConfig,
    /// Used when an `EvaluationRequest` carries no thresholds of its own.
    pub thresholds: ThresholdConfig,
    /// Budget for one stage, oracle and persistence calls included.
    pub stage_timeout_ms: u64,
    /// Budget for each input document fetch.
    pub fetch_timeout_ms: u64,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            weights: WeightConfig::default(),
            thresholds: ThresholdConfig::default(),
            stage_timeout_ms: 120_000,
            fetch_timeout_ms: 30_000,
        }
    }
}

impl ScreeningSettings {
    /// Parse settings from JSON; absent fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        if self.stage_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "stage_timeout_ms",
            });
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                name: "fetch_timeout_ms",
            });
        }
        Ok(())
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
