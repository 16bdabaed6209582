//! Weight and threshold configuration carried by each evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Per-criterion multipliers. Base weights plus matched custom weights are
/// expected to sum to 10 so the composite lands on the 0-100 scale; that sum
/// is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub jd_weight: f64,
    pub cultural_weight: f64,
    pub uniqueness_weight: f64,
    pub custom_weights: BTreeMap<String, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            jd_weight: 4.0,
            cultural_weight: 2.0,
            uniqueness_weight: 3.0,
            custom_weights: BTreeMap::from([
                ("custom_criteria_1".to_string(), 0.5),
                ("custom_criteria_2".to_string(), 0.3),
                ("custom_criteria_3".to_string(), 0.2),
            ]),
        }
    }
}

impl WeightConfig {
    /// Weights with the given base values and no custom criteria.
    pub fn base(jd_weight: f64, cultural_weight: f64, uniqueness_weight: f64) -> Self {
        Self {
            jd_weight,
            cultural_weight,
            uniqueness_weight,
            custom_weights: BTreeMap::new(),
        }
    }

    pub fn with_custom(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.custom_weights.insert(name.into(), weight);
        self
    }

    /// Sum of every configured weight.
    pub fn total(&self) -> f64 {
        self.jd_weight
            + self.cultural_weight
            + self.uniqueness_weight
            + self.custom_weights.values().sum::<f64>()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = [
            ("jd_weight", self.jd_weight),
            ("cultural_weight", self.cultural_weight),
            ("uniqueness_weight", self.uniqueness_weight),
        ];
        let custom = self
            .custom_weights
            .iter()
            .map(|(name, value)| (name.as_str(), *value));

        for (name, value) in base.into_iter().chain(custom) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Routing gate (0-10 scale) and decision bands (0-100 scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub routing_threshold: f64,
    pub absolute_threshold: f64,
    pub error_boundary: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            routing_threshold: 7.0,
            absolute_threshold: 70.0,
            error_boundary: 10.0,
        }
    }
}

impl ThresholdConfig {
    pub fn new(routing_threshold: f64, absolute_threshold: f64, error_boundary: f64) -> Self {
        Self {
            routing_threshold,
            absolute_threshold,
            error_boundary,
        }
    }

    pub fn lower_bound(&self) -> f64 {
        self.absolute_threshold - self.error_boundary
    }

    pub fn upper_bound(&self) -> f64 {
        self.absolute_threshold + self.error_boundary
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("routing_threshold", self.routing_threshold),
            ("absolute_threshold", self.absolute_threshold),
            ("error_boundary", self.error_boundary),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteThreshold { name, value });
            }
        }
        if !(0.0..=10.0).contains(&self.routing_threshold) {
            return Err(ConfigError::RoutingThresholdOutOfRange {
                value: self.routing_threshold,
            });
        }
        if self.error_boundary < 0.0 {
            return Err(ConfigError::NegativeErrorBoundary {
                value: self.error_boundary,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_sum_to_ten() {
        let weights = WeightConfig::default();
        weights.validate().unwrap();
        assert!((weights.total() - 10.0).abs() < 1e-9);
        ThresholdConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_negative_and_nan_weights() {
        let err = WeightConfig::base(-1.0, 2.0, 3.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight { ref name, .. } if name == "jd_weight"));

        let err = WeightConfig::base(4.0, 2.0, 3.0)
            .with_custom("leadership", f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight { ref name, .. } if name == "leadership"));
    }

    #[test]
    fn weights_need_not_sum_to_ten() {
        WeightConfig::base(1.0, 1.0, 1.0).validate().unwrap();
    }

    #[test]
    fn threshold_validation() {
        assert!(matches!(
            ThresholdConfig::new(11.0, 70.0, 10.0).validate(),
            Err(ConfigError::RoutingThresholdOutOfRange { .. })
        ));
        assert!(matches!(
            ThresholdConfig::new(6.0, f64::INFINITY, 10.0).validate(),
            Err(ConfigError::NonFiniteThreshold { name: "absolute_threshold", .. })
        ));
        assert!(matches!(
            ThresholdConfig::new(6.0, 70.0, -0.5).validate(),
            Err(ConfigError::NegativeErrorBoundary { .. })
        ));
        ThresholdConfig::new(0.0, 0.0, 0.0).validate().unwrap();
    }

    #[test]
    fn bands() {
        let t = ThresholdConfig::new(6.0, 70.0, 10.0);
        assert_eq!(t.lower_bound(), 60.0);
        assert_eq!(t.upper_bound(), 80.0);
    }

    #[test]
    fn serde_fills_missing_fields_with_defaults() {
        let t: ThresholdConfig = serde_json::from_str(r#"{"routing_threshold": 5.5}"#).unwrap();
        assert_eq!(t.routing_threshold, 5.5);
        assert_eq!(t.absolute_threshold, 70.0);
    }
}
