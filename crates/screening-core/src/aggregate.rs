//! Weighted aggregation of sub-scores into one composite score.
//!
//! `composite = jd*w_jd + cultural*w_cultural + uniqueness*w_uniqueness
//!            + sum(custom[i] * w_custom[i])` over criteria present on both
//! sides. Custom scores without a matching weight contribute zero and are
//! listed in `CompositeBreakdown::ignored_criteria`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::WeightConfig;

/// Borrowed view of the sub-scores an evaluation has accumulated.
#[derive(Debug, Clone, Copy)]
pub struct SubScores<'a> {
    pub jd_score: Option<f64>,
    pub cultural_fit_score: Option<f64>,
    pub uniqueness_score: Option<f64>,
    pub custom_criteria_scores: &'a BTreeMap<String, f64>,
}

/// One weighted term of the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub criterion: String,
    pub score: f64,
    pub weight: f64,
    pub weighted: f64,
}

/// Composite score plus every term that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    pub composite: f64,
    pub contributions: Vec<Contribution>,
    /// Custom criteria that were scored but have no configured weight.
    pub ignored_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("sub-score '{criterion}' is missing at aggregation")]
    MissingScore { criterion: &'static str },

    #[error("sub-score '{criterion}' = {value} is outside [0, 10]")]
    InvalidScore { criterion: String, value: f64 },
}

/// Combine `scores` with `weights`.
///
/// Pure. Custom criteria are summed in name order, so the result does not
/// depend on the order they were produced in.
pub fn aggregate(
    scores: &SubScores<'_>,
    weights: &WeightConfig,
) -> Result<CompositeBreakdown, AggregationError> {
    let base = [
        ("jd_score", scores.jd_score, weights.jd_weight),
        ("cultural_fit_score", scores.cultural_fit_score, weights.cultural_weight),
        ("uniqueness_score", scores.uniqueness_score, weights.uniqueness_weight),
    ];

    let mut contributions = Vec::with_capacity(base.len() + scores.custom_criteria_scores.len());
    for (criterion, score, weight) in base {
        let score = score.ok_or(AggregationError::MissingScore { criterion })?;
        contributions.push(term(criterion, score, weight)?);
    }

    let mut ignored_criteria = Vec::new();
    for (name, score) in scores.custom_criteria_scores {
        match weights.custom_weights.get(name) {
            Some(weight) => contributions.push(term(name, *score, *weight)?),
            None => ignored_criteria.push(name.clone()),
        }
    }

    let composite: f64 = contributions.iter().map(|c| c.weighted).sum();
    Ok(CompositeBreakdown {
        composite,
        contributions,
        ignored_criteria,
    })
}

fn term(criterion: &str, score: f64, weight: f64) -> Result<Contribution, AggregationError> {
    if !score.is_finite() || !(0.0..=10.0).contains(&score) {
        return Err(AggregationError::InvalidScore {
            criterion: criterion.to_string(),
            value: score,
        });
    }
    Ok(Contribution {
        criterion: criterion.to_string(),
        score,
        weight,
        weighted: score * weight,
    })
}
