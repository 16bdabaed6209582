//! Assessment oracle contract and response validation.
//!
//! The oracle is the external reasoning step that turns input documents
//! into raw sub-scores and justification text. This module defines:
//! - the `AssessmentOracle` port and the request it receives
//! - required-field schemas per capability
//! - typed parsing of responses, with scores range-checked to [0, 10]

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use screening_state::{CandidateId, JobId};

/// Named judgment the oracle is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    JdFit,
    CulturalUniquenessCustom,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JdFit => "jd_fit",
            Self::CulturalUniquenessCustom => "cultural_uniqueness_custom",
        }
    }

    /// Fields every response for this capability must carry.
    pub fn response_schema(&self) -> JsonFieldSchema {
        match self {
            Self::JdFit => JsonFieldSchema::required(["jd_score", "justification"]),
            Self::CulturalUniquenessCustom => JsonFieldSchema::required([
                "cultural_fit_score",
                "cultural_fit_justification",
                "uniqueness_score",
                "uniqueness_justification",
                "custom_criteria_scores",
            ]),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal JSON schema: required top-level fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonFieldSchema {
    pub required_fields: Vec<String>,
}

impl JsonFieldSchema {
    pub fn required<const N: usize>(fields: [&str; N]) -> Self {
        Self {
            required_fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }

    pub fn validate(&self, capability: Capability, payload: &Value) -> Result<(), ResponseParseError> {
        let object = payload
            .as_object()
            .ok_or(ResponseParseError::NotAnObject { capability })?;
        for field in &self.required_fields {
            if object.get(field).map_or(true, Value::is_null) {
                return Err(ResponseParseError::MissingField {
                    capability,
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Structured request handed to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub payload: Value,
}

/// Failure reported by an oracle implementation.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle rejected the request: {0}")]
    Rejected(String),
}

/// Response did not match the capability's contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseParseError {
    #[error("response for '{capability}' is not a JSON object")]
    NotAnObject { capability: Capability },

    #[error("response for '{capability}' is missing required field '{field}'")]
    MissingField {
        capability: Capability,
        field: String,
    },

    #[error("field '{field}' in '{capability}' response is not {expected}")]
    WrongType {
        capability: Capability,
        field: String,
        expected: &'static str,
    },

    #[error("score '{field}' = {value} is outside [0, 10]")]
    ScoreOutOfRange { field: String, value: f64 },

    #[error("custom criterion '{name}' scored more than once")]
    DuplicateCriterion { name: String },
}

/// Adapter contract for the external reasoning step.
#[async_trait]
pub trait AssessmentOracle: Send + Sync {
    /// Produce a structured judgment for `capability`.
    async fn evaluate(
        &self,
        request: &AssessmentRequest,
        capability: Capability,
    ) -> Result<Value, OracleError>;
}

/// Parsed `jd_fit` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JdFitAssessment {
    pub jd_score: f64,
    pub justification: String,
    /// Full response as returned by the oracle, persisted as the artifact.
    pub document: Value,
}

impl JdFitAssessment {
    pub fn parse(response: Value) -> Result<Self, ResponseParseError> {
        let capability = Capability::JdFit;
        capability.response_schema().validate(capability, &response)?;
        let fields = Fields::new(capability, &response)?;
        Ok(Self {
            jd_score: fields.score("jd_score")?,
            justification: fields.text("justification")?,
            document: response,
        })
    }
}

/// Parsed `cultural_uniqueness_custom` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalAssessment {
    pub cultural_fit_score: f64,
    pub cultural_fit_justification: String,
    pub uniqueness_score: f64,
    pub uniqueness_justification: String,
    pub custom_criteria_scores: BTreeMap<String, f64>,
    pub document: Value,
}

impl CulturalAssessment {
    pub fn parse(response: Value) -> Result<Self, ResponseParseError> {
        let capability = Capability::CulturalUniquenessCustom;
        capability.response_schema().validate(capability, &response)?;
        let fields = Fields::new(capability, &response)?;
        Ok(Self {
            cultural_fit_score: fields.score("cultural_fit_score")?,
            cultural_fit_justification: fields.text("cultural_fit_justification")?,
            uniqueness_score: fields.score("uniqueness_score")?,
            uniqueness_justification: fields.text("uniqueness_justification")?,
            custom_criteria_scores: fields.custom_scores("custom_criteria_scores")?,
            document: response,
        })
    }
}

struct Fields<'a> {
    capability: Capability,
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(capability: Capability, response: &'a Value) -> Result<Self, ResponseParseError> {
        let object = response
            .as_object()
            .ok_or(ResponseParseError::NotAnObject { capability })?;
        Ok(Self { capability, object })
    }

    fn get(&self, field: &str) -> Result<&'a Value, ResponseParseError> {
        self.object
            .get(field)
            .ok_or_else(|| ResponseParseError::MissingField {
                capability: self.capability,
                field: field.to_string(),
            })
    }

    fn wrong_type(&self, field: &str, expected: &'static str) -> ResponseParseError {
        ResponseParseError::WrongType {
            capability: self.capability,
            field: field.to_string(),
            expected,
        }
    }

    fn score(&self, field: &str) -> Result<f64, ResponseParseError> {
        let value = self.get(field)?;
        let score = value
            .as_f64()
            .ok_or_else(|| self.wrong_type(field, "a number"))?;
        check_range(field, score)
    }

    fn text(&self, field: &str) -> Result<String, ResponseParseError> {
        self.get(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_type(field, "a string"))
    }

    /// Accepts either `[{"name": .., "score": ..}, ..]` or `{"name": score, ..}`.
    fn custom_scores(&self, field: &str) -> Result<BTreeMap<String, f64>, ResponseParseError> {
        let mut scores = BTreeMap::new();
        match self.get(field)? {
            Value::Array(entries) => {
                for entry in entries {
                    let name = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| self.wrong_type(field, "a list of {name, score} objects"))?;
                    let score = entry
                        .get("score")
                        .and_then(Value::as_f64)
                        .ok_or_else(|| self.wrong_type(field, "a list of {name, score} objects"))?;
                    insert_unique(&mut scores, name, check_range(name, score)?)?;
                }
            }
            Value::Object(map) => {
                for (name, value) in map {
                    let score = value
                        .as_f64()
                        .ok_or_else(|| self.wrong_type(field, "a map of numeric scores"))?;
                    insert_unique(&mut scores, name, check_range(name, score)?)?;
                }
            }
            _ => return Err(self.wrong_type(field, "a list or map of scores")),
        }
        Ok(scores)
    }
}

fn check_range(field: &str, score: f64) -> Result<f64, ResponseParseError> {
    if score.is_finite() && (0.0..=10.0).contains(&score) {
        Ok(score)
    } else {
        Err(ResponseParseError::ScoreOutOfRange {
            field: field.to_string(),
            value: score,
        })
    }
}

fn insert_unique(
    scores: &mut BTreeMap<String, f64>,
    name: &str,
    score: f64,
) -> Result<(), ResponseParseError> {
    if scores.insert(name.to_string(), score).is_some() {
        return Err(ResponseParseError::DuplicateCriterion {
            name: name.to_string(),
        });
    }
    Ok(())
}
