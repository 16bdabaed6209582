//! Intake: resolve the five input documents before stage 1.
//!
//! All fetches run concurrently under the fetch timeout; the first failure
//! aborts intake and names the input that failed.

use std::time::Duration;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use screening_state::{CandidateId, DocumentSource, JobId};

use crate::domain::{EvaluationInputs, StageError, ThresholdConfig, WeightConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Resume,
    JobDescription,
    CompanyValues,
    UniquenessDefinition,
    CustomCriteria,
}

impl InputKind {
    pub const ALL: [InputKind; 5] = [
        Self::Resume,
        Self::JobDescription,
        Self::CompanyValues,
        Self::UniquenessDefinition,
        Self::CustomCriteria,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::JobDescription => "job_description",
            Self::CompanyValues => "company_values",
            Self::UniquenessDefinition => "uniqueness_definition",
            Self::CustomCriteria => "custom_criteria",
        }
    }
}

/// Where each input document lives in the `DocumentSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLocators {
    pub resume: String,
    pub job_description: String,
    pub company_values: String,
    pub uniqueness_definition: String,
    pub custom_criteria: String,
}

impl InputLocators {
    pub fn locator(&self, kind: InputKind) -> &str {
        match kind {
            InputKind::Resume => &self.resume,
            InputKind::JobDescription => &self.job_description,
            InputKind::CompanyValues => &self.company_values,
            InputKind::UniquenessDefinition => &self.uniqueness_definition,
            InputKind::CustomCriteria => &self.custom_criteria,
        }
    }
}

/// Everything needed to start an evaluation from document locators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub inputs: InputLocators,
    /// Falls back to the sequencer's settings when absent.
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    pub thresholds: Option<ThresholdConfig>,
}

/// Fetch all inputs concurrently.
pub async fn fetch_inputs(
    source: &dyn DocumentSource,
    locators: &InputLocators,
    fetch_timeout: Duration,
) -> Result<EvaluationInputs, StageError> {
    let fetches = InputKind::ALL.into_iter().map(|kind| async move {
        let locator = locators.locator(kind);
        match tokio::time::timeout(fetch_timeout, source.fetch(locator)).await {
            Err(_) => Err(StageError::Timeout {
                stage: format!("fetch {}", kind.as_str()),
                timeout_ms: saturating_millis(fetch_timeout),
            }),
            Ok(Err(error)) => Err(StageError::InputFetch {
                input: kind.as_str(),
                source: error,
            }),
            Ok(Ok(document)) => Ok((kind, document)),
        }
    });

    let mut inputs = EvaluationInputs::default();
    for (kind, document) in try_join_all(fetches).await? {
        *slot(&mut inputs, kind) = document;
    }
    Ok(inputs)
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn slot(inputs: &mut EvaluationInputs, kind: InputKind) -> &mut Value {
    match kind {
        InputKind::Resume => &mut inputs.resume,
        InputKind::JobDescription => &mut inputs.job_description,
        InputKind::CompanyValues => &mut inputs.company_values,
        InputKind::UniquenessDefinition => &mut inputs.uniqueness_definition,
        InputKind::CustomCriteria => &mut inputs.custom_criteria,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use screening_state::fakes::MemoryDocumentSource;
    use serde_json::json;

    fn locators() -> InputLocators {
        InputLocators {
            resume: "docs/resume".into(),
            job_description: "docs/jd".into(),
            company_values: "docs/values".into(),
            uniqueness_definition: "docs/uniqueness".into(),
            custom_criteria: "docs/custom".into(),
        }
    }

    fn source() -> MemoryDocumentSource {
        MemoryDocumentSource::new()
            .with_document("docs/resume", json!({"name": "Ada"}))
            .with_document("docs/jd", json!({"title": "Engineer"}))
            .with_document("docs/values", json!(["ownership"]))
            .with_document("docs/uniqueness", json!({"def": "rare"}))
            .with_document("docs/custom", json!([{"name": "A"}]))
    }

    #[tokio::test]
    async fn fetches_every_input() {
        let src = source();
        let inputs = fetch_inputs(&src, &locators(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(inputs.resume["name"], "Ada");
        assert_eq!(inputs.job_description["title"], "Engineer");
        assert_eq!(inputs.custom_criteria[0]["name"], "A");
        assert_eq!(src.fetch_count(), 5);
    }

    #[tokio::test]
    async fn failure_names_the_input() {
        let src = source().with_failure("docs/values");
        let err = fetch_inputs(&src, &locators(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputFetch);
        assert!(matches!(
            err,
            StageError::InputFetch {
                input: "company_values",
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        let src = locators_with_delays();
        let started = tokio::time::Instant::now();
        fetch_inputs(&src, &locators(), Duration::from_secs(10))
            .await
            .unwrap();
        // Five 2s fetches finish together, not one after another.
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let src = source().with_delay("docs/jd", Duration::from_secs(60));
        let err = fetch_inputs(&src, &locators(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("job_description"));
        assert!(matches!(err, StageError::Timeout { timeout_ms: 5_000, .. }));
    }

    #[test]
    fn timeout_millis_saturate() {
        assert_eq!(saturating_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    fn locators_with_delays() -> MemoryDocumentSource {
        let l = locators();
        InputKind::ALL.iter().fold(source(), |src, kind| {
            src.with_delay(l.locator(*kind), Duration::from_secs(2))
        })
    }
}
