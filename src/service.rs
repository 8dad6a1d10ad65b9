//! Scoring service
//!
//! Holds an immutable, shared fitted pipeline and answers single-record
//! and batch scoring requests. The service is built once and handed to
//! whoever needs it; it never mutates the model.

use crate::artifact::ModelArtifact;
use crate::data::schema::{self, FEATURE_COLUMNS, LABEL};
use crate::data::table::{Record, Table};
use crate::decision::{decide, evaluate, EvaluationReport, Threshold};
use crate::error::{Error, Result};
use crate::models::Prediction;
use crate::pipeline::Pipeline;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Scores for every row of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchScore {
    pub threshold: f64,
    pub probabilities: Vec<f64>,
    pub predictions: Vec<u8>,
    /// Present when the batch carried a complete 0/1 label column
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringService {
    model: Option<Arc<Pipeline>>,
}

impl ScoringService {
    /// A service with no model; every scoring call fails with
    /// [`Error::MissingModel`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pipeline(pipeline: impl Into<Arc<Pipeline>>) -> Result<Self> {
        let pipeline = pipeline.into();
        if !pipeline.is_fitted() {
            return Err(Error::MissingModel(format!(
                "pipeline is {}, not fitted",
                pipeline.state()
            )));
        }
        Ok(Self {
            model: Some(pipeline),
        })
    }

    /// Load the artifact at `path`. An absent artifact is
    /// [`Error::MissingModel`]; callers treat it as fatal at startup.
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Self::from_pipeline(artifact.pipeline)
    }

    pub fn model(&self) -> Option<&Arc<Pipeline>> {
        self.model.as_ref()
    }

    fn pipeline(&self) -> Result<&Pipeline> {
        self.model
            .as_deref()
            .ok_or_else(|| Error::MissingModel("the scoring service has no model".into()))
    }

    /// Probability of a film adaptation for one record
    pub fn score_one(&self, record: &Record) -> Result<f64> {
        let pipeline = self.pipeline()?;
        let missing: Vec<&str> = FEATURE_COLUMNS
            .iter()
            .copied()
            .filter(|c| !record.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(Error::schema(format!(
                "record is missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let table = Table::from_records(std::slice::from_ref(record));
        let probabilities = pipeline.predict_proba(&table)?;
        probabilities
            .first()
            .copied()
            .ok_or_else(|| Error::Pipeline("pipeline returned no probability".into()))
    }

    /// [`score_one`](Self::score_one) plus the decision at `threshold`
    pub fn predict(&self, record: &Record, threshold: Threshold) -> Result<Prediction> {
        let probability = self.score_one(record)?;
        Ok(Prediction {
            probability,
            threshold: threshold.value(),
            adapted: threshold.decide(probability),
        })
    }

    /// Score every row; evaluate against `Adapted_to_Film` when that
    /// column is present and fully populated with 0/1.
    pub fn score_batch(&self, table: &Table, threshold: Threshold) -> Result<BatchScore> {
        let pipeline = self.pipeline()?;
        schema::require_columns(table, FEATURE_COLUMNS)?;

        let probabilities = pipeline.predict_proba(table)?;
        let predictions = decide(&probabilities, threshold);

        let evaluation = match complete_labels(table) {
            Some(labels) => {
                let mut report = evaluate(&labels, &predictions, &probabilities)?;
                report.threshold = Some(threshold.value());
                Some(report)
            }
            None => {
                debug!("No complete '{}' column; skipping evaluation", LABEL);
                None
            }
        };

        Ok(BatchScore {
            threshold: threshold.value(),
            probabilities,
            predictions,
            evaluation,
        })
    }
}

/// Labels only when every row has a valid 0/1 value
fn complete_labels(table: &Table) -> Option<Vec<u8>> {
    if !table.has_column(LABEL) {
        return None;
    }
    schema::binary_labels(table)
        .ok()?
        .into_iter()
        .collect::<Option<Vec<u8>>>()
}
