//! Offline training job
//!
//! Validates a labeled book table, splits it into a training part and a
//! seeded hold-out part, fits the pipeline on the former and reports
//! hold-out metrics at the report threshold. Persisting the result is the
//! caller's business (see [`crate::artifact`]).

use crate::classifier::FitReport;
use crate::data::schema::{self, BOOK_NAME, LABEL, TRAINING_COLUMNS};
use crate::data::table::Table;
use crate::decision::{evaluate_at, EvaluationReport, Threshold};
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PipelineConfig};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Training configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Hold-out fraction in [0, 1)
    pub test_size: f64,
    /// Seed for the shuffle split
    pub seed: u64,
    /// Threshold for the hold-out report
    pub report_threshold: Threshold,
    pub pipeline: PipelineConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            report_threshold: Threshold::REPORT,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Training result
#[derive(Debug, Clone)]
pub struct TrainResult {
    pub pipeline: Pipeline,
    pub fit_report: FitReport,
    /// `None` when `test_size` leaves no hold-out rows
    pub holdout: Option<EvaluationReport>,
    pub n_train: usize,
    pub n_test: usize,
    /// Rows skipped for lacking a label
    pub n_dropped: usize,
}

/// Train the pipeline on a labeled table
pub fn train(table: &Table, config: &TrainConfig) -> Result<TrainResult> {
    if !(0.0..1.0).contains(&config.test_size) {
        return Err(Error::config(format!(
            "test_size {} is outside [0, 1)",
            config.test_size
        )));
    }
    schema::require_columns(table, TRAINING_COLUMNS)?;

    let labels = schema::binary_labels(table)?;
    let labeled: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.map(|_| i))
        .collect();
    let n_dropped = table.n_rows() - labeled.len();
    if n_dropped > 0 {
        warn!("Dropped {} rows without a '{}' value", n_dropped, LABEL);
    }
    if labeled.is_empty() {
        return Err(Error::config("no labeled rows to train on"));
    }

    let (train_rows, test_rows) = split(&labeled, config.test_size, config.seed);
    info!(
        "Training on {} rows, holding out {} (seed {})",
        train_rows.len(),
        test_rows.len(),
        config.seed
    );

    let features = table.drop_columns(&[LABEL, BOOK_NAME]);
    let label_at = |rows: &[usize]| -> Vec<u8> {
        rows.iter().filter_map(|&r| labels[r]).collect()
    };

    let mut pipeline = Pipeline::new(&config.pipeline);
    let fit_report = pipeline.fit(&features.select_rows(&train_rows), &label_at(&train_rows))?;

    let holdout = if test_rows.is_empty() {
        debug!("No hold-out rows; skipping evaluation");
        None
    } else {
        let probabilities = pipeline.predict_proba(&features.select_rows(&test_rows))?;
        let report = evaluate_at(&label_at(&test_rows), &probabilities, config.report_threshold)?;
        info!(
            "Hold-out at {}: recall {:.3}, precision {:.3}, f1 {:.3}",
            config.report_threshold, report.recall, report.precision, report.f1
        );
        Some(report)
    };

    Ok(TrainResult {
        pipeline,
        fit_report,
        holdout,
        n_train: train_rows.len(),
        n_test: test_rows.len(),
        n_dropped,
    })
}

/// Shuffle `rows` with a seeded ChaCha stream and cut off
/// `ceil(n * test_size)` rows as the hold-out part.
fn split(rows: &[usize], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut shuffled = rows.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let n_test = ((rows.len() as f64) * test_size).ceil() as usize;
    let n_test = n_test.min(rows.len().saturating_sub(1));
    let train = shuffled.split_off(n_test);
    (train, shuffled)
}
