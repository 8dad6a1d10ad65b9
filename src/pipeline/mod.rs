//! Preprocessing + classification pipeline
//!
//! An explicit, ordered list of table stages (author-rating encoding, then
//! rare-category collapsing) feeds a column encoder (standardized numeric
//! block followed by one-hot blocks) and the logistic classifier. Each
//! stage owns its learned parameters; the pipeline owns all of them and
//! tracks its fit state:
//!
//! ```text
//! Unfit ──fit()──> Fitting ──ok──> Fitted
//!                     └──err──> (previous state restored)
//! ```
//!
//! `transform` and `predict_proba` are only valid in `Fitted`.

pub mod collapse;
pub mod normalizer;
pub mod onehot;
pub mod scaler;

pub use collapse::{RareCategoryCollapser, OTHER_BUCKET};
pub use normalizer::AuthorRatingEncoder;
pub use onehot::OneHotEncoder;
pub use scaler::StandardScaler;

use crate::classifier::{FitReport, LogisticConfig, LogisticRegression};
use crate::data::schema::{self, CATEGORICAL_FEATURES, COLLAPSED_FEATURES, NUMERIC_FEATURES};
use crate::data::table::Table;
use crate::error::{Error, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of publishers/authors kept before collapsing
pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Unfit,
    Fitting,
    Fitted,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Unfit => write!(f, "unfit"),
            PipelineState::Fitting => write!(f, "fitting"),
            PipelineState::Fitted => write!(f, "fitted"),
        }
    }
}

/// A table-to-table preprocessing stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    AuthorRating(AuthorRatingEncoder),
    Collapse(RareCategoryCollapser),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::AuthorRating(_) => "author_rating",
            Stage::Collapse(_) => "collapse_rare",
        }
    }

    fn fit(&mut self, table: &Table) -> Result<()> {
        match self {
            Stage::AuthorRating(_) => Ok(()),
            Stage::Collapse(stage) => stage.fit(table),
        }
    }

    fn transform(&self, table: &Table) -> Result<Table> {
        match self {
            Stage::AuthorRating(stage) => stage.transform(table),
            Stage::Collapse(stage) => stage.transform(table),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Most frequent publishers/authors kept as their own category
    pub top_k: usize,
    pub classifier: LogisticConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            classifier: LogisticConfig::default(),
        }
    }
}

/// The full model: preprocessing parameters plus classifier weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    state: PipelineState,
    stages: Vec<Stage>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    classifier: LogisticRegression,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            state: PipelineState::Unfit,
            stages: vec![
                Stage::AuthorRating(AuthorRatingEncoder::new()),
                Stage::Collapse(RareCategoryCollapser::new(COLLAPSED_FEATURES, config.top_k)),
            ],
            scaler: StandardScaler::new(NUMERIC_FEATURES),
            encoder: OneHotEncoder::new(CATEGORICAL_FEATURES),
            classifier: LogisticRegression::new(config.classifier),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_fitted(&self) -> bool {
        self.state == PipelineState::Fitted
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Learn every stage's parameters and the classifier from training
    /// data. On failure the pipeline is restored to its state before the
    /// call.
    pub fn fit(&mut self, table: &Table, labels: &[u8]) -> Result<FitReport> {
        let snapshot = self.clone();
        self.state = PipelineState::Fitting;
        match self.fit_inner(table, labels) {
            Ok(report) => {
                self.state = PipelineState::Fitted;
                info!(
                    "Fitted pipeline on {} rows ({} features, {} iterations)",
                    table.n_rows(),
                    self.feature_names().len(),
                    report.iterations
                );
                Ok(report)
            }
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    fn fit_inner(&mut self, table: &Table, labels: &[u8]) -> Result<FitReport> {
        schema::require_columns(table, schema::FEATURE_COLUMNS)?;

        let mut prepared = table.clone();
        for stage in &mut self.stages {
            stage.fit(&prepared)?;
            prepared = stage.transform(&prepared)?;
            debug!("Stage '{}' fitted", stage.name());
        }

        self.scaler.fit(&prepared)?;
        self.encoder.fit(&prepared)?;
        let matrix = self.encode(&prepared)?;
        self.classifier.fit(&matrix, labels)
    }

    /// Feature matrix for `table` using the frozen parameters
    pub fn transform(&self, table: &Table) -> Result<DMatrix<f64>> {
        if !self.is_fitted() {
            return Err(Error::Pipeline(format!(
                "transform called on a pipeline in state '{}'",
                self.state
            )));
        }
        schema::require_columns(table, schema::FEATURE_COLUMNS)?;

        let mut prepared = table.clone();
        for stage in &self.stages {
            prepared = stage.transform(&prepared)?;
        }
        self.encode(&prepared)
    }

    /// Probability of a film adaptation for every row of `table`
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<f64>> {
        let matrix = self.transform(table)?;
        self.classifier.predict_proba(&matrix)
    }

    /// Column names of the feature matrix, in order
    pub fn feature_names(&self) -> Vec<String> {
        self.scaler
            .columns()
            .iter()
            .map(|c| format!("num__{}", c))
            .chain(
                self.encoder
                    .feature_names()
                    .into_iter()
                    .map(|c| format!("cat__{}", c)),
            )
            .collect()
    }

    fn encode(&self, prepared: &Table) -> Result<DMatrix<f64>> {
        let numeric = self.scaler.transform(prepared)?;
        let categorical = self.encoder.transform(prepared)?;
        let n_numeric = self.scaler.columns().len();
        let width = n_numeric + self.encoder.width();

        Ok(DMatrix::from_fn(prepared.n_rows(), width, |i, j| {
            if j < n_numeric {
                numeric[i][j]
            } else {
                categorical[i][j - n_numeric]
            }
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::table::{Column, Record};
    use crate::data::schema::*;

    /// Small labeled book table: famous/excellent authors with big sales
    /// get adapted, novices do not.
    pub(crate) fn training_table() -> (Table, Vec<u8>) {
        let rows: &[(i64, &str, &str, f64, f64, f64, &str, &str, &str, u8)] = &[
            (2001, "Ann", "Famous", 4.3, 9000.0, 900000.0, "en", "Fantasy", "Tor", 1),
            (2003, "Ben", "Excellent", 4.1, 12000.0, 1200000.0, "en", "Thriller", "Penguin", 1),
            (2010, "Cid", "Novice", 3.2, 150.0, 9000.0, "fr", "Romance", "Small", 0),
            (2012, "Dee", "Novice", 3.5, 90.0, 4000.0, "en", "Romance", "Tiny", 0),
            (1999, "Ann", "Famous", 4.0, 7000.0, 750000.0, "en", "Fantasy", "Tor", 1),
            (2015, "Eve", "Intermediate", 3.8, 800.0, 30000.0, "de", "Mystery", "Penguin", 0),
            (2005, "Fay", "Excellent", 4.4, 15000.0, 2000000.0, "en", "Thriller", "Tor", 1),
            (2018, "Gus", "Novice", 2.9, 40.0, 1500.0, "es", "Horror", "Small", 0),
        ];

        let records: Vec<Record> = rows
            .iter()
            .map(|r| {
                Record::new()
                    .with(PUBLISHING_YEAR, r.0)
                    .with(AUTHOR, r.1)
                    .with(AUTHOR_RATING, r.2)
                    .with(AVERAGE_RATING, r.3)
                    .with(RATING_COUNT, r.4)
                    .with(GROSS_SALES, r.5)
                    .with(LANGUAGE_CODE, r.6)
                    .with(GENRE, r.7)
                    .with(PUBLISHER, r.8)
            })
            .collect();
        let labels = rows.iter().map(|r| r.9).collect();
        (Table::from_records(&records), labels)
    }

    pub(crate) fn fitted() -> Pipeline {
        let (table, labels) = training_table();
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        pipeline.fit(&table, &labels).unwrap();
        pipeline
    }

    #[test]
    fn test_state_machine() {
        let (table, labels) = training_table();
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        assert_eq!(pipeline.state(), PipelineState::Unfit);
        assert!(matches!(pipeline.transform(&table), Err(Error::Pipeline(_))));

        pipeline.fit(&table, &labels).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Fitted);
        assert!(pipeline.transform(&table).is_ok());
    }

    #[test]
    fn test_failed_fit_restores_state() {
        let (table, _) = training_table();
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        let err = pipeline.fit(&table, &[1; 8]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(pipeline.state(), PipelineState::Unfit);
        assert_eq!(pipeline, Pipeline::new(&PipelineConfig::default()));
    }

    #[test]
    fn test_fit_requires_feature_columns() {
        let (table, labels) = training_table();
        let table = table.drop_columns(&[GENRE]);
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        assert!(matches!(
            pipeline.fit(&table, &labels),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_matrix_layout_is_stable() {
        let pipeline = fitted();
        let (table, _) = training_table();
        let names = pipeline.feature_names();
        assert_eq!(names[0], "num__Publishing_Year");
        assert_eq!(names[1], "num__Author_Rating");
        assert_eq!(names[5], "cat__Language_Code_de");

        let full = pipeline.transform(&table).unwrap();
        let single = pipeline.transform(&table.select_rows(&[3])).unwrap();
        assert_eq!(full.ncols(), names.len());
        assert_eq!(single.ncols(), names.len());
        assert_eq!(single.row(0), full.row(3));
    }

    #[test]
    fn test_unseen_categories_encode_as_zero() {
        let pipeline = fitted();
        let record = Record::new()
            .with(PUBLISHING_YEAR, 2024i64)
            .with(AUTHOR, "Nobody Known")
            .with(AUTHOR_RATING, "Legendary")
            .with(AVERAGE_RATING, 4.0)
            .with(RATING_COUNT, 10.0)
            .with(GROSS_SALES, 100.0)
            .with(LANGUAGE_CODE, "xx")
            .with(GENRE, "Western")
            .with(PUBLISHER, "Nowhere Press");
        let table = Table::from_records(&[record]);
        let matrix = pipeline.transform(&table).unwrap();
        let names = pipeline.feature_names();

        // fewer than top_k publishers in training, so no `other` indicator exists
        assert!(!names.iter().any(|n| n == "cat__Publisher_other"));
        for (j, name) in names.iter().enumerate() {
            if name.starts_with("cat__") {
                assert_eq!(matrix[(0, j)], 0.0, "{name}");
            }
        }
        // unknown author rating imputed with the training mean
        assert_eq!(matrix[(0, 1)], 0.0);

        let proba = pipeline.predict_proba(&table).unwrap();
        assert!(proba[0] > 0.0 && proba[0] < 1.0);
    }

    #[test]
    fn test_directional_sanity() {
        let pipeline = fitted();
        let (table, labels) = training_table();
        let proba = pipeline.predict_proba(&table).unwrap();
        for (p, label) in proba.iter().zip(&labels) {
            if *label == 1 {
                assert!(*p > 0.5, "positive row scored {p}");
            } else {
                assert!(*p < 0.5, "negative row scored {p}");
            }
        }
    }

    #[test]
    fn test_reputation_drives_scores_on_balanced_two_level_data() {
        // Only Novice and Excellent authors, half adapted; one exception
        // on each side so the classes overlap.
        let rows: &[(&str, u8)] = &[
            ("Excellent", 1),
            ("Excellent", 1),
            ("Excellent", 1),
            ("Excellent", 1),
            ("Excellent", 1),
            ("Excellent", 0),
            ("Novice", 0),
            ("Novice", 0),
            ("Novice", 0),
            ("Novice", 0),
            ("Novice", 0),
            ("Novice", 1),
        ];
        let records: Vec<Record> = rows
            .iter()
            .enumerate()
            .map(|(i, (rating, _))| {
                Record::new()
                    .with(PUBLISHING_YEAR, 2000 + (i % 3) as i64)
                    .with(AUTHOR, "Same Author")
                    .with(AUTHOR_RATING, *rating)
                    .with(AVERAGE_RATING, 4.0)
                    .with(RATING_COUNT, 100.0)
                    .with(GROSS_SALES, 1000.0)
                    .with(LANGUAGE_CODE, "en")
                    .with(GENRE, if i % 2 == 0 { "Fantasy" } else { "Romance" })
                    .with(PUBLISHER, "Press")
            })
            .collect();
        let labels: Vec<u8> = rows.iter().map(|r| r.1).collect();
        assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 6);

        let table = Table::from_records(&records);
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        pipeline.fit(&table, &labels).unwrap();
        let proba = pipeline.predict_proba(&table).unwrap();

        let above = |want: u8| {
            proba
                .iter()
                .zip(&labels)
                .filter(|&(p, &l)| l == want && *p > 0.5)
                .count()
        };
        assert!(
            above(1) > above(0),
            "adapted rows above 0.5: {}, not adapted: {}",
            above(1),
            above(0)
        );
    }

    #[test]
    fn test_numeric_author_rating_input_is_accepted() {
        let pipeline = fitted();
        let (table, _) = training_table();
        let normalized = AuthorRatingEncoder::new().transform(&table).unwrap();
        assert_eq!(
            pipeline.predict_proba(&table).unwrap(),
            pipeline.predict_proba(&normalized).unwrap()
        );
        assert!(matches!(
            normalized.column(AUTHOR_RATING),
            Some(Column::Numeric(_))
        ));
    }
}
