//! Project-level configuration support
//!
//! Loads per-project configuration from `bookcast.toml` or
//! `.bookcastrc.json` in the working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # bookcast.toml
//!
//! [training]
//! test_size = 0.2
//! seed = 42
//! report_threshold = 0.4
//! top_k = 10
//!
//! [scoring]
//! threshold = 0.5
//! model_path = "models/adaptation_model.bin"
//!
//! [data]
//! delimiter = ";"
//! reconcile_author_ratings = "max"
//! ```

use crate::artifact::default_model_path;
use crate::classifier::LogisticConfig;
use crate::data::{LoadOptions, ReconcilePolicy};
use crate::decision::Threshold;
use crate::error::{Error, Result};
use crate::pipeline::{PipelineConfig, DEFAULT_TOP_K};
use crate::training::TrainConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "bookcast.toml";
pub const JSON_CONFIG_FILE: &str = ".bookcastrc.json";

/// Project-level configuration loaded from bookcast.toml or similar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Offline training knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Hold-out fraction
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Threshold for the hold-out report printed after training
    #[serde(default = "default_report_threshold")]
    pub report_threshold: f64,

    /// Publishers/authors kept before collapsing into `other`
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Inverse regularization strength
    #[serde(default = "default_c")]
    pub c: f64,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    #[serde(default = "default_tol")]
    pub tol: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            report_threshold: default_report_threshold(),
            top_k: default_top_k(),
            c: default_c(),
            max_iter: default_max_iter(),
            tol: default_tol(),
        }
    }
}

fn default_test_size() -> f64 {
    0.2
}
fn default_seed() -> u64 {
    42
}
fn default_report_threshold() -> f64 {
    Threshold::REPORT.value()
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_c() -> f64 {
    LogisticConfig::default().c
}
fn default_max_iter() -> usize {
    LogisticConfig::default().max_iter
}
fn default_tol() -> f64 {
    LogisticConfig::default().tol
}

impl TrainingConfig {
    /// Validated settings for [`crate::training::train`]
    pub fn to_train_config(&self) -> Result<TrainConfig> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::config(format!("c must be positive, got {}", self.c)));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(Error::config(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        if self.top_k == 0 {
            return Err(Error::config("top_k must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(Error::config(format!(
                "test_size {} is outside [0, 1)",
                self.test_size
            )));
        }

        Ok(TrainConfig {
            test_size: self.test_size,
            seed: self.seed,
            report_threshold: Threshold::new(self.report_threshold)?,
            pipeline: PipelineConfig {
                top_k: self.top_k,
                classifier: LogisticConfig {
                    c: self.c,
                    max_iter: self.max_iter,
                    tol: self.tol,
                },
            },
        })
    }
}

/// Inference defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Default decision threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Model artifact location (default: the user data directory)
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            model_path: None,
        }
    }
}

fn default_threshold() -> f64 {
    Threshold::DEFAULT.value()
}

impl ScoringConfig {
    pub fn threshold(&self) -> Result<Threshold> {
        Threshold::new(self.threshold)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path.clone().unwrap_or_else(default_model_path)
    }
}

/// Input file handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Field delimiter, a single ASCII character
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Upstream author-rating reconciliation
    #[serde(default)]
    pub reconcile_author_ratings: ReconcilePolicy,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            reconcile_author_ratings: ReconcilePolicy::default(),
        }
    }
}

fn default_delimiter() -> String {
    ";".to_string()
}

impl DataConfig {
    pub fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            delimiter: parse_delimiter(&self.delimiter)?,
        })
    }
}

/// `"\t"` and `"tab"` both mean a tab
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    let normalized = match raw {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match normalized.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(Error::config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            raw
        ))),
    }
}

/// Load project configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `bookcast.toml`
/// 2. `.bookcastrc.json`
///
/// Returns default configuration if no config file is found or the file
/// does not parse.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    let toml_path = dir.join(CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load an explicitly named config file; unlike [`load_project_config`]
/// a bad file is an error.
pub fn load_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json_config(path),
        _ => load_toml_config(path),
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Commented starting point written by `bookcast init`
pub const EXAMPLE_CONFIG: &str = r#"# bookcast configuration

[training]
# Fraction of labeled rows held out for evaluation
test_size = 0.2
seed = 42
# Threshold used for the hold-out report after training
report_threshold = 0.4
# Publishers/authors kept as their own category; the rest become "other"
top_k = 10
# Logistic regression: inverse regularization, iteration cap, tolerance
c = 1.0
max_iter = 1000
tol = 0.0001

[scoring]
# Default decision threshold for predict/evaluate
threshold = 0.5
# model_path = "adaptation_model.bin"

[data]
delimiter = ";"
# Resolve authors whose rows disagree on Author_Rating (off, max, first)
reconcile_author_ratings = "off"
"#;
