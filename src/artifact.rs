//! Persisted model artifact
//!
//! A `bitcode` blob holding the fitted [`Pipeline`] plus informational
//! metadata. Floats are stored bit-for-bit, so a loaded model scores
//! exactly like the one that was saved. Writes go to a sibling temp file
//! that is renamed into place.

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::training::{TrainConfig, TrainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Bumped whenever the serialized layout changes
pub const FORMAT_VERSION: u32 = 1;

pub const DEFAULT_MODEL_FILE: &str = "adaptation_model.bin";

/// `<data dir>/bookcast/adaptation_model.bin`
pub fn default_model_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookcast")
        .join(DEFAULT_MODEL_FILE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    pub n_train: usize,
    pub n_test: usize,
    pub iterations: usize,
    pub converged: bool,
    pub seed: u64,
    pub top_k: usize,
    /// Feature matrix columns, in order
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub pipeline: Pipeline,
}

impl ModelArtifact {
    pub fn from_training(result: &TrainResult, config: &TrainConfig) -> Self {
        Self {
            metadata: ModelMetadata {
                format_version: FORMAT_VERSION,
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                trained_at: Utc::now(),
                n_train: result.n_train,
                n_test: result.n_test,
                iterations: result.fit_report.iterations,
                converged: result.fit_report.converged,
                seed: config.seed,
                top_k: config.pipeline.top_k,
                feature_names: result.pipeline.feature_names(),
            },
            pipeline: result.pipeline.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.pipeline.is_fitted() {
            return Err(Error::Pipeline("refusing to save an unfitted pipeline".into()));
        }
        let bytes = bitcode::serialize(self).map_err(|e| Error::Artifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, &bytes)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!("Model saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// A missing file is [`Error::MissingModel`]; a file that does not
    /// decode to a fitted pipeline is [`Error::Artifact`].
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingModel(format!(
                    "no model artifact at {}; run `bookcast train` first",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let artifact: ModelArtifact =
            bitcode::deserialize(&bytes).map_err(|e| Error::Artifact {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if artifact.metadata.format_version != FORMAT_VERSION {
            return Err(Error::Artifact {
                path: path.to_path_buf(),
                message: format!(
                    "format version {} (expected {})",
                    artifact.metadata.format_version, FORMAT_VERSION
                ),
            });
        }
        if !artifact.pipeline.is_fitted() {
            return Err(Error::Artifact {
                path: path.to_path_buf(),
                message: "pipeline is not fitted".into(),
            });
        }
        debug!(
            "Loaded model trained at {} ({} features)",
            artifact.metadata.trained_at,
            artifact.metadata.feature_names.len()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;

    fn artifact() -> ModelArtifact {
        let pipeline = crate::pipeline::tests::fitted();
        ModelArtifact {
            metadata: ModelMetadata {
                format_version: FORMAT_VERSION,
                crate_version: "test".into(),
                trained_at: Utc::now(),
                n_train: 8,
                n_test: 0,
                iterations: 7,
                converged: true,
                seed: 42,
                top_k: 10,
                feature_names: pipeline.feature_names(),
            },
            pipeline,
        }
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        let original = artifact();
        original.save(&path).unwrap();
        assert!(!dir.path().join("nested").join("model.bin.tmp").exists());

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);

        let (table, _) = crate::pipeline::tests::training_table();
        let before = original.pipeline.predict_proba(&table).unwrap();
        let after = loaded.pipeline.predict_proba(&table).unwrap();
        let bits = |v: &[f64]| v.iter().map(|p| p.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&before), bits(&after));
    }

    #[test]
    fn test_missing_file_is_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifact::load(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, Error::MissingModel(_)));
    }

    #[test]
    fn test_garbage_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(Error::Artifact { .. })
        ));
    }

    #[test]
    fn test_unfitted_pipeline_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let mut unfit = artifact();
        unfit.pipeline = Pipeline::new(&PipelineConfig::default());
        assert!(matches!(unfit.save(&path), Err(Error::Pipeline(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_default_path_layout() {
        let path = default_model_path();
        assert!(path.ends_with("bookcast/adaptation_model.bin"));
    }
}
