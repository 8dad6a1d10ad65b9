//! Error taxonomy for the prediction core
//!
//! Every failure is terminal for the call that produced it. Optimizer
//! non-convergence is not an error: see [`ConvergenceWarning`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by loading, fitting, scoring and evaluation
#[derive(Error, Debug)]
pub enum Error {
    /// Bad threshold, malformed options, mismatched inputs
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Missing or malformed columns
    #[error("Schema error: {0}")]
    Schema(String),

    /// No fitted model is available
    #[error("No fitted model loaded: {0}")]
    MissingModel(String),

    /// Pipeline used out of order (e.g. transform before fit)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Failed to read delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model artifact at {path} is unreadable: {message}")]
    Artifact { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Raised (as a value, not an error) when the optimizer hits its iteration cap
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    /// Max absolute gradient component when the optimizer stopped
    pub gradient_norm: f64,
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "optimizer did not converge after {} iterations (max |grad| = {:.3e}); using best-effort weights",
            self.iterations, self.gradient_norm
        )
    }
}
