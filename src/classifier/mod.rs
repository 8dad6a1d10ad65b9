//! Binary classifier for film adaptations
//!
//! A linear model: features → logistic regression → probability of the
//! positive class. Turning probabilities into labels is the job of
//! [`crate::decision`].

pub mod model;

pub use model::{FitReport, LogisticConfig, LogisticRegression};
