//! bookcast - film adaptation prediction for newly published books
//!
//! A logistic model over book-market features (publication year, author
//! reputation, ratings, sales, language, genre, publisher), scored at a
//! decision threshold chosen per call.
//!
//! ```text
//! record ─> pipeline (normalize, collapse, scale, one-hot) ─> classifier
//!        ─> probability ─> decision (threshold) ─> label + metrics
//! ```

pub mod artifact;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod data;
pub mod decision;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod service;
pub mod training;

pub use error::{ConvergenceWarning, Error, Result};
