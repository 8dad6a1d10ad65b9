//! Decision threshold
//!
//! A probability at or above the threshold is a predicted adaptation.
//! The threshold is a per-call parameter, never stored with the model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Dashboard default
    pub const DEFAULT: Threshold = Threshold(0.5);
    /// Cutoff used for the hold-out report after training
    pub const REPORT: Threshold = Threshold(0.4);

    /// Fails with a configuration error outside [0, 1] (or NaN)
    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::config(format!(
                "threshold {} is outside [0, 1]",
                value
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `true` when `probability >= threshold`
    pub fn decide(self, probability: f64) -> bool {
        probability >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Threshold {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(t: Threshold) -> f64 {
        t.0
    }
}

impl std::str::FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", s))?;
        Threshold::new(value).map_err(|e| e.to_string())
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Binary label per probability: 1 iff `p >= threshold`
pub fn decide(probabilities: &[f64], threshold: Threshold) -> Vec<u8> {
    probabilities
        .iter()
        .map(|&p| u8::from(threshold.decide(p)))
        .collect()
}
