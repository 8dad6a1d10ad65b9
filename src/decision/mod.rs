//! Threshold-based decisions and their metrics
//!
//! Probabilities come from the model; the threshold is chosen per call.
//! Every metric here is a pure function of (labels, probabilities,
//! threshold), so moving the threshold only means calling again.

pub mod curve;
pub mod metrics;
pub mod threshold;

pub use curve::{CurvePoint, CurvePoints, PrecisionRecallCurve};
pub use metrics::{
    evaluate, evaluate_at, roc_auc, sweep, ClassMetrics, ConfusionMatrix, EvaluationReport,
    ThresholdMetrics,
};
pub use threshold::{decide, Threshold};
