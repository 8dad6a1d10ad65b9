//! Classification metrics at a fixed threshold
//!
//! All ratios are 0.0 when their denominator is zero. ROC-AUC is computed
//! from average ranks (Mann-Whitney U) and is `None` when only one class
//! is present.

use super::curve::{CurvePoint, PrecisionRecallCurve};
use super::threshold::{decide, Threshold};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 2x2 counts; rows are actual class, columns predicted class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(labels_true: &[u8], labels_pred: &[u8]) -> Result<Self> {
        validate_inputs(labels_true, labels_pred, None)?;
        let mut cm = Self::default();
        for (&actual, &predicted) in labels_true.iter().zip(labels_pred) {
            match (actual, predicted) {
                (0, 0) => cm.true_negatives += 1,
                (0, _) => cm.false_positives += 1,
                (_, 0) => cm.false_negatives += 1,
                _ => cm.true_positives += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// `[[tn, fp], [fn, tp]]`
    pub fn as_array(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn f1(&self) -> f64 {
        harmonic(self.precision(), self.recall())
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Precision/recall/F1/support for class 0 then class 1
    pub fn per_class(&self) -> [ClassMetrics; 2] {
        let negative_precision = ratio(
            self.true_negatives,
            self.true_negatives + self.false_negatives,
        );
        let negative_recall = ratio(
            self.true_negatives,
            self.true_negatives + self.false_positives,
        );
        [
            ClassMetrics {
                label: 0,
                precision: negative_precision,
                recall: negative_recall,
                f1: harmonic(negative_precision, negative_recall),
                support: self.true_negatives + self.false_positives,
            },
            ClassMetrics {
                label: 1,
                precision: self.precision(),
                recall: self.recall(),
                f1: self.f1(),
                support: self.true_positives + self.false_negatives,
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Everything reported for one set of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Set when the predictions came from [`evaluate_at`]
    pub threshold: Option<f64>,
    pub n_rows: usize,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
    pub confusion_matrix: ConfusionMatrix,
    pub per_class: [ClassMetrics; 2],
    pub pr_curve: Vec<CurvePoint>,
}

/// Score precomputed labels against the truth. `probabilities` drive
/// ROC-AUC and the PR curve.
pub fn evaluate(
    labels_true: &[u8],
    labels_pred: &[u8],
    probabilities: &[f64],
) -> Result<EvaluationReport> {
    validate_inputs(labels_true, labels_pred, Some(probabilities))?;
    let confusion_matrix = ConfusionMatrix::from_labels(labels_true, labels_pred)?;
    let curve = PrecisionRecallCurve::new(labels_true, probabilities)?;

    Ok(EvaluationReport {
        threshold: None,
        n_rows: labels_true.len(),
        recall: confusion_matrix.recall(),
        precision: confusion_matrix.precision(),
        f1: confusion_matrix.f1(),
        accuracy: confusion_matrix.accuracy(),
        roc_auc: roc_auc(labels_true, probabilities)?,
        confusion_matrix,
        per_class: confusion_matrix.per_class(),
        pr_curve: curve.points().collect(),
    })
}

/// [`decide`] then [`evaluate`]
pub fn evaluate_at(
    labels_true: &[u8],
    probabilities: &[f64],
    threshold: Threshold,
) -> Result<EvaluationReport> {
    let labels_pred = decide(probabilities, threshold);
    let mut report = evaluate(labels_true, &labels_pred, probabilities)?;
    report.threshold = Some(threshold.value());
    Ok(report)
}

/// Area under the ROC curve; `None` without both classes
pub fn roc_auc(labels_true: &[u8], probabilities: &[f64]) -> Result<Option<f64>> {
    validate_inputs(labels_true, labels_true, Some(probabilities))?;
    let positives = labels_true.iter().filter(|&&l| l == 1).count();
    let negatives = labels_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return Ok(None);
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    // 1-based ranks, ties share their average rank
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && probabilities[order[end]] == probabilities[order[start]] {
            end += 1;
        }
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end]
            .iter()
            .filter(|&&i| labels_true[i] == 1)
            .count();
        positive_rank_sum += average_rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Ok(Some(u / (p * negatives as f64)))
}

/// Metrics at one threshold of a [`sweep`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMetrics {
    pub threshold: f64,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub accuracy: f64,
    pub confusion_matrix: ConfusionMatrix,
}

/// Re-decide the same probabilities at several thresholds
pub fn sweep(
    labels_true: &[u8],
    probabilities: &[f64],
    thresholds: &[Threshold],
) -> Result<Vec<ThresholdMetrics>> {
    validate_inputs(labels_true, labels_true, Some(probabilities))?;
    thresholds
        .iter()
        .map(|&threshold| {
            let cm = ConfusionMatrix::from_labels(labels_true, &decide(probabilities, threshold))?;
            Ok(ThresholdMetrics {
                threshold: threshold.value(),
                recall: cm.recall(),
                precision: cm.precision(),
                f1: cm.f1(),
                accuracy: cm.accuracy(),
                confusion_matrix: cm,
            })
        })
        .collect()
}

/// Lengths agree, labels are 0/1, probabilities lie in [0, 1]
pub(crate) fn validate_inputs(
    labels_true: &[u8],
    labels_pred: &[u8],
    probabilities: Option<&[f64]>,
) -> Result<()> {
    if labels_true.len() != labels_pred.len() {
        return Err(Error::config(format!(
            "{} true labels but {} predicted labels",
            labels_true.len(),
            labels_pred.len()
        )));
    }
    if labels_true.iter().chain(labels_pred).any(|&l| l > 1) {
        return Err(Error::config("labels must be 0 or 1"));
    }
    let Some(probabilities) = probabilities else {
        return Ok(());
    };
    if probabilities.len() != labels_true.len() {
        return Err(Error::config(format!(
            "{} labels but {} probabilities",
            labels_true.len(),
            probabilities.len()
        )));
    }
    if let Some(bad) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(Error::config(format!(
            "probability {} is outside [0, 1]",
            bad
        )));
    }
    Ok(())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        2.0 * a * b / (a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [u8; 8] = [0, 1, 1, 0, 1, 0, 0, 1];
    const PROBS: [f64; 8] = [0.15, 0.7, 0.45, 0.6, 0.95, 0.05, 0.3, 0.35];

    #[test]
    fn test_confusion_matrix_counts() {
        let pred = decide(&PROBS, Threshold::new(0.4).unwrap());
        let cm = ConfusionMatrix::from_labels(&LABELS, &pred).unwrap();
        assert_eq!(cm.as_array(), [[3, 1], [1, 3]]);
        assert_eq!(cm.total(), LABELS.len());
        assert_eq!(cm.recall(), 0.75);
        assert_eq!(cm.precision(), 0.75);
        assert_eq!(cm.accuracy(), 0.75);
        assert!((cm.f1() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominators() {
        // nothing predicted positive, no actual positives
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 0]).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
        assert_eq!(cm.accuracy(), 1.0);

        let empty = ConfusionMatrix::from_labels(&[], &[]).unwrap();
        assert_eq!(empty.accuracy(), 0.0);
    }

    #[test]
    fn test_roc_auc() {
        // perfectly ranked
        assert_eq!(
            roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]).unwrap(),
            Some(1.0)
        );
        // inverted
        assert_eq!(
            roc_auc(&[1, 1, 0, 0], &[0.1, 0.2, 0.8, 0.9]).unwrap(),
            Some(0.0)
        );
        // all tied counts half
        assert_eq!(roc_auc(&[0, 1, 0, 1], &[0.5; 4]).unwrap(), Some(0.5));
        // one positive ranked below one of two negatives
        assert_eq!(roc_auc(&[0, 1, 0], &[0.1, 0.5, 0.9]).unwrap(), Some(0.5));
    }

    #[test]
    fn test_roc_auc_single_class_is_none() {
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.9]).unwrap(), None);
        assert_eq!(roc_auc(&[], &[]).unwrap(), None);
    }

    #[test]
    fn test_evaluate_at_threshold() {
        let report = evaluate_at(&LABELS, &PROBS, Threshold::new(0.4).unwrap()).unwrap();
        assert_eq!(report.threshold, Some(0.4));
        assert_eq!(report.n_rows, 8);
        assert_eq!(report.recall, 0.75);
        assert_eq!(report.per_class[0].support, 4);
        assert_eq!(report.per_class[1].support, 4);
        assert_eq!(report.per_class[0].recall, 0.75);
        assert!(report.roc_auc.unwrap() > 0.8);
        assert_eq!(report.pr_curve.len(), 8);
    }

    #[test]
    fn test_sweep_precision_rises_with_threshold() {
        // Positives grow denser as the score rises
        let probs: Vec<f64> = (0..20).map(|i| (f64::from(i) + 0.5) / 20.0).collect();
        let labels = [0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1];
        let thresholds: Vec<Threshold> = (1..=9)
            .map(|i| Threshold::new(f64::from(i) / 10.0).unwrap())
            .collect();
        let rows = sweep(&labels, &probs, &thresholds).unwrap();

        for pair in rows.windows(2) {
            assert!(
                pair[0].precision <= pair[1].precision,
                "precision fell from {} to {} between {} and {}",
                pair[0].precision,
                pair[1].precision,
                pair[0].threshold,
                pair[1].threshold
            );
            assert!(pair[0].recall >= pair[1].recall);
        }
        assert_eq!(rows[0].recall, 1.0);
        assert_eq!(rows[8].precision, 1.0);
    }

    #[test]
    fn test_sweep_recall_monotonic_and_boundaries() {
        let thresholds: Vec<Threshold> = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0]
            .iter()
            .map(|&t| Threshold::new(t).unwrap())
            .collect();
        let rows = sweep(&LABELS, &PROBS, &thresholds).unwrap();

        for pair in rows.windows(2) {
            assert!(pair[0].recall >= pair[1].recall);
        }
        for row in &rows {
            assert_eq!(row.confusion_matrix.total(), LABELS.len());
        }

        let all_positive = rows[0].confusion_matrix;
        assert_eq!(all_positive.true_negatives + all_positive.false_negatives, 0);
        assert_eq!(rows[0].recall, 1.0);

        let all_negative = rows[5].confusion_matrix;
        assert_eq!(all_negative.true_positives + all_negative.false_positives, 0);
        assert_eq!(rows[5].recall, 0.0);
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            evaluate(&[0, 1], &[0], &[0.1, 0.9]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            evaluate(&[0, 2], &[0, 1], &[0.1, 0.9]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            evaluate(&[0, 1], &[0, 1], &[0.1, f64::NAN]),
            Err(Error::Config(_))
        ));
    }
}
