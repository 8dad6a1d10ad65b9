//! Precision-recall curve
//!
//! Points are produced lazily, one per distinct predicted probability, in
//! descending probability order. Each point describes the decision rule
//! `p >= threshold`, so recall never decreases along the iteration.

use super::metrics::validate_inputs;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub threshold: f64,
    pub recall: f64,
    pub precision: f64,
}

/// Scored rows sorted once; iterate with [`points`](Self::points) as many
/// times as needed.
#[derive(Debug, Clone)]
pub struct PrecisionRecallCurve {
    scored: Vec<(f64, u8)>,
    positives: usize,
}

impl PrecisionRecallCurve {
    pub fn new(labels_true: &[u8], probabilities: &[f64]) -> Result<Self> {
        validate_inputs(labels_true, labels_true, Some(probabilities))?;

        let mut scored: Vec<(f64, u8)> = probabilities
            .iter()
            .copied()
            .zip(labels_true.iter().copied())
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let positives = labels_true.iter().filter(|&&l| l == 1).count();

        Ok(Self { scored, positives })
    }

    pub fn points(&self) -> CurvePoints<'_> {
        CurvePoints {
            scored: &self.scored,
            positives: self.positives,
            cursor: 0,
            true_positives: 0,
            false_positives: 0,
        }
    }

    /// Number of distinct thresholds
    pub fn len(&self) -> usize {
        self.points().count()
    }

    pub fn is_empty(&self) -> bool {
        self.scored.is_empty()
    }
}

impl<'a> IntoIterator for &'a PrecisionRecallCurve {
    type Item = CurvePoint;
    type IntoIter = CurvePoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.points()
    }
}

#[derive(Debug, Clone)]
pub struct CurvePoints<'a> {
    scored: &'a [(f64, u8)],
    positives: usize,
    cursor: usize,
    true_positives: usize,
    false_positives: usize,
}

impl Iterator for CurvePoints<'_> {
    type Item = CurvePoint;

    fn next(&mut self) -> Option<CurvePoint> {
        let threshold = self.scored.get(self.cursor)?.0;
        while let Some(&(p, label)) = self.scored.get(self.cursor) {
            if p != threshold {
                break;
            }
            if label == 1 {
                self.true_positives += 1;
            } else {
                self.false_positives += 1;
            }
            self.cursor += 1;
        }

        let predicted = self.true_positives + self.false_positives;
        Some(CurvePoint {
            threshold,
            recall: ratio(self.true_positives, self.positives),
            precision: ratio(self.true_positives, predicted),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.scored.len() - self.cursor;
        (usize::from(remaining > 0), Some(remaining))
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_points_per_distinct_probability() {
        let labels = [1, 0, 1, 0, 1];
        let probs = [0.9, 0.8, 0.8, 0.3, 0.1];
        let curve = PrecisionRecallCurve::new(&labels, &probs).unwrap();
        let points: Vec<CurvePoint> = curve.points().collect();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].threshold, 0.9);
        assert_eq!(points[0].recall, 1.0 / 3.0);
        assert_eq!(points[0].precision, 1.0);

        // tie at 0.8 admits both rows at once
        assert_eq!(points[1].threshold, 0.8);
        assert_eq!(points[1].recall, 2.0 / 3.0);
        assert_eq!(points[1].precision, 2.0 / 3.0);

        assert_eq!(points[3].threshold, 0.1);
        assert_eq!(points[3].recall, 1.0);
        assert_eq!(points[3].precision, 0.6);
    }

    #[test]
    fn test_recall_is_monotonic_and_restartable() {
        let labels = [0, 1, 1, 0, 1, 0, 0, 1];
        let probs = [0.15, 0.7, 0.45, 0.6, 0.95, 0.05, 0.3, 0.45];
        let curve = PrecisionRecallCurve::new(&labels, &probs).unwrap();

        let first: Vec<CurvePoint> = curve.points().collect();
        for pair in first.windows(2) {
            assert!(pair[1].recall >= pair[0].recall);
            assert!(pair[1].threshold < pair[0].threshold);
        }

        let again: Vec<CurvePoint> = (&curve).into_iter().collect();
        assert_eq!(first, again);
        assert_eq!(curve.len(), 7);
    }

    #[test]
    fn test_empty_and_no_positives() {
        let empty = PrecisionRecallCurve::new(&[], &[]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.points().next(), None);

        let negatives = PrecisionRecallCurve::new(&[0, 0], &[0.4, 0.2]).unwrap();
        assert!(negatives.points().all(|p| p.recall == 0.0 && p.precision == 0.0));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        assert!(matches!(
            PrecisionRecallCurve::new(&[1, 0], &[0.5]),
            Err(Error::Config(_))
        ));
    }
}
