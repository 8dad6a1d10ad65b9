//! Text (terminal) reporter with colors and formatting

use crate::decision::{EvaluationReport, ThresholdMetrics};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Curve points listed before truncating
const MAX_CURVE_POINTS: usize = 10;

/// Render an evaluation report as formatted terminal output
pub fn render(report: &EvaluationReport) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}Film Adaptation Model{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    match report.threshold {
        Some(t) => out.push_str(&format!("Threshold: {BOLD}{:.2}{RESET}  ", t)),
        None => out.push_str("Threshold: -  "),
    }
    out.push_str(&format!("Books: {}\n\n", report.n_rows));

    out.push_str(&format!("{BOLD}METRICS{RESET}\n"));
    out.push_str(&format!(
        "  Recall: {}  Precision: {}  F1: {}  Accuracy: {}\n",
        format_metric(report.recall),
        format_metric(report.precision),
        format_metric(report.f1),
        format_metric(report.accuracy)
    ));
    match report.roc_auc {
        Some(auc) => out.push_str(&format!("  ROC-AUC: {}\n\n", format_metric(auc))),
        None => out.push_str(&format!(
            "  ROC-AUC: {DIM}n/a (only one class present){RESET}\n\n"
        )),
    }

    let cm = &report.confusion_matrix;
    out.push_str(&format!("{BOLD}CONFUSION MATRIX{RESET}\n"));
    out.push_str(&format!(
        "{DIM}                 predicted 0  predicted 1{RESET}\n"
    ));
    out.push_str(&format!(
        "  actual 0       {:>11}  {:>11}\n",
        cm.true_negatives, cm.false_positives
    ));
    out.push_str(&format!(
        "  actual 1       {:>11}  {:>11}\n\n",
        cm.false_negatives, cm.true_positives
    ));

    out.push_str(&format!("{BOLD}CLASSIFICATION REPORT{RESET}\n"));
    out.push_str(&format!(
        "{DIM}  class   precision   recall   f1-score   support{RESET}\n"
    ));
    for class in &report.per_class {
        out.push_str(&format!(
            "  {:>5}   {:>9.3}   {:>6.3}   {:>8.3}   {:>7}\n",
            class.label, class.precision, class.recall, class.f1, class.support
        ));
    }
    out.push('\n');

    if !report.pr_curve.is_empty() {
        out.push_str(&format!(
            "{BOLD}PRECISION-RECALL CURVE{RESET} ({} points)\n",
            report.pr_curve.len()
        ));
        out.push_str(&format!(
            "{DIM}  threshold   recall   precision{RESET}\n"
        ));
        for point in report.pr_curve.iter().take(MAX_CURVE_POINTS) {
            out.push_str(&format!(
                "  {:>9.4}   {:>6.3}   {:>9.3}\n",
                point.threshold, point.recall, point.precision
            ));
        }
        let remaining = report.pr_curve.len().saturating_sub(MAX_CURVE_POINTS);
        if remaining > 0 {
            out.push_str(&format!(
                "  {DIM}...and {} more (use --format json for all points){RESET}\n",
                remaining
            ));
        }
    }

    Ok(out)
}

/// Render a threshold sweep as a table
pub fn render_sweep(rows: &[ThresholdMetrics]) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("\n{BOLD}THRESHOLD SWEEP{RESET}\n"));
    out.push_str(&format!(
        "{DIM}  threshold   recall   precision   f1      accuracy   tn    fp    fn    tp{RESET}\n"
    ));
    for row in rows {
        let cm = &row.confusion_matrix;
        out.push_str(&format!(
            "  {:>9.2}   {}   {}      {}   {}      {:<5} {:<5} {:<5} {}\n",
            row.threshold,
            format_metric(row.recall),
            format_metric(row.precision),
            format_metric(row.f1),
            format_metric(row.accuracy),
            cm.true_negatives,
            cm.false_positives,
            cm.false_negatives,
            cm.true_positives
        ));
    }
    Ok(out)
}

fn format_metric(value: f64) -> String {
    let color = if value >= 0.8 {
        "\x1b[32m"
    } else if value >= 0.5 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:.3}{RESET}", value)
}
