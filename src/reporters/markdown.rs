//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - README files
//! - Pull request comments
//! - Model review notes

use crate::decision::{EvaluationReport, ThresholdMetrics};
use anyhow::Result;
use chrono::Local;

/// Curve points listed before truncating
const MAX_CURVE_POINTS: usize = 20;

/// Render an evaluation report as GitHub-flavored Markdown
pub fn render(report: &EvaluationReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');
    md.push_str(&render_metrics(report));
    md.push('\n');
    md.push_str(&render_confusion_matrix(report));
    md.push('\n');
    md.push_str(&render_classification_report(report));
    md.push('\n');
    md.push_str(&render_curve(report));

    Ok(md)
}

fn render_header(report: &EvaluationReport) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let threshold = report
        .threshold
        .map_or_else(|| "-".to_string(), |t| format!("{:.2}", t));

    format!(
        r#"# Film Adaptation Model Evaluation

**Threshold: {}** | **Books: {}**

Generated: {}
"#,
        threshold, report.n_rows, timestamp
    )
}

fn render_metrics(report: &EvaluationReport) -> String {
    let auc = report
        .roc_auc
        .map_or_else(|| "n/a".to_string(), |a| format!("{:.3}", a));

    format!(
        r#"## Metrics

| Metric | Value |
|--------|-------|
| **Recall** | {:.3} |
| **Precision** | {:.3} |
| **F1** | {:.3} |
| **Accuracy** | {:.3} |
| **ROC-AUC** | {} |
"#,
        report.recall, report.precision, report.f1, report.accuracy, auc
    )
}

fn render_confusion_matrix(report: &EvaluationReport) -> String {
    let cm = &report.confusion_matrix;
    format!(
        r#"## Confusion Matrix

| | Predicted 0 | Predicted 1 |
|---|---|---|
| **Actual 0** | {} | {} |
| **Actual 1** | {} | {} |
"#,
        cm.true_negatives, cm.false_positives, cm.false_negatives, cm.true_positives
    )
}

fn render_classification_report(report: &EvaluationReport) -> String {
    let mut md = String::from(
        "## Classification Report\n\n| Class | Precision | Recall | F1 | Support |\n|-------|-----------|--------|----|---------|\n",
    );
    for class in &report.per_class {
        md.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} | {} |\n",
            class.label, class.precision, class.recall, class.f1, class.support
        ));
    }
    md
}

fn render_curve(report: &EvaluationReport) -> String {
    if report.pr_curve.is_empty() {
        return String::new();
    }
    let mut md = format!(
        "## Precision-Recall Curve\n\n{} points, highest threshold first.\n\n| Threshold | Recall | Precision |\n|-----------|--------|-----------|\n",
        report.pr_curve.len()
    );
    for point in report.pr_curve.iter().take(MAX_CURVE_POINTS) {
        md.push_str(&format!(
            "| {:.4} | {:.3} | {:.3} |\n",
            point.threshold, point.recall, point.precision
        ));
    }
    if report.pr_curve.len() > MAX_CURVE_POINTS {
        md.push_str(&format!(
            "\n*...and {} more points*\n",
            report.pr_curve.len() - MAX_CURVE_POINTS
        ));
    }
    md
}

/// Render a threshold sweep as a Markdown table
pub fn render_sweep(rows: &[ThresholdMetrics]) -> Result<String> {
    let mut md = String::from(
        "# Threshold Sweep\n\n| Threshold | Recall | Precision | F1 | Accuracy | TN | FP | FN | TP |\n|---|---|---|---|---|---|---|---|---|\n",
    );
    for row in rows {
        let cm = &row.confusion_matrix;
        md.push_str(&format!(
            "| {:.2} | {:.3} | {:.3} | {:.3} | {:.3} | {} | {} | {} | {} |\n",
            row.threshold,
            row.recall,
            row.precision,
            row.f1,
            row.accuracy,
            cm.true_negatives,
            cm.false_positives,
            cm.false_negatives,
            cm.true_positives
        ));
    }
    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::{test_report, test_sweep};

    #[test]
    fn test_markdown_tables() {
        let md = render(&test_report()).unwrap();
        assert!(md.starts_with("# Film Adaptation Model Evaluation"));
        assert!(md.contains("| **Actual 0** | 3 | 1 |"));
        assert!(md.contains("| **Actual 1** | 1 | 3 |"));
        assert!(md.contains("| 1 | 0.750 | 0.750 | 0.750 | 4 |"));
    }

    #[test]
    fn test_markdown_missing_auc() {
        let mut report = test_report();
        report.roc_auc = None;
        assert!(render(&report).unwrap().contains("| **ROC-AUC** | n/a |"));
    }

    #[test]
    fn test_markdown_sweep() {
        let md = render_sweep(&test_sweep()).unwrap();
        assert_eq!(md.lines().filter(|l| l.starts_with("| 0.")).count(), 3);
    }
}
