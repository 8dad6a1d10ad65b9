//! Output reporters for evaluation results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON
//! - `markdown` - GitHub-flavored Markdown

mod json;
mod markdown;
mod text;

use crate::decision::{EvaluationReport, ThresholdMetrics};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render an evaluation report using an OutputFormat enum
pub fn report_with_format(report: &EvaluationReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

/// Render a threshold sweep
pub fn sweep_with_format(rows: &[ThresholdMetrics], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_sweep(rows),
        OutputFormat::Json => json::render(&rows),
        OutputFormat::Markdown => markdown::render_sweep(rows),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    }
}

/// `path` with the format's extension added when it has none
pub fn output_path(path: &Path, format: OutputFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(file_extension(format))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::decision::{evaluate_at, sweep, Threshold};

    const LABELS: [u8; 8] = [0, 1, 1, 0, 1, 0, 0, 1];
    const PROBS: [f64; 8] = [0.15, 0.7, 0.45, 0.6, 0.95, 0.05, 0.3, 0.35];

    /// Evaluation at 0.4 with a 3/1/1/3 confusion matrix
    pub(crate) fn test_report() -> EvaluationReport {
        evaluate_at(&LABELS, &PROBS, Threshold::new(0.4).unwrap()).unwrap()
    }

    pub(crate) fn test_sweep() -> Vec<ThresholdMetrics> {
        let thresholds: Vec<Threshold> = [0.3, 0.5, 0.7]
            .iter()
            .map(|&t| Threshold::new(t).unwrap())
            .collect();
        sweep(&LABELS, &PROBS, &thresholds).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_every_format_renders() {
        let report = test_report();
        for format in ["text", "json", "markdown"] {
            let format = OutputFormat::from_str(format).unwrap();
            let out = report_with_format(&report, format).unwrap();
            assert!(out.contains("0.75"), "{format}: {out}");
        }
    }

    #[test]
    fn test_output_path_adds_missing_extension() {
        assert_eq!(
            output_path(Path::new("out/report"), OutputFormat::Markdown),
            PathBuf::from("out/report.md")
        );
        assert_eq!(
            output_path(Path::new("report"), OutputFormat::Json),
            PathBuf::from("report.json")
        );
        assert_eq!(
            output_path(Path::new("report.txt"), OutputFormat::Json),
            PathBuf::from("report.txt")
        );
    }
}
