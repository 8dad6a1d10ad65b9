//! Evaluate and curve commands - model quality on labeled data

use crate::data::schema::{self, LABEL};
use crate::data::table::Table;
use crate::decision::{sweep, Threshold};
use crate::reporters::{self, OutputFormat};
use crate::service::ScoringService;
use anyhow::{bail, Context, Result};
use console::style;
use std::path::Path;
use std::str::FromStr;

/// Default sweep: 0.1, 0.2, ..., 0.9
fn default_thresholds() -> Vec<Threshold> {
    (1..=9)
        .filter_map(|i| Threshold::new(f64::from(i) / 10.0).ok())
        .collect()
}

/// Evaluate the model on `table` at `threshold`
pub fn run(
    table: &Table,
    model_path: &Path,
    threshold: Threshold,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let service = ScoringService::load(model_path)?;
    require_labels(table)?;

    let batch = service.score_batch(table, threshold)?;
    let Some(report) = batch.evaluation else {
        bail!(
            "Column '{}' must hold 0 or 1 in every row to evaluate",
            LABEL
        );
    };

    let format = OutputFormat::from_str(format)?;
    let rendered = reporters::report_with_format(&report, format)?;
    match output {
        Some(path) => {
            let path = reporters::output_path(path, format);
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Score once, then report metrics at every threshold
pub fn run_curve(
    table: &Table,
    model_path: &Path,
    thresholds: &[Threshold],
    format: &str,
) -> Result<()> {
    let service = ScoringService::load(model_path)?;
    require_labels(table)?;

    let labels: Vec<u8> = match schema::binary_labels(table)?
        .into_iter()
        .collect::<Option<Vec<u8>>>()
    {
        Some(labels) => labels,
        None => bail!("Column '{}' has empty cells; cannot sweep", LABEL),
    };

    let thresholds = if thresholds.is_empty() {
        default_thresholds()
    } else {
        thresholds.to_vec()
    };

    // Probabilities do not depend on the threshold
    let batch = service.score_batch(table, Threshold::DEFAULT)?;
    let rows = sweep(&labels, &batch.probabilities, &thresholds)?;

    let format = OutputFormat::from_str(format)?;
    println!("{}", reporters::sweep_with_format(&rows, format)?);
    Ok(())
}

fn require_labels(table: &Table) -> Result<()> {
    if !table.has_column(LABEL) {
        bail!(
            "Dataset has no '{}' column; use `bookcast predict --data` for unlabeled books",
            LABEL
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = default_thresholds();
        assert_eq!(thresholds.len(), 9);
        assert_eq!(thresholds[0].value(), 0.1);
        assert_eq!(thresholds[8].value(), 0.9);
    }

    #[test]
    fn test_require_labels() {
        let (table, _) = crate::pipeline::tests::training_table();
        let err = require_labels(&table).unwrap_err();
        assert!(err.to_string().contains("Adapted_to_Film"));
    }
}
