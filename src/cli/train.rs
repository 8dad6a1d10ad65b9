//! Train command - fit the model and save the artifact

use crate::artifact::ModelArtifact;
use crate::config::TrainingConfig;
use crate::data::table::Table;
use crate::reporters::{self, OutputFormat};
use crate::training::{train, TrainResult};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

pub fn run(
    table: &Table,
    training: &TrainingConfig,
    model_path: &Path,
    format: &str,
) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    let config = training
        .to_train_config()
        .context("Invalid [training] settings")?;

    let quiet = format == OutputFormat::Json;
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(create_spinner_style());
    spinner.set_message(format!("Training on {} books...", table.n_rows()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let result = match train(table, &config) {
        Ok(result) => result,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Training failed");
        }
    };
    spinner.finish_with_message(format!(
        "{}Trained on {} books in {:.2}s",
        style("✓ ").green(),
        style(result.n_train).cyan(),
        start.elapsed().as_secs_f64()
    ));

    // Only a completed training run reaches the artifact
    let artifact = ModelArtifact::from_training(&result, &config);
    artifact
        .save(model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;

    if quiet {
        println!("{}", serde_json::to_string_pretty(&summary_json(&result, model_path))?);
        return Ok(());
    }

    print_summary(&result, model_path);
    if let Some(report) = &result.holdout {
        println!("{}", reporters::report_with_format(report, format)?);
    }
    Ok(())
}

fn print_summary(result: &TrainResult, model_path: &Path) {
    let fit = &result.fit_report;
    println!(
        "{} Model saved to {}",
        style("✓").green(),
        style(model_path.display()).cyan()
    );
    println!(
        "  {} features, {} iterations, {}",
        result.pipeline.feature_names().len(),
        fit.iterations,
        if fit.converged {
            style("converged").green()
        } else {
            style("did not converge").yellow()
        }
    );
    if result.n_dropped > 0 {
        println!(
            "  {} {} rows without a label were skipped",
            style("!").yellow(),
            result.n_dropped
        );
    }
    if result.holdout.is_none() {
        println!("  {}", style("No hold-out rows; skipped evaluation").dim());
    }
}

fn summary_json(result: &TrainResult, model_path: &Path) -> serde_json::Value {
    serde_json::json!({
        "model_path": model_path.display().to_string(),
        "n_train": result.n_train,
        "n_test": result.n_test,
        "n_dropped": result.n_dropped,
        "fit": result.fit_report,
        "feature_names": result.pipeline.feature_names(),
        "holdout": result.holdout,
    })
}
