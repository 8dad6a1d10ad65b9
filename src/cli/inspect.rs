//! Inspect command - show what a saved model learned

use crate::artifact::{ModelArtifact, ModelMetadata};
use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct Coefficient {
    feature: String,
    weight: f64,
}

#[derive(Serialize)]
struct Inspection<'a> {
    path: String,
    metadata: &'a ModelMetadata,
    bias: f64,
    coefficients: Vec<Coefficient>,
}

/// Strongest `top` coefficients by absolute weight
fn strongest(artifact: &ModelArtifact, top: usize) -> Result<Vec<Coefficient>> {
    let weights = artifact
        .pipeline
        .classifier()
        .weights()
        .context("Model artifact has no classifier weights")?;
    let mut coefficients: Vec<Coefficient> = artifact
        .pipeline
        .feature_names()
        .into_iter()
        .zip(weights)
        .map(|(feature, &weight)| Coefficient { feature, weight })
        .collect();
    coefficients.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
    coefficients.truncate(top);
    Ok(coefficients)
}

pub fn run(model_path: &Path, top: usize, format: &str) -> Result<()> {
    let artifact = ModelArtifact::load(model_path)?;
    let coefficients = strongest(&artifact, top)?;
    let meta = &artifact.metadata;

    if format == "json" {
        let out = Inspection {
            path: model_path.display().to_string(),
            metadata: meta,
            bias: artifact.pipeline.classifier().bias(),
            coefficients,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\n{} {}\n", style("Model").bold(), style(model_path.display()).cyan());
    println!("  Trained:     {}", meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Version:     bookcast {}", meta.crate_version);
    println!(
        "  Rows:        {} train / {} hold-out (seed {})",
        meta.n_train, meta.n_test, meta.seed
    );
    let convergence = if meta.converged {
        style("converged".to_string()).green()
    } else {
        style("hit the iteration cap".to_string()).yellow()
    };
    println!("  Optimizer:   {} iterations, {}", meta.iterations, convergence);
    println!(
        "  Features:    {} (top {} publishers/authors kept)",
        meta.feature_names.len(),
        meta.top_k
    );
    println!(
        "  Bias:        {:+.4}\n",
        artifact.pipeline.classifier().bias()
    );

    println!("{}", style("STRONGEST COEFFICIENTS").bold());
    for c in &coefficients {
        let weight = if c.weight >= 0.0 {
            style(format!("{:+.4}", c.weight)).green()
        } else {
            style(format!("{:+.4}", c.weight)).red()
        };
        println!("  {:>9}  {}", weight, c.feature);
    }
    println!();
    Ok(())
}
