//! CLI command definitions and handlers

mod evaluate;
mod init;
mod inspect;
mod predict;
mod train;

use crate::config::{load_config_file, load_project_config, parse_delimiter, ProjectConfig};
use crate::data::{load_table, reconcile_author_ratings, ReconcilePolicy, Table};
use crate::decision::Threshold;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// bookcast - film adaptation prediction for new books
#[derive(Parser, Debug)]
#[command(name = "bookcast")]
#[command(
    version,
    about = "Predict which new books get adapted into films, with a tunable decision threshold",
    long_about = "bookcast trains a logistic model on historical book-market data \
(publication year, author reputation, ratings, sales, language, genre, publisher) \
and scores new books with the probability of a film adaptation.\n\n\
The decision threshold is chosen per call, so recall and precision can be traded \
off without retraining.",
    after_help = "\
Examples:
  bookcast train books.csv                     Train and save the model
  bookcast evaluate books.csv --threshold 0.3  Metrics at a lower threshold
  bookcast curve books.csv                     Metrics across thresholds
  bookcast predict --author-rating Famous --genre Fantasy --gross-sales 1200000
  bookcast predict --data new_books.csv -o scored.csv"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: bookcast.toml in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input-file flags shared by every command that reads a dataset
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Field delimiter (default from config, ";" otherwise)
    #[arg(long, short = 'd')]
    pub delimiter: Option<String>,

    /// Reconcile conflicting author ratings: off, max, first
    #[arg(long)]
    pub reconcile: Option<ReconcilePolicy>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a bookcast.toml config file with example settings
    Init {
        /// Directory to write the config into
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Train the model on a labeled dataset and save it
    #[command(after_help = "\
Examples:
  bookcast train books.csv
  bookcast train books.csv -o model.bin --test-size 0.25 --seed 7
  bookcast train books.csv --format json")]
    Train {
        /// Labeled dataset (must include Adapted_to_Film and Book_Name)
        data: PathBuf,

        /// Where to write the model artifact
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output format for the hold-out report: text, json, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
        format: String,

        /// Hold-out fraction in [0, 1)
        #[arg(long)]
        test_size: Option<f64>,

        /// Seed for the train/hold-out split
        #[arg(long)]
        seed: Option<u64>,

        /// Threshold for the hold-out report
        #[arg(long)]
        report_threshold: Option<Threshold>,

        /// Publishers/authors kept before collapsing into "other"
        #[arg(long)]
        top_k: Option<usize>,

        #[command(flatten)]
        data_args: DataArgs,
    },

    /// Score one book (from flags) or a whole file
    #[command(after_help = "\
Examples:
  bookcast predict --year 2021 --author-rating Famous --average-rating 4.3 \\
      --rating-count 12000 --gross-sales 850000 --language en --genre Fantasy \\
      --publisher Tor --author \"Jane Doe\"
  bookcast predict --data new_books.csv --threshold 0.3 --format json
  bookcast predict --data books.csv --book-name \"The Hobbit\"")]
    Predict {
        /// Model artifact (default from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,

        /// Decision threshold (default from config)
        #[arg(long, short = 't')]
        threshold: Option<Threshold>,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Score every row of this file instead of a single book
        #[arg(long, conflicts_with_all = ["year", "author", "author_rating", "average_rating", "rating_count", "gross_sales", "language", "genre", "publisher"])]
        data: Option<PathBuf>,

        /// Write per-row scores as CSV (batch mode only)
        #[arg(long, short = 'o', requires = "data")]
        output: Option<PathBuf>,

        #[command(flatten)]
        data_args: DataArgs,

        #[command(flatten)]
        book: predict::BookArgs,
    },

    /// Evaluate the saved model on a labeled dataset at a threshold
    Evaluate {
        /// Labeled dataset
        data: PathBuf,

        /// Model artifact (default from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,

        /// Decision threshold (default from config)
        #[arg(long, short = 't')]
        threshold: Option<Threshold>,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        data_args: DataArgs,
    },

    /// Metrics at several thresholds without re-scoring
    Curve {
        /// Labeled dataset
        data: PathBuf,

        /// Model artifact (default from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,

        /// Comma-separated thresholds (default: 0.1, 0.2, ..., 0.9)
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<Threshold>,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
        format: String,

        #[command(flatten)]
        data_args: DataArgs,
    },

    /// Show a saved model's metadata and strongest coefficients
    Inspect {
        /// Model artifact (default from config)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,

        /// Coefficients to list
        #[arg(long, default_value = "15")]
        top: usize,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Show version information
    Version,
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { path } => init::run(&path),

        Commands::Train {
            data,
            output,
            format,
            test_size,
            seed,
            report_threshold,
            top_k,
            data_args,
        } => {
            let mut training = config.training.clone();
            if let Some(test_size) = test_size {
                training.test_size = test_size;
            }
            if let Some(seed) = seed {
                training.seed = seed;
            }
            if let Some(threshold) = report_threshold {
                training.report_threshold = threshold.value();
            }
            if let Some(top_k) = top_k {
                training.top_k = top_k;
            }
            let model_path = output.unwrap_or_else(|| config.scoring.model_path());
            let table = load_data(&data, &config, &data_args)?;
            train::run(&table, &training, &model_path, &format)
        }

        Commands::Predict {
            model,
            threshold,
            format,
            data,
            output,
            data_args,
            book,
        } => {
            let model_path = model.unwrap_or_else(|| config.scoring.model_path());
            let threshold = resolve_threshold(threshold, &config)?;
            match data {
                Some(path) => {
                    let table = load_data(&path, &config, &data_args)?;
                    predict::run_batch(
                        &table,
                        &model_path,
                        threshold,
                        &format,
                        output.as_deref(),
                        book.book_name.as_deref(),
                    )
                }
                None => predict::run_single(&book, &model_path, threshold, &format),
            }
        }

        Commands::Evaluate {
            data,
            model,
            threshold,
            format,
            output,
            data_args,
        } => {
            let model_path = model.unwrap_or_else(|| config.scoring.model_path());
            let threshold = resolve_threshold(threshold, &config)?;
            let table = load_data(&data, &config, &data_args)?;
            evaluate::run(&table, &model_path, threshold, &format, output.as_deref())
        }

        Commands::Curve {
            data,
            model,
            thresholds,
            format,
            data_args,
        } => {
            let model_path = model.unwrap_or_else(|| config.scoring.model_path());
            let table = load_data(&data, &config, &data_args)?;
            evaluate::run_curve(&table, &model_path, &thresholds, &format)
        }

        Commands::Inspect { model, top, format } => {
            let model_path = model.unwrap_or_else(|| config.scoring.model_path());
            inspect::run(&model_path, top, &format)
        }

        Commands::Version => {
            println!("bookcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// `--config` is strict; the implicit project config falls back to defaults
fn resolve_config(path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(load_project_config(Path::new("."))),
    }
}

fn resolve_threshold(flag: Option<Threshold>, config: &ProjectConfig) -> Result<Threshold> {
    match flag {
        Some(threshold) => Ok(threshold),
        None => config
            .scoring
            .threshold()
            .context("Invalid [scoring] threshold in config"),
    }
}

/// Load a dataset with the configured delimiter and cleaning rule
fn load_data(path: &Path, config: &ProjectConfig, args: &DataArgs) -> Result<Table> {
    let mut options = config.data.load_options()?;
    if let Some(raw) = &args.delimiter {
        options.delimiter = parse_delimiter(raw)?;
    }
    let table = load_table(path, &options)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    let policy = args
        .reconcile
        .unwrap_or(config.data.reconcile_author_ratings);
    Ok(reconcile_author_ratings(&table, policy)?)
}
