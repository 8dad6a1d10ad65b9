//! Predict command - score a single book or a whole file

use crate::data::schema::BOOK_NAME;
use crate::data::table::Table;
use crate::decision::Threshold;
use crate::models::{AuthorRating, BookRecord, Prediction};
use crate::service::{BatchScore, ScoringService};
use anyhow::{bail, Context, Result};
use console::style;
use serde::Serialize;
use std::path::Path;

/// Book attributes for single-record scoring; anything omitted is null
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BookArgs {
    /// Title; with --data, score only the rows with this title
    #[arg(long)]
    pub book_name: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub author: Option<String>,

    /// Novice, Intermediate, Famous or Excellent
    #[arg(long)]
    pub author_rating: Option<String>,

    /// Average reader rating (0-5)
    #[arg(long)]
    pub average_rating: Option<f64>,

    #[arg(long)]
    pub rating_count: Option<u64>,

    /// Gross sales in EUR
    #[arg(long)]
    pub gross_sales: Option<f64>,

    /// Language code, e.g. "en"
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    #[arg(long)]
    pub publisher: Option<String>,
}

impl BookArgs {
    pub fn to_book(&self) -> BookRecord {
        BookRecord {
            book_name: self.book_name.clone(),
            publishing_year: self.year,
            author: self.author.clone(),
            author_rating: self
                .author_rating
                .as_deref()
                .map(AuthorRating::from_label)
                .unwrap_or_default(),
            average_rating: self.average_rating,
            rating_count: self.rating_count,
            gross_sales_eur: self.gross_sales,
            language_code: self.language.clone(),
            genre: self.genre.clone(),
            publisher: self.publisher.clone(),
            adapted_to_film: None,
        }
    }
}

#[derive(Serialize)]
struct SinglePrediction<'a> {
    book_name: Option<&'a str>,
    #[serde(flatten)]
    prediction: Prediction,
}

/// Score one book described by flags
pub fn run_single(
    book: &BookArgs,
    model_path: &Path,
    threshold: Threshold,
    format: &str,
) -> Result<()> {
    let service = ScoringService::load(model_path)?;
    if let Some(label) = book.author_rating.as_deref() {
        if !AuthorRating::from_label(label).is_known() {
            tracing::warn!("Unknown author rating '{}'; treating it as missing", label);
        }
    }

    let prediction = service.predict(&book.to_book().to_record(), threshold)?;

    if format == "json" {
        let out = SinglePrediction {
            book_name: book.book_name.as_deref(),
            prediction,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let verdict = if prediction.adapted {
        style("likely to be adapted").green().bold()
    } else {
        style("unlikely to be adapted").yellow()
    };
    let name = book.book_name.as_deref().unwrap_or("This book");
    println!(
        "\n{} is {} ({} probability, threshold {:.2})\n",
        style(name).cyan(),
        verdict,
        style(format!("{:.1}%", prediction.probability * 100.0)).bold(),
        prediction.threshold
    );
    Ok(())
}

/// Score every row of a table, or only the rows titled `title`
pub fn run_batch(
    table: &Table,
    model_path: &Path,
    threshold: Threshold,
    format: &str,
    output: Option<&Path>,
    title: Option<&str>,
) -> Result<()> {
    let service = ScoringService::load(model_path)?;
    let selected;
    let table = match title {
        Some(title) => {
            selected = select_title(table, title)?;
            &selected
        }
        None => table,
    };
    let batch = service.score_batch(table, threshold)?;
    let names = book_names(table);

    if let Some(path) = output {
        write_scores(path, &names, &batch)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        let message = format!(
            "{} Wrote {} scores to {}",
            style("✓").green(),
            batch.probabilities.len(),
            style(path.display()).cyan()
        );
        // stdout carries the JSON document
        if format == "json" {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }
    if output.is_some() {
        print_summary(&batch);
        return Ok(());
    }

    println!(
        "\n{:<5} {:<40} {:>11}  {}",
        style("#").dim(),
        style("BOOK").dim(),
        style("PROBABILITY").dim(),
        style("ADAPTED").dim()
    );
    for (i, (p, label)) in batch
        .probabilities
        .iter()
        .zip(&batch.predictions)
        .enumerate()
    {
        let name: String = names[i].chars().take(40).collect();
        let adapted = if *label == 1 {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!("{:<5} {:<40} {:>10.1}%  {}", i + 1, name, p * 100.0, adapted);
    }
    print_summary(&batch);
    Ok(())
}

fn print_summary(batch: &BatchScore) {
    let positives = batch.predictions.iter().filter(|&&l| l == 1).count();
    println!(
        "\n{} of {} books predicted adapted at threshold {:.2}",
        style(positives).bold(),
        batch.predictions.len(),
        batch.threshold
    );
    if let Some(report) = &batch.evaluation {
        println!(
            "Labels found: recall {:.3}, precision {:.3}, f1 {:.3} (run `bookcast evaluate` for the full report)",
            report.recall, report.precision, report.f1
        );
    }
}

/// Rows whose `Book_Name` matches `title`, ignoring case and outer spaces
fn select_title(table: &Table, title: &str) -> Result<Table> {
    let Some(column) = table.column(BOOK_NAME) else {
        bail!("Dataset has no '{}' column to look up '{}'", BOOK_NAME, title);
    };
    let wanted = title.trim().to_lowercase();
    let rows: Vec<usize> = column
        .to_text()
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            name.as_deref()
                .is_some_and(|n| n.trim().to_lowercase() == wanted)
        })
        .map(|(i, _)| i)
        .collect();
    if rows.is_empty() {
        bail!("No book titled '{}' in the dataset", title);
    }
    Ok(table.select_rows(&rows))
}

fn book_names(table: &Table) -> Vec<String> {
    let names = table.column(BOOK_NAME).map(|c| c.to_text());
    (0..table.n_rows())
        .map(|i| {
            names
                .as_ref()
                .and_then(|n| n[i].clone())
                .unwrap_or_else(|| format!("row {}", i + 1))
        })
        .collect()
}

fn write_scores(path: &Path, names: &[String], batch: &BatchScore) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["book", "probability", "adapted"])?;
    for ((name, p), label) in names
        .iter()
        .zip(&batch.probabilities)
        .zip(&batch.predictions)
    {
        writer.write_record([name.clone(), p.to_string(), label.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{AUTHOR_RATING, GENRE};
    use crate::data::table::{Record, Value};

    #[test]
    fn test_book_args_to_record() {
        let args = BookArgs {
            author_rating: Some("Famous".into()),
            genre: Some("Fantasy".into()),
            ..Default::default()
        };
        let record = args.to_book().to_record();
        assert_eq!(record.get(AUTHOR_RATING), Some(&Value::Text("Famous".into())));
        assert_eq!(record.get(GENRE), Some(&Value::Text("Fantasy".into())));
    }

    #[test]
    fn test_book_names_fallback() {
        let (table, _) = crate::pipeline::tests::training_table();
        let names = book_names(&table);
        assert_eq!(names[0], "row 1");
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_select_title() {
        let records: Vec<Record> = ["Dune", "Emma", " dune "]
            .iter()
            .map(|&name| Record::new().with(BOOK_NAME, name).with(GENRE, "Fantasy"))
            .collect();
        let table = Table::from_records(&records);

        let picked = select_title(&table, "DUNE").unwrap();
        assert_eq!(picked.n_rows(), 2);
        assert_eq!(book_names(&picked), vec!["Dune", " dune "]);

        let err = select_title(&table, "Ulysses").unwrap_err();
        assert!(err.to_string().contains("No book titled 'Ulysses'"));

        let (unnamed, _) = crate::pipeline::tests::training_table();
        assert!(select_title(&unnamed, "Dune").is_err());
    }

    #[test]
    fn test_write_scores_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let batch = BatchScore {
            threshold: 0.5,
            probabilities: vec![0.25, 0.75],
            predictions: vec![0, 1],
            evaluation: None,
        };
        write_scores(&path, &["A".into(), "B".into()], &batch).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "book,probability,adapted\nA,0.25,0\nB,0.75,1\n");
    }
}
