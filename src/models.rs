//! Core domain types

use crate::data::schema;
use crate::data::table::{Record, Value};
use serde::{Deserialize, Serialize};

/// Author reputation level.
///
/// Closed set; anything unrecognised (or missing) is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthorRating {
    Novice,
    Intermediate,
    Famous,
    Excellent,
    #[default]
    Unknown,
}

impl AuthorRating {
    pub fn known() -> &'static [AuthorRating] {
        &[
            AuthorRating::Novice,
            AuthorRating::Intermediate,
            AuthorRating::Famous,
            AuthorRating::Excellent,
        ]
    }

    pub fn is_known(&self) -> bool {
        self.ordinal().is_some()
    }

    /// Parse a textual label. Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Novice" => AuthorRating::Novice,
            "Intermediate" => AuthorRating::Intermediate,
            "Famous" => AuthorRating::Famous,
            "Excellent" => AuthorRating::Excellent,
            _ => AuthorRating::Unknown,
        }
    }

    /// Ordinal code used as a model feature
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            AuthorRating::Novice => Some(1),
            AuthorRating::Intermediate => Some(2),
            AuthorRating::Famous => Some(3),
            AuthorRating::Excellent => Some(4),
            AuthorRating::Unknown => None,
        }
    }

    pub fn from_ordinal(code: u8) -> Self {
        match code {
            1 => AuthorRating::Novice,
            2 => AuthorRating::Intermediate,
            3 => AuthorRating::Famous,
            4 => AuthorRating::Excellent,
            _ => AuthorRating::Unknown,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            AuthorRating::Novice => Some("Novice"),
            AuthorRating::Intermediate => Some("Intermediate"),
            AuthorRating::Famous => Some("Famous"),
            AuthorRating::Excellent => Some("Excellent"),
            AuthorRating::Unknown => None,
        }
    }
}

impl std::fmt::Display for AuthorRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label().unwrap_or("Unknown"))
    }
}

/// A book as it appears in the dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub book_name: Option<String>,
    pub publishing_year: Option<i32>,
    pub author: Option<String>,
    pub author_rating: AuthorRating,
    pub average_rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub gross_sales_eur: Option<f64>,
    pub language_code: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    /// Ground truth, when known
    pub adapted_to_film: Option<bool>,
}

impl BookRecord {
    /// Dynamic record carrying every feature column (missing values as null)
    pub fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with(schema::PUBLISHING_YEAR, self.publishing_year.map(i64::from))
            .with(schema::AUTHOR, self.author.clone())
            .with(
                schema::AUTHOR_RATING,
                self.author_rating
                    .label()
                    .map_or(Value::Null, Value::from),
            )
            .with(schema::AVERAGE_RATING, self.average_rating)
            .with(schema::RATING_COUNT, self.rating_count.map(|c| c as f64))
            .with(schema::GROSS_SALES, self.gross_sales_eur)
            .with(schema::LANGUAGE_CODE, self.language_code.clone())
            .with(schema::GENRE, self.genre.clone())
            .with(schema::PUBLISHER, self.publisher.clone());

        if let Some(name) = &self.book_name {
            record.set(schema::BOOK_NAME, name.as_str());
        }
        if let Some(adapted) = self.adapted_to_film {
            record.set(schema::LABEL, if adapted { 1.0 } else { 0.0 });
        }
        record
    }
}

/// Outcome of scoring one book at a threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability of a film adaptation
    pub probability: f64,
    pub threshold: f64,
    /// `probability >= threshold`
    pub adapted: bool,
}
