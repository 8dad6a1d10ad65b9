//! Author-rating ordinal encoding
//!
//! Replaces the textual `Author_Rating` column by its ordinal code
//! (Novice=1, Intermediate=2, Famous=3, Excellent=4). Unknown labels
//! become null. A column that is already numeric is left alone, so the
//! stage is idempotent.

use crate::data::schema::AUTHOR_RATING;
use crate::data::table::{Column, Table};
use crate::error::Result;
use crate::models::AuthorRating;
use serde::{Deserialize, Serialize};

/// Stateless: fitting learns nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorRatingEncoder;

impl AuthorRatingEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, table: &Table) -> Result<Table> {
        let Some(Column::Text(labels)) = table.column(AUTHOR_RATING) else {
            return Ok(table.clone());
        };

        let codes: Vec<Option<f64>> = labels
            .iter()
            .map(|label| {
                label
                    .as_deref()
                    .map(AuthorRating::from_label)
                    .and_then(|r| r.ordinal())
                    .map(f64::from)
            })
            .collect();

        let mut out = table.clone();
        out.set_column(AUTHOR_RATING, Column::Numeric(codes))?;
        Ok(out)
    }
}
