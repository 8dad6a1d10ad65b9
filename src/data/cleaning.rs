//! Upstream data-cleaning rules
//!
//! Only one rule lives here: reconciling conflicting author ratings across
//! duplicate rows of the same author. It runs before the model pipeline and
//! is off unless configured.

use super::schema::{AUTHOR, AUTHOR_RATING};
use super::table::{Column, Table};
use crate::error::Result;
use crate::models::AuthorRating;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How to resolve an author whose rows disagree on `Author_Rating`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Leave ratings as they are
    #[default]
    Off,
    /// Highest ordinal rating seen for the author
    Max,
    /// First known rating seen for the author, in row order
    First,
}

impl std::str::FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(ReconcilePolicy::Off),
            "max" => Ok(ReconcilePolicy::Max),
            "first" => Ok(ReconcilePolicy::First),
            other => Err(format!(
                "unknown reconcile policy '{}'. Valid: off, max, first",
                other
            )),
        }
    }
}

/// Apply the policy to a table with textual `Author` and `Author_Rating`
/// columns. Tables without them, or with an already numeric rating column,
/// are returned unchanged. Unknown labels never win a reconciliation.
pub fn reconcile_author_ratings(table: &Table, policy: ReconcilePolicy) -> Result<Table> {
    if policy == ReconcilePolicy::Off {
        return Ok(table.clone());
    }
    let (Some(authors), Some(Column::Text(ratings))) =
        (table.column(AUTHOR), table.column(AUTHOR_RATING))
    else {
        return Ok(table.clone());
    };
    let authors = authors.to_text();

    let mut resolved: HashMap<&str, AuthorRating> = HashMap::new();
    for (author, rating) in authors.iter().zip(ratings) {
        let (Some(author), Some(rating)) = (author, rating) else {
            continue;
        };
        let rating = AuthorRating::from_label(rating);
        if rating == AuthorRating::Unknown {
            continue;
        }
        resolved
            .entry(author.as_str())
            .and_modify(|current| {
                if policy == ReconcilePolicy::Max && rating.ordinal() > current.ordinal() {
                    *current = rating;
                }
            })
            .or_insert(rating);
    }

    let mut changed = 0usize;
    let reconciled: Vec<Option<String>> = authors
        .iter()
        .zip(ratings)
        .map(|(author, original)| {
            let replacement = author
                .as_deref()
                .and_then(|a| resolved.get(a))
                .and_then(|r| r.label());
            match replacement {
                Some(label) => {
                    if original.as_deref() != Some(label) {
                        changed += 1;
                    }
                    Some(label.to_string())
                }
                None => original.clone(),
            }
        })
        .collect();

    debug!("Reconciled {} author rating(s) with {:?} policy", changed, policy);

    let mut out = table.clone();
    out.set_column(AUTHOR_RATING, Column::Text(reconciled))?;
    Ok(out)
}
