//! Rare-category collapsing
//!
//! Keeps the `top_k` most frequent training values of each configured
//! column and maps every other value to a shared bucket. Frequency ties are
//! broken by first appearance in the training data.

use crate::data::table::{Column, Table};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bucket for values outside a column's keep-list
pub const OTHER_BUCKET: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RareCategoryCollapser {
    top_k: usize,
    columns: Vec<String>,
    /// Learned keep-list per column, most frequent first
    keep: Vec<Vec<String>>,
}

impl RareCategoryCollapser {
    pub fn new(columns: &[&str], top_k: usize) -> Self {
        Self {
            top_k,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            keep: Vec::new(),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Keep-list learned for `column`, if fitted
    pub fn kept(&self, column: &str) -> Option<&[String]> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.keep.get(idx).map(Vec::as_slice)
    }

    pub fn fit(&mut self, table: &Table) -> Result<()> {
        let mut keep = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let column = table
                .column(name)
                .ok_or_else(|| Error::schema(format!("missing column '{}'", name)))?;
            keep.push(most_frequent(&column.to_text(), self.top_k));
        }
        self.keep = keep;
        Ok(())
    }

    pub fn transform(&self, table: &Table) -> Result<Table> {
        if self.keep.len() != self.columns.len() {
            return Err(Error::Pipeline(
                "rare-category collapser used before fit".into(),
            ));
        }

        let mut out = table.clone();
        for (name, keep) in self.columns.iter().zip(&self.keep) {
            let Some(column) = table.column(name) else {
                continue;
            };
            let collapsed = column
                .to_text()
                .into_iter()
                .map(|cell| {
                    cell.map(|value| {
                        if keep.contains(&value) {
                            value
                        } else {
                            OTHER_BUCKET.to_string()
                        }
                    })
                })
                .collect();
            out.set_column(name, Column::Text(collapsed))?;
        }
        Ok(out)
    }
}

fn most_frequent(cells: &[Option<String>], k: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, value) in cells.iter().enumerate() {
        let Some(value) = value else { continue };
        counts.entry(value.as_str()).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(k)
        .map(|(value, _)| value.to_string())
        .collect()
}
