//! One-hot encoding over a vocabulary frozen at fit time.
//!
//! Categories unseen during fit (and nulls) encode as an all-zero block;
//! the output width never changes after fit.

use crate::data::table::Table;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    /// Sorted vocabulary per column
    vocabularies: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            vocabularies: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabularies.len() == self.columns.len()
    }

    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.vocabularies.get(idx).map(Vec::as_slice)
    }

    /// Total number of indicator columns produced
    pub fn width(&self) -> usize {
        self.vocabularies.iter().map(Vec::len).sum()
    }

    pub fn fit(&mut self, table: &Table) -> Result<()> {
        let mut vocabularies = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let column = table
                .column(name)
                .ok_or_else(|| Error::schema(format!("missing column '{}'", name)))?;
            let mut vocab: Vec<String> = column.to_text().into_iter().flatten().collect();
            vocab.sort();
            vocab.dedup();
            vocabularies.push(vocab);
        }
        self.vocabularies = vocabularies;
        Ok(())
    }

    /// Indicator values, one `Vec` of length [`width`](Self::width) per row
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted() {
            return Err(Error::Pipeline("one-hot encoder used before fit".into()));
        }

        let width = self.width();
        let mut rows = vec![vec![0.0; width]; table.n_rows()];
        let mut offset = 0;
        for (name, vocab) in self.columns.iter().zip(&self.vocabularies) {
            let column = table
                .column(name)
                .ok_or_else(|| Error::schema(format!("missing column '{}'", name)))?;
            for (row, value) in rows.iter_mut().zip(column.to_text()) {
                if let Some(pos) = value.and_then(|v| vocab.binary_search(&v).ok()) {
                    row[offset + pos] = 1.0;
                }
            }
            offset += vocab.len();
        }
        Ok(rows)
    }

    /// `<column>_<category>` for every indicator, in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.vocabularies)
            .flat_map(|(name, vocab)| vocab.iter().map(move |v| format!("{}_{}", name, v)))
            .collect()
    }
}
