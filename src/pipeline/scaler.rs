//! Numeric standardization: (x - mean) / std with fit-time statistics

use crate::data::table::Table;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    /// Population standard deviation; 1.0 for constant columns
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            means: Vec::new(),
            scales: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_fitted(&self) -> bool {
        self.means.len() == self.columns.len()
    }

    /// Learned (mean, scale) of `column`
    pub fn stats(&self, column: &str) -> Option<(f64, f64)> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some((*self.means.get(idx)?, *self.scales.get(idx)?))
    }

    pub fn fit(&mut self, table: &Table) -> Result<()> {
        let mut means = Vec::with_capacity(self.columns.len());
        let mut scales = Vec::with_capacity(self.columns.len());

        for name in &self.columns {
            let column = table
                .column(name)
                .ok_or_else(|| Error::schema(format!("missing column '{}'", name)))?;
            let values: Vec<f64> = column.to_numeric().into_iter().flatten().collect();

            if values.is_empty() {
                means.push(0.0);
                scales.push(1.0);
                continue;
            }

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            means.push(mean);
            scales.push(if std > f64::EPSILON * mean.abs().max(1.0) {
                std
            } else {
                1.0
            });
        }

        self.means = means;
        self.scales = scales;
        Ok(())
    }

    /// Standardized values, one `Vec` per row. Nulls are imputed with the
    /// fit-time mean and therefore come out as 0.
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>> {
        if !self.is_fitted() {
            return Err(Error::Pipeline("standard scaler used before fit".into()));
        }

        let mut rows = vec![Vec::with_capacity(self.columns.len()); table.n_rows()];
        for (idx, name) in self.columns.iter().enumerate() {
            let column = table
                .column(name)
                .ok_or_else(|| Error::schema(format!("missing column '{}'", name)))?;
            let (mean, scale) = (self.means[idx], self.scales[idx]);
            for (row, value) in rows.iter_mut().zip(column.to_numeric()) {
                row.push((value.unwrap_or(mean) - mean) / scale);
            }
        }
        Ok(rows)
    }
}
