//! Delimited-file loading
//!
//! Reads a headered, delimited UTF-8 file into a [`Table`]. Known numeric
//! columns are parsed leniently (see [`parse_number`]); a cell that does
//! not parse becomes null and is counted, never fatal.

use super::schema::NUMERIC_INPUT_COLUMNS;
use super::table::{parse_number, Column, Table};
use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Options for reading delimited data
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

/// Load a delimited file from disk
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let table = read_table(file, options)?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

/// Read delimited data from any reader
pub fn read_table<R: Read>(reader: R, options: &LoadOptions) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in reader.records() {
        let row = row?;
        for (idx, cell) in row.iter().enumerate() {
            let cell = if cell.is_empty() {
                None
            } else {
                Some(cell.to_string())
            };
            raw[idx].push(cell);
        }
    }

    let mut table = Table::new();
    for (name, cells) in headers.iter().zip(raw) {
        let column = if NUMERIC_INPUT_COLUMNS.contains(&name.as_str()) {
            let parsed: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.as_deref().and_then(parse_number))
                .collect();
            let failed = cells
                .iter()
                .zip(&parsed)
                .filter(|(raw, parsed)| raw.is_some() && parsed.is_none())
                .count();
            if failed > 0 {
                warn!("{} unparseable value(s) in '{}' set to null", failed, name);
            }
            Column::Numeric(parsed)
        } else {
            Column::Text(cells)
        };
        table.set_column(name, column)?;
    }

    Ok(table)
}
