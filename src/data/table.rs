//! Column-oriented in-memory table
//!
//! Columns are either numeric or textual; every cell may be null. Tables
//! are value types: transformations return a new table and leave the
//! input untouched.

use crate::error::{Error, Result};

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; text is parsed leniently. NaN and
    /// infinities read as null.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Value::Text(s) => parse_number(s),
        }
    }

    /// Textual view of the cell; numbers are formatted
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Number(n) => Some(format_number(*n)),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse a number the way messy spreadsheet exports need it.
///
/// Currency symbols, mis-decoded bytes and (non-breaking) spaces are
/// stripped. A lone comma is a decimal comma; when both `.` and `,`
/// appear the dots are thousands separators. Anything that still fails
/// to parse is `None`, never an error.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '€' | 'Â' | '\u{a0}' | '\u{80}' | ' ' | '\t'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A typed column of optional cells
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            Column::Numeric(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Number),
            Column::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Value::Null, Value::Text),
        }
    }

    /// Numeric copy of this column; unparseable text and non-finite
    /// numbers become null
    pub fn to_numeric(&self) -> Vec<Option<f64>> {
        match self {
            Column::Numeric(v) => v
                .iter()
                .map(|cell| cell.filter(|n| n.is_finite()))
                .collect(),
            Column::Text(v) => v
                .iter()
                .map(|cell| cell.as_deref().and_then(parse_number))
                .collect(),
        }
    }

    /// Textual copy of this column
    pub fn to_text(&self) -> Vec<Option<String>> {
        match self {
            Column::Numeric(v) => v.iter().map(|cell| cell.map(format_number)).collect(),
            Column::Text(v) => v.clone(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

/// A single row with named cells, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Ordered, named columns of equal length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insertion
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self> {
        self.set_column(name, column)?;
        Ok(self)
    }

    /// Insert or replace a column. The first column fixes the row count.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<()> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(Error::schema(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.rows
            )));
        }

        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Names from `required` that this table lacks
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    /// Copy without the named columns (absent names are ignored)
    pub fn drop_columns(&self, names: &[&str]) -> Table {
        let mut out = Table {
            rows: self.rows,
            ..Table::default()
        };
        for (name, column) in self.names.iter().zip(&self.columns) {
            if !names.contains(&name.as_str()) {
                out.names.push(name.clone());
                out.columns.push(column.clone());
            }
        }
        out
    }

    /// Copy containing only the given rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            rows: rows.len(),
        }
    }

    pub fn row(&self, idx: usize) -> Record {
        let mut record = Record::new();
        for (name, column) in self.names.iter().zip(&self.columns) {
            record.set(name, column.get(idx));
        }
        record
    }

    /// Build a table from records.
    ///
    /// Column order follows first appearance. A column is numeric when all
    /// of its non-null cells are numbers, textual otherwise. Fields a record
    /// lacks are null in that row.
    pub fn from_records(records: &[Record]) -> Table {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            for (name, _) in record.fields() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }

        let mut table = Table {
            rows: records.len(),
            ..Table::default()
        };
        for name in names {
            let cells: Vec<Value> = records
                .iter()
                .map(|r| r.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            let all_numeric = cells
                .iter()
                .all(|v| matches!(v, Value::Null | Value::Number(_)));
            let column = if all_numeric {
                Column::Numeric(cells.iter().map(Value::as_f64).collect())
            } else {
                Column::Text(cells.iter().map(Value::as_text).collect())
            };
            table.names.push(name);
            table.columns.push(column);
        }
        table
    }
}
