//! JSON reporter
//!
//! Pretty-printed JSON of any report type. Useful for machine
//! consumption, piping to jq, or further processing.

use anyhow::Result;
use serde::Serialize;

/// Render a value as JSON
pub fn render<T: Serialize + ?Sized>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
