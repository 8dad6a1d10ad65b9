//! Tabular data: in-memory tables, the book schema, loading and cleaning

pub mod cleaning;
pub mod loader;
pub mod schema;
pub mod table;

pub use cleaning::{reconcile_author_ratings, ReconcilePolicy};
pub use loader::{load_table, read_table, LoadOptions};
pub use table::{parse_number, Column, Record, Table, Value};
