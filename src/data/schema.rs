//! Column names of the book dataset

use super::table::Table;
use crate::error::{Error, Result};

pub const PUBLISHING_YEAR: &str = "Publishing_Year";
pub const AUTHOR: &str = "Author";
pub const AUTHOR_RATING: &str = "Author_Rating";
pub const AVERAGE_RATING: &str = "Average_Rating";
pub const RATING_COUNT: &str = "Rating_Count";
pub const GROSS_SALES: &str = "Gross_Sales_EUR";
pub const LANGUAGE_CODE: &str = "Language_Code";
pub const GENRE: &str = "Genre";
pub const PUBLISHER: &str = "Publisher";
pub const LABEL: &str = "Adapted_to_Film";
pub const BOOK_NAME: &str = "Book_Name";

/// Standardized features, in matrix order
pub const NUMERIC_FEATURES: &[&str] = &[
    PUBLISHING_YEAR,
    AUTHOR_RATING,
    AVERAGE_RATING,
    RATING_COUNT,
    GROSS_SALES,
];

/// One-hot encoded features, in matrix order
pub const CATEGORICAL_FEATURES: &[&str] = &[LANGUAGE_CODE, GENRE, PUBLISHER, AUTHOR];

/// Categorical features whose rare values are collapsed before encoding
pub const COLLAPSED_FEATURES: &[&str] = &[PUBLISHER, AUTHOR];

/// Every column a record must carry to be scored
pub const FEATURE_COLUMNS: &[&str] = &[
    PUBLISHING_YEAR,
    AUTHOR,
    AUTHOR_RATING,
    AVERAGE_RATING,
    RATING_COUNT,
    GROSS_SALES,
    LANGUAGE_CODE,
    GENRE,
    PUBLISHER,
];

/// Every column a training file must carry
pub const TRAINING_COLUMNS: &[&str] = &[
    PUBLISHING_YEAR,
    AUTHOR,
    AUTHOR_RATING,
    AVERAGE_RATING,
    RATING_COUNT,
    GROSS_SALES,
    LANGUAGE_CODE,
    GENRE,
    PUBLISHER,
    LABEL,
    BOOK_NAME,
];

/// Columns parsed as numbers when loading delimited files.
/// `Author_Rating` stays textual until the normalizer maps it.
pub const NUMERIC_INPUT_COLUMNS: &[&str] = &[
    PUBLISHING_YEAR,
    AVERAGE_RATING,
    RATING_COUNT,
    GROSS_SALES,
    LABEL,
];

/// Fail with a schema error naming every missing column
pub fn require_columns(table: &Table, required: &[&str]) -> Result<()> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        return Ok(());
    }
    Err(Error::schema(format!(
        "missing required column(s): {}",
        missing.join(", ")
    )))
}

/// `Adapted_to_Film` as optional 0/1 labels.
///
/// Null cells stay `None`; any other value is a schema error.
pub fn binary_labels(table: &Table) -> Result<Vec<Option<u8>>> {
    let column = table
        .column(LABEL)
        .ok_or_else(|| Error::schema(format!("missing label column '{}'", LABEL)))?;
    column
        .to_numeric()
        .into_iter()
        .zip(column.to_text())
        .enumerate()
        .map(|(row, (value, raw))| match (value, raw) {
            (Some(v), _) if v == 0.0 => Ok(Some(0)),
            (Some(v), _) if v == 1.0 => Ok(Some(1)),
            (None, None) => Ok(None),
            (_, raw) => Err(Error::schema(format!(
                "row {}: label '{}' is not 0 or 1",
                row + 1,
                raw.unwrap_or_default()
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Column;

    #[test]
    fn test_require_columns_lists_all_missing() {
        let table = Table::new()
            .with_column(GENRE, Column::Text(vec![Some("Fantasy".into())]))
            .unwrap();
        let err = require_columns(&table, &[GENRE, PUBLISHER, AUTHOR]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Publisher"));
        assert!(msg.contains("Author"));
        assert!(!msg.contains("Genre"));
    }

    #[test]
    fn test_feature_groups_cover_feature_columns() {
        for name in FEATURE_COLUMNS {
            assert!(
                NUMERIC_FEATURES.contains(name) || CATEGORICAL_FEATURES.contains(name),
                "{name} is in neither feature group"
            );
        }
        assert_eq!(
            NUMERIC_FEATURES.len() + CATEGORICAL_FEATURES.len(),
            FEATURE_COLUMNS.len()
        );
    }

    #[test]
    fn test_binary_labels() {
        let table = Table::new()
            .with_column(LABEL, Column::Numeric(vec![Some(1.0), None, Some(0.0)]))
            .unwrap();
        assert_eq!(binary_labels(&table).unwrap(), vec![Some(1), None, Some(0)]);

        let table = Table::new()
            .with_column(LABEL, Column::Text(vec![Some("1".into()), Some("yes".into())]))
            .unwrap();
        let err = binary_labels(&table).unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let table = Table::new()
            .with_column(LABEL, Column::Numeric(vec![Some(2.0)]))
            .unwrap();
        assert!(matches!(binary_labels(&table), Err(Error::Schema(_))));
        assert!(matches!(binary_labels(&Table::new()), Err(Error::Schema(_))));
    }
}
