//! Error types for mdsheet-core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mdsheet-core
#[derive(Debug, Error)]
pub enum Error {
    /// Row index does not exist in the table
    #[error("row {index} out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    /// Column index does not exist in the table
    #[error("column {index} out of range (table has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },

    /// No column with the given header
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// No sheet with the given name
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    /// Sheet index does not exist in the workbook
    #[error("sheet {index} out of range (workbook has {len} sheets)")]
    SheetIndexOutOfRange { index: usize, len: usize },

    /// Table index does not exist in the sheet
    #[error("table {index} out of range (sheet '{sheet}' has {len} tables)")]
    TableIndexOutOfRange {
        sheet: String,
        index: usize,
        len: usize,
    },

    /// Table operation on a document sheet
    #[error("sheet '{0}' is a document sheet and holds no tables")]
    DocumentSheet(String),

    /// One or more rows failed model conversion
    #[error("validation failed with {} error(s): {}", .0.len(), join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A metadata comment carried malformed JSON
    #[error("malformed metadata on line {line}: {source}")]
    MetadataDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A schema option is inconsistent
    #[error("invalid schema: {0}")]
    Configuration(String),

    /// Patch edit failed; the workbook was left untouched
    #[error("edit #{index} failed: {source}")]
    Patch {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single row that failed to convert under a conversion schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}{}: {message}", field_suffix(.field))]
pub struct ValidationError {
    /// Zero-based data row index
    pub row: usize,
    /// Field that failed, when the failure is field-level
    pub field: Option<String>,
    /// Human-readable reason
    pub message: String,
}

impl ValidationError {
    /// Failure attributed to one field of a row
    pub fn field(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Failure attributed to the whole row
    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: message.into(),
        }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(name) => format!(", field '{}'", name),
        None => String::new(),
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::field(2, "age", "invalid digit");
        assert_eq!(err.to_string(), "row 2, field 'age': invalid digit");

        let err = ValidationError::row(0, "missing field `id`");
        assert_eq!(err.to_string(), "row 0: missing field `id`");
    }

    #[test]
    fn test_aggregate_display() {
        let err = Error::Validation(vec![
            ValidationError::field(0, "id", "empty"),
            ValidationError::row(3, "bad"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed with 2 error(s): row 0, field 'id': empty; row 3: bad"
        );
    }
}
