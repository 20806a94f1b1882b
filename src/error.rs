//! Error types shared across the crate.
//!
//! Every fallible operation is synchronous and local; an error here is a
//! programming or configuration mistake (bad column name, wrong column
//! type), never a transient condition. Empty input is not an error anywhere
//! in the crate: filtering, exploding, or aggregating an empty table yields
//! an empty result.

use crate::column::ColumnType;
use thiserror::Error;

/// Errors raised by tables, views, and aggregations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// The named column is absent from the schema.
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// A measure column was expected to be numeric.
    #[error("column '{column}' is {column_type:?}, not numeric; cannot be used as a measure")]
    InvalidMeasure {
        column: String,
        column_type: ColumnType,
    },

    /// A value (or operation) does not match the column's declared type.
    #[error("column '{column}': expected {expected:?}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: String,
    },

    /// Null written to a column declared non-nullable.
    #[error("column '{column}' is not nullable")]
    NotNullable { column: String },

    /// A row was appended without a value for a schema column.
    #[error("missing value for column '{column}'")]
    MissingColumnValue { column: String },

    /// Row index outside `[0, len)`.
    #[error("row {index} out of range [0, {len})")]
    RowOutOfRange { index: usize, len: usize },

    /// A sorted view needs at least one sort key.
    #[error("at least one sort key is required")]
    EmptySortKeys,
}
