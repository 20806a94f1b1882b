//! Typed cell values and append-only columns.
//!
//! A Column is an array-like container of values sharing one declared type.
//! Columns only grow: the dataset is loaded once at startup and then read
//! through views, so there is no in-place update or delete. Nullable columns
//! carry a parallel flag vector so numeric scans can skip nulls cheaply.

use crate::error::TableError;
use std::fmt::Debug;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
}

impl ColumnType {
    /// True for the four numeric variants. Only numeric columns may serve
    /// as aggregation measures.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int32 | ColumnType::Int64 | ColumnType::Float32 | ColumnType::Float64
        )
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    Null,
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ColumnValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ColumnValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Widening numeric read: any numeric variant as f64, None otherwise.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ColumnValue::Int32(n) => Some(*n as f64),
            ColumnValue::Int64(n) => Some(*n as f64),
            ColumnValue::Float32(f) => Some(*f as f64),
            ColumnValue::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Canonical string form used as a grouping key. Distinct values always
    /// map to distinct keys because the type tag is part of the format.
    pub(crate) fn group_key(&self) -> String {
        format!("{:?}", self)
    }
}

/// An append-only typed column with optional null tracking.
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    values: Vec<ColumnValue>,
    /// Parallel to `values`; present only for nullable columns.
    null_flags: Option<Vec<bool>>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Column {
            name,
            column_type,
            nullable,
            values: Vec::new(),
            null_flags: if nullable { Some(Vec::new()) } else { None },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate a value against the column's type and nullability.
    fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue, TableError> {
        if value.is_null() {
            if !self.nullable {
                return Err(TableError::NotNullable {
                    column: self.name.clone(),
                });
            }
            return Ok(ColumnValue::Null);
        }

        match (&value, self.column_type) {
            (ColumnValue::Int32(_), ColumnType::Int32)
            | (ColumnValue::Int64(_), ColumnType::Int64)
            | (ColumnValue::Float32(_), ColumnType::Float32)
            | (ColumnValue::Float64(_), ColumnType::Float64)
            | (ColumnValue::String(_), ColumnType::String)
            | (ColumnValue::Bool(_), ColumnType::Bool) => Ok(value),
            _ => Err(TableError::TypeMismatch {
                column: self.name.clone(),
                expected: self.column_type,
                actual: format!("{:?}", value),
            }),
        }
    }

    /// Check a value against the column's type and nullability without
    /// writing it. Lets the table validate a whole row before touching any
    /// column.
    pub(crate) fn validate(&self, value: &ColumnValue) -> Result<(), TableError> {
        self.validate_value(value.clone()).map(|_| ())
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<(), TableError> {
        let value = self.validate_value(value)?;

        if value.is_null() {
            if let Some(ref mut null_flags) = self.null_flags {
                null_flags.push(true);
            }
            // Placeholder keeps `values` parallel to `null_flags`.
            self.values.push(self.default_value());
        } else {
            if let Some(ref mut null_flags) = self.null_flags {
                null_flags.push(false);
            }
            self.values.push(value);
        }

        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<ColumnValue, TableError> {
        if index >= self.values.len() {
            return Err(TableError::RowOutOfRange {
                index,
                len: self.values.len(),
            });
        }
        if self.is_null_at(index) {
            return Ok(ColumnValue::Null);
        }
        Ok(self.values[index].clone())
    }

    /// Fast numeric access without cloning. Returns None for nulls,
    /// non-numeric values, or an out-of-range index. Aggregation loops use
    /// this to skip nulls in one probe.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        if self.is_null_at(index) {
            return None;
        }
        self.values.get(index).and_then(|v| v.as_numeric())
    }

    /// Fast string access without cloning. Returns None for nulls and
    /// non-string values.
    #[inline]
    pub fn get_str(&self, index: usize) -> Option<&str> {
        if self.is_null_at(index) {
            return None;
        }
        self.values.get(index).and_then(|v| v.as_string())
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        match self.null_flags {
            Some(ref flags) => flags.get(index).copied() == Some(true),
            None => false,
        }
    }

    fn default_value(&self) -> ColumnValue {
        match self.column_type {
            ColumnType::Int32 => ColumnValue::Int32(0),
            ColumnType::Int64 => ColumnValue::Int64(0),
            ColumnType::Float32 => ColumnValue::Float32(0.0),
            ColumnType::Float64 => ColumnValue::Float64(0.0),
            ColumnType::String => ColumnValue::String(String::new()),
            ColumnType::Bool => ColumnValue::Bool(false),
        }
    }

    pub fn iter(&self) -> ColumnIterator<'_> {
        ColumnIterator {
            column: self,
            index: 0,
        }
    }
}

pub struct ColumnIterator<'a> {
    column: &'a Column,
    index: usize,
}

impl<'a> Iterator for ColumnIterator<'a> {
    type Item = ColumnValue;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.column.len() {
            None
        } else {
            let result = self.column.get(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, nullable: {}, len: {} }}",
            self.name,
            self.column_type,
            self.nullable,
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_basic() {
        let mut col = Column::new("revenue".to_string(), ColumnType::Float64, false);
        col.append(ColumnValue::Float64(10.0)).unwrap();
        col.append(ColumnValue::Float64(20.0)).unwrap();

        assert_eq!(col.len(), 2);
        assert_eq!(col.get(0).unwrap().as_f64(), Some(10.0));
        assert_eq!(col.get(1).unwrap().as_f64(), Some(20.0));
    }

    #[test]
    fn test_column_nullable() {
        let mut col = Column::new("runtime".to_string(), ColumnType::Int32, true);
        col.append(ColumnValue::Int32(120)).unwrap();
        col.append(ColumnValue::Null).unwrap();

        assert_eq!(col.get(0).unwrap().as_i32(), Some(120));
        assert!(col.get(1).unwrap().is_null());
        assert!(col.is_null_at(1));
        assert!(!col.is_null_at(0));
    }

    #[test]
    fn test_column_rejects_null_when_not_nullable() {
        let mut col = Column::new("title".to_string(), ColumnType::String, false);
        let err = col.append(ColumnValue::Null).unwrap_err();
        assert_eq!(
            err,
            TableError::NotNullable {
                column: "title".to_string()
            }
        );
    }

    #[test]
    fn test_column_rejects_type_mismatch() {
        let mut col = Column::new("year".to_string(), ColumnType::Int32, false);
        let err = col
            .append(ColumnValue::String("1999".to_string()))
            .unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { .. }));
    }

    #[test]
    fn test_get_f64_skips_nulls_and_widens() {
        let mut col = Column::new("votes".to_string(), ColumnType::Int64, true);
        col.append(ColumnValue::Int64(42)).unwrap();
        col.append(ColumnValue::Null).unwrap();

        assert_eq!(col.get_f64(0), Some(42.0));
        assert_eq!(col.get_f64(1), None);
        assert_eq!(col.get_f64(99), None);
    }

    #[test]
    fn test_get_out_of_range() {
        let col = Column::new("x".to_string(), ColumnType::Int32, false);
        assert!(matches!(
            col.get(0),
            Err(TableError::RowOutOfRange { index: 0, len: 0 })
        ));
    }
}
