//! Schema and root table.
//!
//! A Table is a collection of typed columns with a schema. The intended
//! lifecycle is: build once at startup (append rows from whatever loader the
//! host application uses), freeze behind an `Arc`, and hand that handle to
//! every dashboard page. Views never mutate the table, so concurrent readers
//! in separate contexts need no synchronization.
//!
//! # Examples
//!
//! ```
//! use facetable::{Table, Schema, ColumnType, ColumnValue};
//! use std::collections::HashMap;
//!
//! let schema = Schema::new(vec![
//!     ("title".to_string(), ColumnType::String, false),
//!     ("revenue".to_string(), ColumnType::Float64, true),
//! ]);
//!
//! let mut table = Table::new("movies".to_string(), schema);
//!
//! let mut row = HashMap::new();
//! row.insert("title".to_string(), ColumnValue::String("Alien".to_string()));
//! row.insert("revenue".to_string(), ColumnValue::Float64(104.9));
//! table.append_row(row).unwrap();
//!
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.get_value(0, "title").unwrap().as_string(), Some("Alien"));
//! ```

use crate::aggregate::{aggregate_pairs, measure_reader, AggregationSpec, GroupEntry};
use crate::column::{Column, ColumnType, ColumnValue};
use crate::error::TableError;
use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;

/// Schema definition with column names, types, and nullability.
///
/// # Examples
///
/// ```
/// use facetable::{Schema, ColumnType};
///
/// let schema = Schema::new(vec![
///     ("title".to_string(), ColumnType::String, false),
///     ("genres".to_string(), ColumnType::String, true),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get_column_index("genres"), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
}

impl Schema {
    /// Creates a new schema from `(column_name, column_type, is_nullable)`
    /// triples.
    pub fn new(columns: Vec<(String, ColumnType, bool)>) -> Self {
        Schema { columns }
    }

    /// Returns the number of columns in the schema.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns a list of all column names.
    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Returns the index of a column by name, or None if not found.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// Returns (name, type, nullable) for the column at `index`.
    pub fn get_column_info(&self, index: usize) -> Option<(&str, ColumnType, bool)> {
        self.columns
            .get(index)
            .map(|(name, ty, nullable)| (name.as_str(), *ty, *nullable))
    }

    /// Returns the type of a column by name, or None if not found.
    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }

    /// Returns whether a column is nullable by name, or None if not found.
    pub fn is_column_nullable(&self, name: &str) -> Option<bool> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, nullable)| *nullable)
    }
}

/// Root table owning its data.
pub struct Table {
    name: String,
    schema: Schema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(name: String, schema: Schema) -> Self {
        let columns: Vec<Column> = schema
            .columns
            .iter()
            .map(|(col_name, col_type, nullable)| {
                Column::new(col_name.clone(), *col_type, *nullable)
            })
            .collect();

        Table {
            name,
            schema,
            columns,
            row_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Borrow a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        let idx = self
            .schema
            .get_column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound {
                column: name.to_string(),
            })?;
        Ok(&self.columns[idx])
    }

    pub fn get_value(&self, row: usize, column: &str) -> Result<ColumnValue, TableError> {
        self.column(column)?.get(row)
    }

    pub fn get_row(&self, row: usize) -> Result<HashMap<String, ColumnValue>, TableError> {
        if row >= self.row_count {
            return Err(TableError::RowOutOfRange {
                index: row,
                len: self.row_count,
            });
        }

        let mut result = HashMap::new();
        for (i, col) in self.columns.iter().enumerate() {
            let col_name = self.schema.get_column_info(i).map(|(n, _, _)| n);
            if let Some(col_name) = col_name {
                result.insert(col_name.to_string(), col.get(row)?);
            }
        }

        Ok(result)
    }

    /// Append one row. Every schema column must be present in the map; value
    /// types are validated before anything is written, so a failed append
    /// leaves the table unchanged.
    pub fn append_row(&mut self, row: HashMap<String, ColumnValue>) -> Result<(), TableError> {
        for col_name in self.schema.get_column_names() {
            if !row.contains_key(col_name) {
                return Err(TableError::MissingColumnValue {
                    column: col_name.to_string(),
                });
            }
        }

        // Validate all values up front so a mid-row type error cannot leave
        // columns at uneven lengths.
        for (i, col) in self.columns.iter().enumerate() {
            let (col_name, _, _) = self.schema.columns[i].clone();
            col.validate(&row[&col_name])?;
        }

        for (i, col) in self.columns.iter_mut().enumerate() {
            let (col_name, _, _) = &self.schema.columns[i];
            let value = row[col_name].clone();
            col.append(value)?;
        }

        self.row_count += 1;
        Ok(())
    }

    /// Append multiple rows (bulk load). All rows are validated for column
    /// presence before any row is inserted; returns the number of rows
    /// appended.
    pub fn append_rows(
        &mut self,
        rows: Vec<HashMap<String, ColumnValue>>,
    ) -> Result<usize, TableError> {
        if rows.is_empty() {
            return Ok(0);
        }

        for row in rows.iter() {
            for col_name in self.schema.get_column_names() {
                if !row.contains_key(col_name) {
                    return Err(TableError::MissingColumnValue {
                        column: col_name.to_string(),
                    });
                }
            }
        }

        let num_rows = rows.len();
        for row in rows {
            self.append_row(row)?;
        }

        debug!("table '{}': loaded {} rows ({} total)", self.name, num_rows, self.row_count);
        Ok(num_rows)
    }

    pub fn iter_rows(&self) -> TableRowIterator<'_> {
        TableRowIterator {
            table: self,
            index: 0,
        }
    }

    // ========================================================================
    // Whole-column aggregation
    // ========================================================================

    /// Sum of all numeric values in a column. Nulls are skipped, never
    /// treated as zero.
    pub fn sum(&self, column: &str) -> Result<f64, TableError> {
        let col = self.numeric_column(column)?;
        let mut total = 0.0;
        for i in 0..self.row_count {
            if let Some(num) = col.get_f64(i) {
                total += num;
            }
        }
        Ok(total)
    }

    /// Number of non-null values in a column.
    pub fn count_non_null(&self, column: &str) -> Result<usize, TableError> {
        let col = self.column(column)?;
        let mut count = 0;
        for i in 0..self.row_count {
            if !col.is_null_at(i) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Mean of all numeric values in a column. Nulls are excluded from both
    /// numerator and denominator; None if no non-null values exist.
    pub fn avg(&self, column: &str) -> Result<Option<f64>, TableError> {
        let col = self.numeric_column(column)?;
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..self.row_count {
            if let Some(num) = col.get_f64(i) {
                sum += num;
                count += 1;
            }
        }
        if count > 0 {
            Ok(Some(sum / count as f64))
        } else {
            Ok(None)
        }
    }

    /// Minimum numeric value in a column, skipping nulls. None if no
    /// non-null values exist.
    pub fn min(&self, column: &str) -> Result<Option<f64>, TableError> {
        let col = self.numeric_column(column)?;
        let mut min_val: Option<f64> = None;
        for i in 0..self.row_count {
            if let Some(num) = col.get_f64(i) {
                min_val = Some(min_val.map_or(num, |m| m.min(num)));
            }
        }
        Ok(min_val)
    }

    /// Maximum numeric value in a column, skipping nulls. None if no
    /// non-null values exist.
    pub fn max(&self, column: &str) -> Result<Option<f64>, TableError> {
        let col = self.numeric_column(column)?;
        let mut max_val: Option<f64> = None;
        for i in 0..self.row_count {
            if let Some(num) = col.get_f64(i) {
                max_val = Some(max_val.map_or(num, |m| m.max(num)));
            }
        }
        Ok(max_val)
    }

    /// Group rows by a column and reduce a measure, per `spec`. See
    /// [`AggregationSpec`] for grouping, reducer, and ordering semantics.
    pub fn aggregate(&self, spec: &AggregationSpec) -> Result<Vec<GroupEntry>, TableError> {
        let group_col = self.column(&spec.group_by)?;
        let read_measure = measure_reader(self, &spec.measure, spec.reducer)?;

        let pairs = (0..self.row_count).filter_map(|i| {
            let key = group_col.get(i).ok()?;
            if key.is_null() {
                return None; // null group keys form no group
            }
            Some((key, read_measure(i)))
        });

        Ok(aggregate_pairs(pairs, spec))
    }

    /// Borrow a column, insisting that it is numeric.
    pub(crate) fn numeric_column(&self, name: &str) -> Result<&Column, TableError> {
        let col = self.column(name)?;
        if !col.column_type().is_numeric() {
            return Err(TableError::InvalidMeasure {
                column: name.to_string(),
                column_type: col.column_type(),
            });
        }
        Ok(col)
    }
}

pub struct TableRowIterator<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Iterator for TableRowIterator<'a> {
    type Item = HashMap<String, ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.len() {
            None
        } else {
            let result = self.table.get_row(self.index).ok();
            self.index += 1;
            result
        }
    }
}

impl Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', columns: {}, rows: {} }}",
            self.name,
            self.schema.len(),
            self.row_count
        )
    }
}
