//! Stable sorting and top-N selection.
//!
//! Ranking pages ("top 10 movies by revenue and popularity") sort on one or
//! more keys and take a head. All sorts here are stable, and descending
//! order is applied inside the comparator rather than by reversing the
//! output, so rows tied on every key always keep their original table order.

use crate::column::ColumnValue;
use crate::error::TableError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Sort order specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// A single sort key: a column, an order, and where nulls land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
    /// Whether null values sort before non-null values.
    pub nulls_first: bool,
}

impl SortKey {
    /// Ascending, nulls last.
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Ascending,
            nulls_first: false,
        }
    }

    /// Descending, nulls last.
    pub fn descending(column: impl Into<String>) -> Self {
        SortKey {
            column: column.into(),
            order: SortOrder::Descending,
            nulls_first: false,
        }
    }

    pub fn new(column: impl Into<String>, order: SortOrder, nulls_first: bool) -> Self {
        SortKey {
            column: column.into(),
            order,
            nulls_first,
        }
    }
}

/// Compare two non-null values of the same column. Mixed types fall back to
/// a deterministic debug-format comparison.
pub(crate) fn compare_key_values(a: &ColumnValue, b: &ColumnValue) -> Ordering {
    match (a, b) {
        (ColumnValue::Int32(a), ColumnValue::Int32(b)) => a.cmp(b),
        (ColumnValue::Int64(a), ColumnValue::Int64(b)) => a.cmp(b),
        (ColumnValue::Float32(a), ColumnValue::Float32(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (ColumnValue::Float64(a), ColumnValue::Float64(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (ColumnValue::String(a), ColumnValue::String(b)) => a.cmp(b),
        (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a.cmp(b),
        (a, b) => format!("{:?}", a).cmp(&format!("{:?}", b)),
    }
}

/// Compare two optional values under one sort key.
fn compare_under_key(a: &ColumnValue, b: &ColumnValue, key: &SortKey) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => {
            return if key.nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        (false, true) => {
            return if key.nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        (false, false) => {}
    }

    let base = compare_key_values(a, b);
    match key.order {
        SortOrder::Ascending => base,
        SortOrder::Descending => base.reverse(),
    }
}

/// A view of the parent table in multi-key sorted order.
///
/// # Examples
///
/// ```
/// use facetable::{Table, Schema, ColumnType, ColumnValue, SortedView, SortKey};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let schema = Schema::new(vec![
///     ("title".to_string(), ColumnType::String, false),
///     ("revenue".to_string(), ColumnType::Float64, false),
/// ]);
/// let mut table = Table::new("movies".to_string(), schema);
/// for (title, revenue) in [("Up", 735.0), ("Heat", 187.0)] {
///     let mut row = HashMap::new();
///     row.insert("title".to_string(), ColumnValue::String(title.to_string()));
///     row.insert("revenue".to_string(), ColumnValue::Float64(revenue));
///     table.append_row(row).unwrap();
/// }
///
/// let ranked = SortedView::new(
///     "by_revenue".to_string(),
///     Arc::new(table),
///     vec![SortKey::descending("revenue")],
/// ).unwrap();
///
/// assert_eq!(ranked.get_value(0, "title").unwrap().as_string(), Some("Up"));
/// ```
#[derive(Debug)]
pub struct SortedView {
    name: String,
    parent: Arc<Table>,
    sort_keys: Vec<SortKey>,
    /// sorted_index[view_pos] = parent_row_index
    sorted_index: Vec<usize>,
}

impl SortedView {
    /// Sort the parent table by the given keys (first key is primary).
    pub fn new(
        name: String,
        parent: Arc<Table>,
        sort_keys: Vec<SortKey>,
    ) -> Result<Self, TableError> {
        if sort_keys.is_empty() {
            return Err(TableError::EmptySortKeys);
        }
        for key in &sort_keys {
            parent.column(&key.column)?;
        }

        let mut sorted_index: Vec<usize> = (0..parent.len()).collect();
        sorted_index.sort_by(|&a, &b| {
            for key in &sort_keys {
                let val_a = parent
                    .get_value(a, &key.column)
                    .unwrap_or(ColumnValue::Null);
                let val_b = parent
                    .get_value(b, &key.column)
                    .unwrap_or(ColumnValue::Null);
                let cmp = compare_under_key(&val_a, &val_b, key);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });

        Ok(SortedView {
            name,
            parent,
            sort_keys,
            sorted_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    pub fn len(&self) -> usize {
        self.sorted_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_index.is_empty()
    }

    /// Parent table row index at the given view position.
    pub fn parent_index(&self, view_index: usize) -> Option<usize> {
        self.sorted_index.get(view_index).copied()
    }

    pub fn get_row(&self, index: usize) -> Result<HashMap<String, ColumnValue>, TableError> {
        let parent_index =
            *self
                .sorted_index
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.sorted_index.len(),
                })?;
        self.parent.get_row(parent_index)
    }

    pub fn get_value(&self, index: usize, column: &str) -> Result<ColumnValue, TableError> {
        let parent_index =
            *self
                .sorted_index
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.sorted_index.len(),
                })?;
        self.parent.get_value(parent_index, column)
    }

    /// The first `n` rows in sorted order; all rows if fewer than `n`.
    pub fn head(&self, n: usize) -> Vec<HashMap<String, ColumnValue>> {
        self.sorted_index
            .iter()
            .take(n)
            .filter_map(|&parent_row| self.parent.get_row(parent_row).ok())
            .collect()
    }
}

/// Parent row indexes of the `n` extreme rows by a numeric measure.
///
/// Rows whose measure is null are not candidates; a table with fewer than
/// `n` qualifying rows yields all of them. Ties keep original table order.
/// Fails with `InvalidMeasure` if the measure column is non-numeric.
pub fn top_n(
    table: &Table,
    measure: &str,
    n: usize,
    descending: bool,
) -> Result<Vec<usize>, TableError> {
    let col = table.numeric_column(measure)?;

    let mut candidates: Vec<(usize, f64)> = (0..table.len())
        .filter_map(|i| col.get_f64(i).map(|v| (i, v)))
        .collect();

    candidates.sort_by(|a, b| {
        let cmp = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        if descending {
            cmp.reverse()
        } else {
            cmp
        }
    });
    candidates.truncate(n);

    Ok(candidates.into_iter().map(|(i, _)| i).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::table::Schema;

    fn ranked_table(rows: &[(&str, Option<f64>, f64)]) -> Arc<Table> {
        let schema = Schema::new(vec![
            ("title".to_string(), ColumnType::String, false),
            ("revenue".to_string(), ColumnType::Float64, true),
            ("popularity".to_string(), ColumnType::Float64, false),
        ]);
        let mut table = Table::new("movies".to_string(), schema);
        for (title, revenue, popularity) in rows {
            let mut row = HashMap::new();
            row.insert(
                "title".to_string(),
                ColumnValue::String(title.to_string()),
            );
            row.insert(
                "revenue".to_string(),
                revenue.map_or(ColumnValue::Null, ColumnValue::Float64),
            );
            row.insert(
                "popularity".to_string(),
                ColumnValue::Float64(*popularity),
            );
            table.append_row(row).unwrap();
        }
        Arc::new(table)
    }

    #[test]
    fn test_top_n_basic() {
        let table = ranked_table(&[
            ("A", Some(10.0), 1.0),
            ("B", Some(30.0), 1.0),
            ("C", Some(20.0), 1.0),
        ]);
        assert_eq!(top_n(&table, "revenue", 2, true).unwrap(), vec![1, 2]);
        assert_eq!(top_n(&table, "revenue", 2, false).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_top_n_fewer_rows_than_n() {
        let table = ranked_table(&[("A", Some(1.0), 1.0), ("B", Some(2.0), 1.0)]);
        assert_eq!(top_n(&table, "revenue", 10, true).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_top_n_ties_keep_original_order() {
        let table = ranked_table(&[
            ("A", Some(5.0), 1.0),
            ("B", Some(5.0), 1.0),
            ("C", Some(5.0), 1.0),
        ]);
        assert_eq!(top_n(&table, "revenue", 2, true).unwrap(), vec![0, 1]);
        assert_eq!(top_n(&table, "revenue", 3, false).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_top_n_excludes_null_measures() {
        let table = ranked_table(&[
            ("A", None, 1.0),
            ("B", Some(10.0), 1.0),
            ("C", Some(5.0), 1.0),
        ]);
        assert_eq!(top_n(&table, "revenue", 10, true).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_top_n_invalid_measure() {
        let table = ranked_table(&[]);
        assert!(matches!(
            top_n(&table, "title", 5, true),
            Err(TableError::InvalidMeasure { .. })
        ));
        assert!(matches!(
            top_n(&table, "budget", 5, true),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_sorted_view_multi_key() {
        let table = ranked_table(&[
            ("A", Some(10.0), 2.0),
            ("B", Some(20.0), 1.0),
            ("C", Some(10.0), 9.0),
        ]);
        let view = SortedView::new(
            "rank".to_string(),
            table,
            vec![SortKey::descending("revenue"), SortKey::descending("popularity")],
        )
        .unwrap();

        let order: Vec<&str> = (0..view.len())
            .map(|i| view.parent_index(i).unwrap())
            .map(|i| ["A", "B", "C"][i])
            .collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_sorted_view_nulls_last_by_default() {
        let table = ranked_table(&[
            ("A", None, 1.0),
            ("B", Some(1.0), 1.0),
            ("C", Some(2.0), 1.0),
        ]);
        let view = SortedView::new(
            "rank".to_string(),
            table.clone(),
            vec![SortKey::descending("revenue")],
        )
        .unwrap();
        assert_eq!(view.get_value(2, "title").unwrap().as_string(), Some("A"));

        let view = SortedView::new(
            "rank".to_string(),
            table,
            vec![SortKey::new("revenue", SortOrder::Descending, true)],
        )
        .unwrap();
        assert_eq!(view.get_value(0, "title").unwrap().as_string(), Some("A"));
    }

    #[test]
    fn test_sorted_view_head() {
        let table = ranked_table(&[
            ("A", Some(1.0), 1.0),
            ("B", Some(3.0), 1.0),
            ("C", Some(2.0), 1.0),
        ]);
        let view = SortedView::new(
            "rank".to_string(),
            table,
            vec![SortKey::descending("revenue")],
        )
        .unwrap();

        let head = view.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head[0].get("title").unwrap().as_string(), Some("B"));

        assert_eq!(view.head(10).len(), 3);
    }

    #[test]
    fn test_sorted_view_requires_keys_and_columns() {
        let table = ranked_table(&[]);
        assert!(matches!(
            SortedView::new("rank".to_string(), table.clone(), vec![]),
            Err(TableError::EmptySortKeys)
        ));
        assert!(matches!(
            SortedView::new(
                "rank".to_string(),
                table,
                vec![SortKey::ascending("budget")]
            ),
            Err(TableError::ColumnNotFound { .. })
        ));
    }
}
