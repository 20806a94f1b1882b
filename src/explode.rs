//! Multi-valued field flattening.
//!
//! Dataset columns like `genres`, `cast`, or `production_countries` store a
//! delimited list in one text cell (`"Action|Drama"`). A [`CategoryView`]
//! flattens such a column into one (record, category) pair per token, the
//! long-form shape every per-category chart groups over. The view is derived
//! on demand and never persisted; build a fresh one when the request changes.
//!
//! Records whose cell is null or empty contribute no pairs. They disappear
//! from category-based charts but stay reachable through the parent table,
//! so a page that needs both keeps the parent handle alongside the view.

use crate::aggregate::{aggregate_pairs, measure_reader, AggregationSpec, GroupEntry};
use crate::column::{ColumnType, ColumnValue};
use crate::error::TableError;
use crate::table::Table;
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Split one multi-valued cell into category tokens.
///
/// Tokens are trimmed of surrounding whitespace and empty tokens are
/// dropped, so `"Action | Drama|"` with delimiter `'|'` yields
/// `["Action", "Drama"]` and an empty cell yields nothing — never a spurious
/// `""` category.
pub fn split_tokens(cell: &str, delimiter: char) -> Vec<&str> {
    cell.split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// The full category set of one record, computed from the unexploded cell.
/// A null cell yields an empty set.
pub fn category_set(
    table: &Table,
    row: usize,
    column: &str,
    delimiter: char,
) -> Result<HashSet<String>, TableError> {
    if row >= table.len() {
        return Err(TableError::RowOutOfRange {
            index: row,
            len: table.len(),
        });
    }
    let col = table.column(column)?;
    let mut set = HashSet::new();
    if let Some(cell) = col.get_str(row) {
        for token in split_tokens(cell, delimiter) {
            set.insert(token.to_string());
        }
    }
    Ok(set)
}

/// A long-form view of a multi-valued column: one row per
/// (record, category) pair, in parent row order with tokens in cell order.
///
/// # Examples
///
/// ```
/// use facetable::{Table, Schema, ColumnType, ColumnValue, CategoryView};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let schema = Schema::new(vec![
///     ("title".to_string(), ColumnType::String, false),
///     ("genres".to_string(), ColumnType::String, true),
/// ]);
/// let mut table = Table::new("movies".to_string(), schema);
/// let mut row = HashMap::new();
/// row.insert("title".to_string(), ColumnValue::String("Heat".to_string()));
/// row.insert("genres".to_string(), ColumnValue::String("Action|Crime".to_string()));
/// table.append_row(row).unwrap();
///
/// let view = CategoryView::new(
///     "by_genre".to_string(),
///     Arc::new(table),
///     "genres",
///     '|',
/// ).unwrap();
///
/// assert_eq!(view.len(), 2);
/// assert_eq!(view.category(0), Some("Action"));
/// assert_eq!(view.category(1), Some("Crime"));
/// ```
pub struct CategoryView {
    name: String,
    parent: Arc<Table>,
    column: String,
    delimiter: char,
    /// One entry per (parent_row, category) pair.
    pairs: Vec<(usize, String)>,
}

impl CategoryView {
    /// Flatten `column` (a String column) of the parent table.
    ///
    /// Errors with `ColumnNotFound` if the column is absent and
    /// `TypeMismatch` if it is not a String column.
    pub fn new(
        name: String,
        parent: Arc<Table>,
        column: &str,
        delimiter: char,
    ) -> Result<Self, TableError> {
        let rows: Vec<usize> = (0..parent.len()).collect();
        Self::over_rows(name, parent, column, delimiter, &rows)
    }

    /// Flatten `column` for a subset of parent rows, in the given order.
    /// Used by filter views to explode only the rows they kept.
    pub(crate) fn over_rows(
        name: String,
        parent: Arc<Table>,
        column: &str,
        delimiter: char,
        rows: &[usize],
    ) -> Result<Self, TableError> {
        let col = parent.column(column)?;
        if col.column_type() != ColumnType::String {
            return Err(TableError::TypeMismatch {
                column: column.to_string(),
                expected: ColumnType::String,
                actual: format!("{:?}", col.column_type()),
            });
        }

        let mut pairs = Vec::new();
        let mut skipped = 0usize;
        for &i in rows {
            match col.get_str(i) {
                Some(cell) => {
                    let before = pairs.len();
                    for token in split_tokens(cell, delimiter) {
                        pairs.push((i, token.to_string()));
                    }
                    if pairs.len() == before {
                        skipped += 1; // cell held only whitespace/delimiters
                    }
                }
                None => skipped += 1,
            }
        }

        debug!(
            "category view '{}': {} pairs from {} rows ({} without categories)",
            name,
            pairs.len(),
            rows.len(),
            skipped
        );

        Ok(CategoryView {
            name,
            parent,
            column: column.to_string(),
            delimiter,
            pairs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The multi-valued column this view flattens.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The category token of pair `index`.
    pub fn category(&self, index: usize) -> Option<&str> {
        self.pairs.get(index).map(|(_, c)| c.as_str())
    }

    /// The parent table row of pair `index`.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.pairs.get(index).map(|(row, _)| *row)
    }

    /// The parent row with the multi-valued cell replaced by this pair's
    /// single category token.
    pub fn get_row(&self, index: usize) -> Result<HashMap<String, ColumnValue>, TableError> {
        let (parent_row, category) =
            self.pairs
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.pairs.len(),
                })?;
        let mut row = self.parent.get_row(*parent_row)?;
        row.insert(self.column.clone(), ColumnValue::String(category.clone()));
        Ok(row)
    }

    pub fn get_value(&self, index: usize, column: &str) -> Result<ColumnValue, TableError> {
        let (parent_row, category) =
            self.pairs
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.pairs.len(),
                })?;
        if column == self.column {
            return Ok(ColumnValue::String(category.clone()));
        }
        self.parent.get_value(*parent_row, column)
    }

    /// Sorted unique category values, e.g. the option list for a multiselect
    /// widget.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.pairs.iter().map(|(_, c)| c.as_str()).collect();
        set.into_iter().map(|c| c.to_string()).collect()
    }

    /// Group the pairs and reduce a measure, per `spec`. Grouping by the
    /// exploded column uses each pair's category; any other group-by column
    /// and the measure are read from the parent row of the pair.
    pub fn aggregate(&self, spec: &AggregationSpec) -> Result<Vec<GroupEntry>, TableError> {
        let read_measure = measure_reader(&self.parent, &spec.measure, spec.reducer)?;

        if spec.group_by == self.column {
            let pairs = self.pairs.iter().map(|(parent_row, category)| {
                (
                    ColumnValue::String(category.clone()),
                    read_measure(*parent_row),
                )
            });
            Ok(aggregate_pairs(pairs, spec))
        } else {
            let group_col = self.parent.column(&spec.group_by)?;
            let pairs = self.pairs.iter().filter_map(|(parent_row, _)| {
                let key = group_col.get(*parent_row).ok()?;
                if key.is_null() {
                    return None;
                }
                Some((key, read_measure(*parent_row)))
            });
            Ok(aggregate_pairs(pairs, spec))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Schema;

    fn movie_table(rows: &[(&str, Option<&str>, Option<f64>)]) -> Arc<Table> {
        let schema = Schema::new(vec![
            ("title".to_string(), ColumnType::String, false),
            ("genres".to_string(), ColumnType::String, true),
            ("revenue".to_string(), ColumnType::Float64, true),
        ]);
        let mut table = Table::new("movies".to_string(), schema);
        for (title, genres, revenue) in rows {
            let mut row = HashMap::new();
            row.insert(
                "title".to_string(),
                ColumnValue::String(title.to_string()),
            );
            row.insert(
                "genres".to_string(),
                genres.map_or(ColumnValue::Null, |g| {
                    ColumnValue::String(g.to_string())
                }),
            );
            row.insert(
                "revenue".to_string(),
                revenue.map_or(ColumnValue::Null, ColumnValue::Float64),
            );
            table.append_row(row).unwrap();
        }
        Arc::new(table)
    }

    #[test]
    fn test_split_tokens_trims_and_drops_empties() {
        assert_eq!(split_tokens("Action | Drama|", '|'), vec!["Action", "Drama"]);
        assert_eq!(split_tokens("Action,Drama", ','), vec!["Action", "Drama"]);
        assert_eq!(split_tokens("", '|'), Vec::<&str>::new());
        assert_eq!(split_tokens("  |  ", '|'), Vec::<&str>::new());
        assert_eq!(split_tokens("Science Fiction", '|'), vec!["Science Fiction"]);
    }

    #[test]
    fn test_explode_pair_count_matches_token_count() {
        let table = movie_table(&[
            ("A", Some("Action,Drama"), Some(10.0)),
            ("B", Some("Action"), Some(20.0)),
            ("C", None, Some(5.0)),
        ]);
        let view =
            CategoryView::new("by_genre".to_string(), table, "genres", ',').unwrap();

        // One pair per token of each non-null cell.
        assert_eq!(view.len(), 3);
        assert_eq!(view.parent_index(0), Some(0));
        assert_eq!(view.category(0), Some("Action"));
        assert_eq!(view.category(1), Some("Drama"));
        assert_eq!(view.parent_index(2), Some(1));
        assert_eq!(view.category(2), Some("Action"));
    }

    #[test]
    fn test_exploded_row_substitutes_single_category() {
        let table = movie_table(&[("A", Some("Action,Drama"), Some(10.0))]);
        let view =
            CategoryView::new("by_genre".to_string(), table, "genres", ',').unwrap();

        let row = view.get_row(1).unwrap();
        assert_eq!(row.get("genres").unwrap().as_string(), Some("Drama"));
        assert_eq!(row.get("title").unwrap().as_string(), Some("A"));
        assert_eq!(view.get_value(1, "genres").unwrap().as_string(), Some("Drama"));
        assert_eq!(view.get_value(1, "revenue").unwrap().as_f64(), Some(10.0));
    }

    #[test]
    fn test_null_cells_contribute_no_pairs() {
        let table = movie_table(&[("A", None, Some(10.0)), ("B", Some(""), Some(1.0))]);
        let view =
            CategoryView::new("by_genre".to_string(), table.clone(), "genres", ',')
                .unwrap();
        assert!(view.is_empty());
        // The records stay reachable through the parent table.
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_categories_sorted_unique() {
        let table = movie_table(&[
            ("A", Some("Drama,Action"), None),
            ("B", Some("Action,Comedy"), None),
        ]);
        let view =
            CategoryView::new("by_genre".to_string(), table, "genres", ',').unwrap();
        assert_eq!(view.categories(), vec!["Action", "Comedy", "Drama"]);
    }

    #[test]
    fn test_category_set_uses_unexploded_cell() {
        let table = movie_table(&[("A", Some("Action, Drama"), None)]);
        let set = category_set(&table, 0, "genres", ',').unwrap();
        assert!(set.contains("Action"));
        assert!(set.contains("Drama"));
        assert_eq!(set.len(), 2);

        let table = movie_table(&[("A", None, None)]);
        assert!(category_set(&table, 0, "genres", ',').unwrap().is_empty());
    }

    #[test]
    fn test_explode_missing_column() {
        let table = movie_table(&[]);
        assert!(matches!(
            CategoryView::new("v".to_string(), table, "cast", '|'),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_explode_non_string_column() {
        let table = movie_table(&[]);
        assert!(matches!(
            CategoryView::new("v".to_string(), table, "revenue", '|'),
            Err(TableError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregate_sum_by_exploded_column() {
        let table = movie_table(&[
            ("A", Some("Action,Drama"), Some(10.0)),
            ("B", Some("Action"), Some(20.0)),
        ]);
        let view =
            CategoryView::new("by_genre".to_string(), table, "genres", ',').unwrap();

        let result = view
            .aggregate(&AggregationSpec::sum("genres", "revenue"))
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].key.as_string(), Some("Action"));
        assert_eq!(result[0].value, 30.0);
        assert_eq!(result[1].key.as_string(), Some("Drama"));
        assert_eq!(result[1].value, 10.0);
    }

    #[test]
    fn test_aggregate_by_parent_column() {
        let table = movie_table(&[
            ("A", Some("Action,Drama"), Some(10.0)),
            ("B", Some("Comedy"), Some(20.0)),
        ]);
        let view =
            CategoryView::new("by_genre".to_string(), table, "genres", ',').unwrap();

        // Counting pairs per title: A exploded into two, B into one.
        let result = view
            .aggregate(&AggregationSpec::count("title", "genres"))
            .unwrap();
        assert_eq!(result[0].key.as_string(), Some("A"));
        assert_eq!(result[0].value, 2.0);
        assert_eq!(result[1].value, 1.0);
    }
}
