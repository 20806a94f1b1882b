//! Selection-set and range filtering.
//!
//! A [`FilterSpec`] is the plain-data shape of a multiselect widget: a set
//! of selected category values and whether a record must carry all of them
//! or any of them. A [`FilterView`] applies a stack of such filters — the
//! sidebar of a dashboard page — to the parent table, keeping rows in
//! parent order.
//!
//! Matching is case-sensitive exact token equality against the record's
//! full category set, computed from the unexploded cell: a record with
//! genres {Action, Drama} matches ALL {Action, Drama} even though no single
//! exploded pair carries both. Several call sites depend on the exact
//! semantics, so no normalization happens here beyond the token trim in
//! [`crate::explode::split_tokens`].

use crate::aggregate::{aggregate_pairs, measure_reader, AggregationSpec, GroupEntry};
use crate::column::{ColumnType, ColumnValue};
use crate::error::TableError;
use crate::explode::{split_tokens, CategoryView};
use crate::table::Table;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// How a selection set combines against a record's category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The record must carry every selected value.
    All,
    /// The record must carry at least one selected value.
    Any,
}

/// A multiselect widget's state: selected category values plus the
/// combination mode.
///
/// An empty selection means "no filter" — everything passes — never
/// "match nothing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub selected: BTreeSet<String>,
    pub mode: MatchMode,
}

impl FilterSpec {
    pub fn all<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec {
            selected: selected.into_iter().map(Into::into).collect(),
            mode: MatchMode::All,
        }
    }

    pub fn any<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSpec {
            selected: selected.into_iter().map(Into::into).collect(),
            mode: MatchMode::Any,
        }
    }

    /// True when the selection is empty, i.e. the filter is inactive.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Does a record with this category set pass the filter?
    pub fn matches(&self, categories: &HashSet<String>) -> bool {
        if self.selected.is_empty() {
            return true;
        }
        match self.mode {
            MatchMode::All => self.selected.iter().all(|s| categories.contains(s)),
            MatchMode::Any => self.selected.iter().any(|s| categories.contains(s)),
        }
    }
}

/// One sidebar control, as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowFilter {
    /// Multiselect over a multi-valued column.
    Categories {
        column: String,
        delimiter: char,
        spec: FilterSpec,
    },
    /// Inclusive numeric range, e.g. a release-year slider. Rows with a
    /// null value in the column are excluded while the filter is active.
    NumericRange { column: String, min: f64, max: f64 },
}

impl RowFilter {
    pub fn categories(column: &str, delimiter: char, spec: FilterSpec) -> Self {
        RowFilter::Categories {
            column: column.to_string(),
            delimiter,
            spec,
        }
    }

    pub fn numeric_range(column: &str, min: f64, max: f64) -> Self {
        RowFilter::NumericRange {
            column: column.to_string(),
            min,
            max,
        }
    }
}

/// A filtered view of the parent table: rows passing every filter, in
/// parent order.
///
/// # Examples
///
/// ```
/// use facetable::{Table, Schema, ColumnType, ColumnValue};
/// use facetable::{FilterSpec, FilterView, RowFilter};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let schema = Schema::new(vec![
///     ("title".to_string(), ColumnType::String, false),
///     ("genres".to_string(), ColumnType::String, true),
/// ]);
/// let mut table = Table::new("movies".to_string(), schema);
/// for (title, genres) in [("Heat", "Action|Crime"), ("Up", "Animation")] {
///     let mut row = HashMap::new();
///     row.insert("title".to_string(), ColumnValue::String(title.to_string()));
///     row.insert("genres".to_string(), ColumnValue::String(genres.to_string()));
///     table.append_row(row).unwrap();
/// }
///
/// let view = FilterView::new(
///     "action".to_string(),
///     Arc::new(table),
///     vec![RowFilter::categories("genres", '|', FilterSpec::any(["Action"]))],
/// ).unwrap();
///
/// assert_eq!(view.len(), 1);
/// assert_eq!(view.get_value(0, "title").unwrap().as_string(), Some("Heat"));
/// ```
pub struct FilterView {
    name: String,
    parent: Arc<Table>,
    filters: Vec<RowFilter>,
    view_to_parent: Vec<usize>,
}

impl FilterView {
    pub fn new(
        name: String,
        parent: Arc<Table>,
        filters: Vec<RowFilter>,
    ) -> Result<Self, TableError> {
        // Validate referenced columns up front; a bad widget binding should
        // fail on construction, not on the first row.
        for filter in &filters {
            match filter {
                RowFilter::Categories { column, .. } => {
                    let col = parent.column(column)?;
                    if col.column_type() != ColumnType::String {
                        return Err(TableError::TypeMismatch {
                            column: column.clone(),
                            expected: ColumnType::String,
                            actual: format!("{:?}", col.column_type()),
                        });
                    }
                }
                RowFilter::NumericRange { column, .. } => {
                    parent.numeric_column(column)?;
                }
            }
        }

        let mut view = FilterView {
            name,
            parent,
            filters,
            view_to_parent: Vec::new(),
        };
        view.rebuild_index();
        Ok(view)
    }

    fn rebuild_index(&mut self) {
        self.view_to_parent.clear();
        for i in 0..self.parent.len() {
            if self.row_passes(i) {
                self.view_to_parent.push(i);
            }
        }
        debug!(
            "filter view '{}': kept {} of {} rows ({} filters)",
            self.name,
            self.view_to_parent.len(),
            self.parent.len(),
            self.filters.len()
        );
    }

    fn row_passes(&self, row: usize) -> bool {
        self.filters.iter().all(|filter| match filter {
            RowFilter::Categories {
                column,
                delimiter,
                spec,
            } => {
                if spec.is_empty() {
                    return true;
                }
                // Columns were validated in new(); a failed read means the
                // cell is null, which cannot match a non-empty selection.
                let cell = self
                    .parent
                    .column(column)
                    .ok()
                    .and_then(|col| col.get_str(row));
                let categories: HashSet<String> = match cell {
                    Some(cell) => split_tokens(cell, *delimiter)
                        .into_iter()
                        .map(|t| t.to_string())
                        .collect(),
                    None => HashSet::new(),
                };
                spec.matches(&categories)
            }
            RowFilter::NumericRange { column, min, max } => self
                .parent
                .column(column)
                .ok()
                .and_then(|col| col.get_f64(row))
                .map(|v| v >= *min && v <= *max)
                .unwrap_or(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    /// Parent table row indexes of the kept rows, in parent order.
    pub fn parent_indices(&self) -> &[usize] {
        &self.view_to_parent
    }

    pub fn get_row(&self, index: usize) -> Result<HashMap<String, ColumnValue>, TableError> {
        let parent_index =
            *self
                .view_to_parent
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.view_to_parent.len(),
                })?;
        self.parent.get_row(parent_index)
    }

    pub fn get_value(&self, index: usize, column: &str) -> Result<ColumnValue, TableError> {
        let parent_index =
            *self
                .view_to_parent
                .get(index)
                .ok_or(TableError::RowOutOfRange {
                    index,
                    len: self.view_to_parent.len(),
                })?;
        self.parent.get_value(parent_index, column)
    }

    /// Explode a multi-valued column of the kept rows, chaining into the
    /// filter → explode → group flow of a dashboard page.
    pub fn explode(&self, column: &str, delimiter: char) -> Result<CategoryView, TableError> {
        CategoryView::over_rows(
            format!("{}:{}", self.name, column),
            Arc::clone(&self.parent),
            column,
            delimiter,
            &self.view_to_parent,
        )
    }

    /// Group the kept rows and reduce a measure, per `spec`.
    pub fn aggregate(&self, spec: &AggregationSpec) -> Result<Vec<GroupEntry>, TableError> {
        let group_col = self.parent.column(&spec.group_by)?;
        let read_measure = measure_reader(&self.parent, &spec.measure, spec.reducer)?;

        let pairs = self.view_to_parent.iter().filter_map(|&parent_row| {
            let key = group_col.get(parent_row).ok()?;
            if key.is_null() {
                return None;
            }
            Some((key, read_measure(parent_row)))
        });

        Ok(aggregate_pairs(pairs, spec))
    }
}
