//! Group-by aggregation.
//!
//! One shared implementation serves the table, filter views, and category
//! views: each produces a stream of `(group key, optional measure)` pairs and
//! hands it to [`aggregate_pairs`]. Grouping by release year or month is just
//! grouping by those columns; nothing here knows about dates.
//!
//! Null handling follows the dashboard conventions: a null group key forms no
//! group, `count` counts non-null measure values, and `sum`/`mean` skip null
//! measures without treating them as zero (a mean excludes them from both
//! numerator and denominator). A group whose measure values are all null
//! reports a sum of 0.0 and a count of 0, and is omitted entirely for
//! `mean`/`min`/`max` so NaN never reaches a chart.

use crate::column::ColumnValue;
use crate::error::TableError;
use crate::rank::{compare_key_values, SortOrder};
use crate::table::Table;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How a group's measure values are reduced to a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
    /// Count of non-null measure values. Works on any column type.
    Count,
    Min,
    Max,
}

/// Which side of a [`GroupEntry`] orders the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Order by the reduced measure value.
    Measure,
    /// Order by the group key.
    Key,
}

/// A group-by request: group rows by one column, reduce one measure, order
/// the result. Built by the presentation layer from widget state; plain data,
/// serde-serializable.
///
/// # Examples
///
/// ```
/// use facetable::{AggregationSpec, OrderBy, SortOrder};
///
/// // "total revenue per genre, biggest first"
/// let spec = AggregationSpec::sum("genres", "revenue_musd");
/// assert_eq!(spec.order, SortOrder::Descending);
///
/// // "movies released per year, in year order"
/// let spec = AggregationSpec::count("release_year", "title")
///     .ordered_by(OrderBy::Key, SortOrder::Ascending);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    /// Column whose values form the groups.
    pub group_by: String,
    /// Column reduced within each group.
    pub measure: String,
    pub reducer: Reducer,
    pub order_by: OrderBy,
    pub order: SortOrder,
}

impl AggregationSpec {
    fn with_reducer(group_by: &str, measure: &str, reducer: Reducer) -> Self {
        AggregationSpec {
            group_by: group_by.to_string(),
            measure: measure.to_string(),
            reducer,
            // Dashboards default to "biggest bar first".
            order_by: OrderBy::Measure,
            order: SortOrder::Descending,
        }
    }

    pub fn sum(group_by: &str, measure: &str) -> Self {
        Self::with_reducer(group_by, measure, Reducer::Sum)
    }

    pub fn mean(group_by: &str, measure: &str) -> Self {
        Self::with_reducer(group_by, measure, Reducer::Mean)
    }

    pub fn count(group_by: &str, measure: &str) -> Self {
        Self::with_reducer(group_by, measure, Reducer::Count)
    }

    pub fn min(group_by: &str, measure: &str) -> Self {
        Self::with_reducer(group_by, measure, Reducer::Min)
    }

    pub fn max(group_by: &str, measure: &str) -> Self {
        Self::with_reducer(group_by, measure, Reducer::Max)
    }

    /// Override the result ordering.
    pub fn ordered_by(mut self, order_by: OrderBy, order: SortOrder) -> Self {
        self.order_by = order_by;
        self.order = order;
        self
    }
}

/// One group of the aggregation result.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub key: ColumnValue,
    pub value: f64,
}

/// Running state for one group while pairs stream in.
struct GroupState {
    key: ColumnValue,
    sum: f64,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

/// Resolve the measure column into a per-row reader.
///
/// `Count` accepts any column type and reports 1.0 per non-null value; the
/// numeric reducers require a numeric column and fail with `InvalidMeasure`
/// otherwise. The returned closure yields None for null cells.
pub(crate) fn measure_reader<'t>(
    table: &'t Table,
    measure: &str,
    reducer: Reducer,
) -> Result<Box<dyn Fn(usize) -> Option<f64> + 't>, TableError> {
    if reducer == Reducer::Count {
        let col = table.column(measure)?;
        Ok(Box::new(move |i| {
            if i >= col.len() || col.is_null_at(i) {
                None
            } else {
                Some(1.0)
            }
        }))
    } else {
        let col = table.numeric_column(measure)?;
        Ok(Box::new(move |i| col.get_f64(i)))
    }
}

/// Group and reduce a stream of `(key, measure)` pairs.
///
/// Groups form in first-appearance order; the final sort is stable, so ties
/// under the requested ordering keep that order. Keys are assumed non-null
/// (callers drop null keys before streaming).
pub(crate) fn aggregate_pairs<I>(pairs: I, spec: &AggregationSpec) -> Vec<GroupEntry>
where
    I: Iterator<Item = (ColumnValue, Option<f64>)>,
{
    let mut groups: Vec<GroupState> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, measure) in pairs {
        let slot = match index.get(&key.group_key()) {
            Some(&idx) => idx,
            None => {
                index.insert(key.group_key(), groups.len());
                groups.push(GroupState {
                    key,
                    sum: 0.0,
                    count: 0,
                    min: None,
                    max: None,
                });
                groups.len() - 1
            }
        };

        if let Some(v) = measure {
            let state = &mut groups[slot];
            state.sum += v;
            state.count += 1;
            state.min = Some(state.min.map_or(v, |m| m.min(v)));
            state.max = Some(state.max.map_or(v, |m| m.max(v)));
        }
    }

    let mut entries: Vec<GroupEntry> = groups
        .into_iter()
        .filter_map(|state| {
            let value = match spec.reducer {
                Reducer::Sum => state.sum,
                Reducer::Count => state.count as f64,
                // All-null groups have nothing meaningful to report.
                Reducer::Mean => {
                    if state.count == 0 {
                        return None;
                    }
                    state.sum / state.count as f64
                }
                Reducer::Min => state.min?,
                Reducer::Max => state.max?,
            };
            Some(GroupEntry {
                key: state.key,
                value,
            })
        })
        .collect();

    let descending = spec.order == SortOrder::Descending;
    match spec.order_by {
        OrderBy::Measure => entries.sort_by(|a, b| {
            let cmp = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
            if descending {
                cmp.reverse()
            } else {
                cmp
            }
        }),
        OrderBy::Key => entries.sort_by(|a, b| {
            let cmp = compare_key_values(&a.key, &b.key);
            if descending {
                cmp.reverse()
            } else {
                cmp
            }
        }),
    }

    debug!(
        "aggregate: {:?} of '{}' by '{}' produced {} groups",
        spec.reducer,
        spec.measure,
        spec.group_by,
        entries.len()
    );
    entries
}
