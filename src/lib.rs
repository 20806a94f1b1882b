//! Facetable - faceted filtering and aggregation over in-memory tables
//!
//! In-memory columnar tables plus the explode / filter / aggregate / top-N
//! pattern over multi-valued categorical columns (delimited text fields such
//! as `genres = "Action|Drama"`). The intended consumer is a presentation
//! layer that loads a dataset once, freezes it behind an `Arc`, and builds
//! plain-data filter and aggregation specs from widget state; every view
//! here is a pure, side-effect-free reader over that shared handle.

pub mod aggregate;
pub mod column;
pub mod error;
pub mod explode;
pub mod filter;
pub mod rank;
pub mod table;

pub use aggregate::{AggregationSpec, GroupEntry, OrderBy, Reducer};
pub use column::{Column, ColumnType, ColumnValue};
pub use error::TableError;
pub use explode::{category_set, split_tokens, CategoryView};
pub use filter::{FilterSpec, FilterView, MatchMode, RowFilter};
pub use rank::{top_n, SortKey, SortOrder, SortedView};
pub use table::{Schema, Table};
