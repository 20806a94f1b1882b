/// Faceted Filtering Example
///
/// This example demonstrates ALL vs ANY selection semantics and how widget
/// state arrives as plain serde data.

use facetable::{ColumnType, ColumnValue, FilterView, RowFilter, Schema, Table};
use std::collections::HashMap;
use std::sync::Arc;

fn main() {
    println!("=== Facetable Faceted Filters Example ===\n");

    let schema = Schema::new(vec![
        ("title".to_string(), ColumnType::String, false),
        ("genres".to_string(), ColumnType::String, true),
    ]);
    let mut table = Table::new("movies".to_string(), schema);
    for (title, genres) in [
        ("Alpha", Some("Action|Drama")),
        ("Bravo", Some("Action")),
        ("Charlie", Some("Drama")),
        ("Delta", None),
    ] {
        let mut row = HashMap::new();
        row.insert("title".to_string(), ColumnValue::String(title.to_string()));
        row.insert(
            "genres".to_string(),
            genres.map_or(ColumnValue::Null, |g| ColumnValue::String(g.to_string())),
        );
        table.append_row(row).unwrap();
    }
    let table = Arc::new(table);

    // Widget state as it would arrive from the presentation layer.
    let all_json = r#"[{ "type": "categories", "column": "genres", "delimiter": "|",
        "spec": { "selected": ["Action", "Drama"], "mode": "all" } }]"#;
    let any_json = r#"[{ "type": "categories", "column": "genres", "delimiter": "|",
        "spec": { "selected": ["Action", "Drama"], "mode": "any" } }]"#;

    for (label, json) in [("ALL", all_json), ("ANY", any_json)] {
        let filters: Vec<RowFilter> = serde_json::from_str(json).unwrap();
        let view = FilterView::new(label.to_string(), Arc::clone(&table), filters).unwrap();

        let titles: Vec<String> = (0..view.len())
            .filter_map(|i| {
                view.get_value(i, "title")
                    .ok()
                    .and_then(|v| v.as_string().map(|s| s.to_string()))
            })
            .collect();
        println!("{} {{Action, Drama}}: {:?}", label, titles);
    }

    // An empty selection is the identity filter: every record passes,
    // including Delta with its null genres.
    let empty: Vec<RowFilter> = vec![];
    let view = FilterView::new("empty".to_string(), Arc::clone(&table), empty).unwrap();
    println!("No filters: {} of {} records pass", view.len(), table.len());
}
