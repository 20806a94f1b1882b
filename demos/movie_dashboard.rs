/// Movie Dashboard Example
///
/// This example demonstrates the flow behind a typical dashboard page:
/// - Loading a movie table once and freezing it behind an Arc
/// - Applying sidebar filters (genre multiselect + release year slider)
/// - Grouping and reducing for charts
/// - Ranking for a top-N table

use facetable::{
    AggregationSpec, CategoryView, ColumnType, ColumnValue, FilterSpec, FilterView, OrderBy,
    RowFilter, Schema, SortKey, SortOrder, SortedView, Table,
};
use std::collections::HashMap;
use std::sync::Arc;

fn movie(
    title: &str,
    genres: Option<&str>,
    year: i32,
    revenue: Option<f64>,
) -> HashMap<String, ColumnValue> {
    let mut row = HashMap::new();
    row.insert("title".to_string(), ColumnValue::String(title.to_string()));
    row.insert(
        "genres".to_string(),
        genres.map_or(ColumnValue::Null, |g| ColumnValue::String(g.to_string())),
    );
    row.insert("release_year".to_string(), ColumnValue::Int32(year));
    row.insert(
        "revenue_musd".to_string(),
        revenue.map_or(ColumnValue::Null, ColumnValue::Float64),
    );
    row
}

fn main() {
    println!("=== Facetable Movie Dashboard Example ===\n");

    // 1. Load the dataset once (a real host would read it from storage)
    println!("1. Loading dataset...");
    let schema = Schema::new(vec![
        ("title".to_string(), ColumnType::String, false),
        ("genres".to_string(), ColumnType::String, true),
        ("release_year".to_string(), ColumnType::Int32, false),
        ("revenue_musd".to_string(), ColumnType::Float64, true),
    ]);
    let mut table = Table::new("movies".to_string(), schema);
    table
        .append_rows(vec![
            movie("The Long Chase", Some("Action|Thriller"), 1998, Some(210.0)),
            movie("Quiet Rooms", Some("Drama"), 2004, Some(35.5)),
            movie("Laugh Lines", Some("Comedy|Romance"), 2004, Some(88.0)),
            movie("Deep Orbit", Some("Action|Science Fiction"), 2011, Some(540.2)),
            movie("Unlisted", None, 2007, Some(12.0)),
            movie("Fall of Sparrows", Some("Drama|War"), 1998, None),
        ])
        .unwrap();
    let table = Arc::new(table);
    println!("   Loaded {} movies\n", table.len());

    // 2. Widget options come from the exploded genre column
    let all_genres =
        CategoryView::new("genres".to_string(), Arc::clone(&table), "genres", '|').unwrap();
    println!("2. Genre options: {:?}\n", all_genres.categories());

    // 3. Sidebar state: "Action" selected, years 1990-2005
    println!("3. Applying sidebar filters (Action, 1990-2005)...");
    let sidebar = FilterView::new(
        "sidebar".to_string(),
        Arc::clone(&table),
        vec![
            RowFilter::categories("genres", '|', FilterSpec::any(["Action"])),
            RowFilter::numeric_range("release_year", 1990.0, 2005.0),
        ],
    )
    .unwrap();
    println!("   {} of {} movies pass\n", sidebar.len(), table.len());

    // 4. Chart: total revenue per genre over the filtered rows
    println!("4. Total revenue by genre (filtered):");
    let per_genre = sidebar
        .explode("genres", '|')
        .unwrap()
        .aggregate(&AggregationSpec::sum("genres", "revenue_musd"))
        .unwrap();
    for entry in &per_genre {
        println!("   {:<18} {:>8.1} MUSD", entry.key.as_string().unwrap_or("?"), entry.value);
    }
    println!();

    // 5. Chart: releases per year, in year order
    println!("5. Releases by year (unfiltered):");
    let per_year = table
        .aggregate(
            &AggregationSpec::count("release_year", "title")
                .ordered_by(OrderBy::Key, SortOrder::Ascending),
        )
        .unwrap();
    for entry in &per_year {
        println!("   {}: {} movies", entry.key.as_i32().unwrap_or(0), entry.value as usize);
    }
    println!();

    // 6. Ranking table: top 3 by revenue
    println!("6. Top 3 movies by revenue:");
    let ranked = SortedView::new(
        "top".to_string(),
        Arc::clone(&table),
        vec![SortKey::descending("revenue_musd")],
    )
    .unwrap();
    for row in ranked.head(3) {
        println!(
            "   {:<18} {:>8.1} MUSD",
            row.get("title").and_then(|v| v.as_string()).unwrap_or("?"),
            row.get("revenue_musd").and_then(|v| v.as_f64()).unwrap_or(0.0)
        );
    }
}
