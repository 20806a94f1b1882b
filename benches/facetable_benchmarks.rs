use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facetable::*;
use std::collections::HashMap;
use std::sync::Arc;

const GENRE_POOL: &[&str] = &[
    "Action|Adventure",
    "Drama",
    "Comedy|Romance",
    "Action|Science Fiction|Thriller",
    "Drama|Crime",
    "Animation|Family",
    "Horror|Thriller",
];

fn build_movie_table(rows: usize) -> Arc<Table> {
    let schema = Schema::new(vec![
        ("title".to_string(), ColumnType::String, false),
        ("genres".to_string(), ColumnType::String, true),
        ("release_year".to_string(), ColumnType::Int32, false),
        ("revenue_musd".to_string(), ColumnType::Float64, true),
    ]);
    let mut table = Table::new("movies".to_string(), schema);

    for i in 0..rows {
        let mut row = HashMap::new();
        row.insert("title".to_string(), ColumnValue::String(format!("Movie {}", i)));
        row.insert(
            "genres".to_string(),
            if i % 13 == 0 {
                ColumnValue::Null
            } else {
                ColumnValue::String(GENRE_POOL[i % GENRE_POOL.len()].to_string())
            },
        );
        row.insert(
            "release_year".to_string(),
            ColumnValue::Int32(1980 + (i % 45) as i32),
        );
        row.insert(
            "revenue_musd".to_string(),
            if i % 7 == 0 {
                ColumnValue::Null
            } else {
                ColumnValue::Float64((i % 997) as f64 * 1.37)
            },
        );
        table.append_row(row).unwrap();
    }

    Arc::new(table)
}

fn bench_explode(c: &mut Criterion) {
    let mut group = c.benchmark_group("explode");

    for size in [1000, 10000, 100000].iter() {
        let table = build_movie_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                CategoryView::new(
                    "by_genre".to_string(),
                    Arc::clone(&table),
                    black_box("genres"),
                    '|',
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_filter_all_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_all_mode");

    for size in [1000, 10000, 100000].iter() {
        let table = build_movie_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                FilterView::new(
                    "sidebar".to_string(),
                    Arc::clone(&table),
                    vec![
                        RowFilter::categories(
                            "genres",
                            '|',
                            FilterSpec::all(["Action", "Thriller"]),
                        ),
                        RowFilter::numeric_range("release_year", 1990.0, 2010.0),
                    ],
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_aggregate_sum_by_genre(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_sum_by_genre");

    for size in [1000, 10000, 100000].iter() {
        let table = build_movie_table(*size);
        let view = CategoryView::new(
            "by_genre".to_string(),
            Arc::clone(&table),
            "genres",
            '|',
        )
        .unwrap();
        let spec = AggregationSpec::sum("genres", "revenue_musd");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| view.aggregate(black_box(&spec)).unwrap());
        });
    }
    group.finish();
}

fn bench_top_n(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_n");

    for size in [1000, 10000, 100000].iter() {
        let table = build_movie_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| top_n(&table, black_box("revenue_musd"), 10, true).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_explode,
    bench_filter_all_mode,
    bench_aggregate_sum_by_genre,
    bench_top_n
);
criterion_main!(benches);
