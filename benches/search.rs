//! Benchmarks for in-page search.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use marksight::document::Document;
use marksight::search::SearchEngine;

fn bench_incremental_query(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/guide.md").repeat(50);
    let doc = Document::from_markdown(&md, None);

    c.bench_function("search_typed_query", |b| {
        b.iter_batched(
            || (doc.clone(), SearchEngine::new()),
            |(mut doc, mut search)| {
                search.open(&mut doc);
                let mut query = String::new();
                for c in black_box("search").chars() {
                    query.push(c);
                    search.on_query_change(&mut doc, &query);
                }
                search.matches().len()
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_step_matches(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/guide.md").repeat(50);
    let mut doc = Document::from_markdown(&md, None);
    let mut search = SearchEngine::new();
    search.open(&mut doc);
    search.on_query_change(&mut doc, "the");

    c.bench_function("search_next_match", |b| {
        b.iter(|| search.next(black_box(&mut doc)))
    });
}

criterion_group!(benches, bench_incremental_query, bench_step_matches);
criterion_main!(benches);
