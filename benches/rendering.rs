//! Benchmarks for page rendering and layout.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use marksight::document::Document;
use marksight::layout::Layout;

fn bench_render(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/guide.md");
    c.bench_function("render_guide", |b| {
        b.iter(|| Document::from_markdown(black_box(md), None))
    });
}

fn bench_layout(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/guide.md").repeat(20);
    let doc = Document::from_markdown(&md, None);

    c.bench_function("layout_80_columns", |b| {
        b.iter(|| Layout::compute(doc.dom(), doc.content(), black_box(80)))
    });
}

criterion_group!(benches, bench_render, bench_layout);
criterion_main!(benches);
