use criterion::{Criterion, black_box, criterion_group, criterion_main};

use shrinetrack::catalog::{Catalog, CatalogEntry};
use shrinetrack::search::{rank_indices, score_match, search_and_sort};

fn entries() -> Vec<CatalogEntry> {
    let catalog = Catalog::bundled().expect("bundled catalog");
    catalog.entries()
}

fn bench_score(c: &mut Criterion) {
    c.bench_function("score_match (word boundary)", |b| {
        b.iter(|| score_match(black_box("Largemouth Bass"), black_box("bass")))
    });
    c.bench_function("score_match (subsequence)", |b| {
        b.iter(|| score_match(black_box("Smallmouth Bass"), black_box("smb")))
    });
}

fn bench_palette(c: &mut Criterion) {
    let entries = entries();

    c.bench_function("search_and_sort (palette, 2 chars)", |b| {
        b.iter(|| search_and_sort(black_box(&entries), black_box("st"), |e| e.name.as_str()))
    });
    c.bench_function("search_and_sort (palette, full name)", |b| {
        b.iter(|| search_and_sort(black_box(&entries), black_box("sturgeon"), |e| e.name.as_str()))
    });
}

fn bench_category_filter(c: &mut Criterion) {
    let catalog = Catalog::bundled().expect("bundled catalog");
    let fish = &catalog.categories[0].items;

    c.bench_function("rank_indices (category grid)", |b| {
        b.iter(|| rank_indices(black_box(fish), black_box("fish"), |item| item.name.as_str()))
    });
}

criterion_group!(benches, bench_score, bench_palette, bench_category_filter);
criterion_main!(benches);
