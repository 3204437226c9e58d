//! Benchmarks for heading extraction.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docview::document::extract_toc;

fn sample(sections: usize) -> String {
    let mut md = String::from("# Reference\n\n");
    for i in 0..sections {
        md.push_str(&format!("## Widget {i}\n\nSome *text* with `code`.\n\n### Properties\n\n"));
        md.push_str("```cpp\nauto w = Widget {};\n```\n\n");
    }
    md
}

fn bench_toc_simple(c: &mut Criterion) {
    let md = "# Hello\n\n## World";
    c.bench_function("toc_simple", |b| b.iter(|| extract_toc(black_box(md))));
}

fn bench_toc_large(c: &mut Criterion) {
    let md = sample(500);
    c.bench_function("toc_large", |b| b.iter(|| extract_toc(black_box(&md))));
}

criterion_group!(benches, bench_toc_simple, bench_toc_large);
criterion_main!(benches);
