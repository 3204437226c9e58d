//! Benchmarks for document rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docview::document::{RenderContext, render_markdown};
use docview::site::Site;

fn sample(sections: usize) -> String {
    let mut md = String::from("# Reference\n\nSee [usage](usage.md) and [theme](./theme.md#palettes).\n\n");
    for i in 0..sections {
        md.push_str(&format!("## Widget {i}\n\n[Source](../src/widget{i}.cc)\n\n"));
        md.push_str("```cpp\nauto w = Widget {};\nw.show();\n```\n\n");
    }
    md
}

fn bench_render(c: &mut Criterion) {
    let site = Site::builtin();
    let resolver = site.link_resolver();
    let doc = site.document("widgets").expect("builtin document");
    let md = sample(100);

    let plain = RenderContext::for_document(&site, &resolver, doc).with_highlight(false);
    c.bench_function("render_plain", |b| {
        b.iter(|| render_markdown(black_box(&md), &plain).unwrap())
    });

    let highlighted = RenderContext::for_document(&site, &resolver, doc);
    c.bench_function("render_highlighted", |b| {
        b.iter(|| render_markdown(black_box(&md), &highlighted).unwrap())
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
