//! Transform throughput benchmarks
//!
//! Measures a full parse, transform and serialize cycle over configuration
//! files with a growing number of `appSettings` entries, once with `Match`
//! locators and once with `Condition` locators.
//!
//! Run benchmarks: `cargo bench --bench transform_throughput`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use xdt::{Transformer, XDT_NAMESPACE};

/// Source document with `count` settings.
fn source(count: usize) -> String {
    let mut xml = String::from("<configuration>\n  <appSettings>\n");
    for i in 0..count {
        xml.push_str(&format!("    <add key=\"key{i}\" value=\"{i}\"/>\n"));
    }
    xml.push_str("  </appSettings>\n</configuration>\n");
    xml
}

/// Transform touching every tenth setting.
fn transform(count: usize, locator: impl Fn(usize) -> String) -> String {
    let mut xml = format!("<configuration xmlns:xdt=\"{XDT_NAMESPACE}\">\n  <appSettings>\n");
    for i in (0..count).step_by(10) {
        xml.push_str(&format!(
            "    <add key=\"key{i}\" value=\"changed\" xdt:Transform=\"SetAttributes\" xdt:Locator=\"{}\"/>\n",
            locator(i)
        ));
    }
    xml.push_str("    <add key=\"new\" value=\"1\" xdt:Transform=\"Insert\"/>\n");
    xml.push_str("  </appSettings>\n</configuration>\n");
    xml
}

fn bench_locators(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator");
    let transformer = Transformer::default();

    for count in [10, 100, 1000] {
        let source = source(count);
        let by_match = transform(count, |_| "Match(key)".to_string());
        let by_condition = transform(count, |i| format!("Condition(@key='key{i}')"));
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_with_input(BenchmarkId::new("match", count), &count, |b, _| {
            b.iter(|| transformer.run(black_box(&source), black_box(&by_match)))
        });
        group.bench_with_input(BenchmarkId::new("condition", count), &count, |b, _| {
            b.iter(|| transformer.run(black_box(&source), black_box(&by_condition)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_locators);
criterion_main!(benches);
