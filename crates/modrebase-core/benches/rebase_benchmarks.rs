use criterion::{criterion_group, criterion_main, Criterion};
use modrebase_modfile::{parse_manifest_str, Manifest};
use std::fmt::Write;

fn synthetic_manifest(module: &str, count: usize, offset: usize, bump: u32) -> String {
    let mut text = format!("module {module}\n\ngo 1.21\n\nrequire (\n");
    for i in offset..offset + count {
        let indirect = if i % 3 == 0 { " // indirect" } else { "" };
        let _ = writeln!(
            text,
            "\tgithub.com/Org{}/dep{i} v1.{}.{bump}{indirect}",
            i % 7,
            i % 11
        );
    }
    text.push_str(")\n\nexclude github.com/Org0/dep0 v0.0.1\n");
    text
}

fn pair(count: usize) -> (Manifest, Manifest) {
    let upstream =
        parse_manifest_str("go.mod", &synthetic_manifest("example.com/up", count, 0, 0)).unwrap();
    let downstream = parse_manifest_str(
        "go.mod",
        &synthetic_manifest("example.com/fork", count, count / 4, 1),
    )
    .unwrap();
    (upstream, downstream)
}

fn bench_parse(c: &mut Criterion) {
    let text = synthetic_manifest("example.com/up", 500, 0, 0);
    c.bench_function("parse_500_requirements", |b| {
        b.iter(|| parse_manifest_str("go.mod", &text).unwrap());
    });
}

fn bench_rebase(c: &mut Criterion) {
    let (upstream, downstream) = pair(500);
    c.bench_function("rebase_500_requirements", |b| {
        b.iter(|| modrebase_core::rebase_manifests(&upstream, &downstream));
    });
}

fn bench_rebase_large(c: &mut Criterion) {
    let (upstream, downstream) = pair(5000);
    c.bench_function("rebase_5000_requirements", |b| {
        b.iter(|| modrebase_core::rebase_manifests(&upstream, &downstream));
    });
}

fn bench_format(c: &mut Criterion) {
    let (upstream, downstream) = pair(500);
    let merged = modrebase_core::rebase_manifests(&upstream, &downstream);
    c.bench_function("format_merged_manifest", |b| {
        b.iter(|| merged.format());
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_rebase,
    bench_rebase_large,
    bench_format
);
criterion_main!(benches);
