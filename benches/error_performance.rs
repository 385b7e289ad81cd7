// benches/error_performance.rs
//! Benchmarks for oops performance characteristics
//!
//! Covers the paths services hit on every failure: creation, explanation,
//! matching, aggregation and client serialization. Trace capture is measured
//! separately because it is the only expensive operation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use oops::{Blame, Definition, Instance, Namespace, Reason, matching, multi};
use std::io;
use std::sync::LazyLock;

static PLAIN: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::CLIENT, Namespace::API, Reason::VALIDATION)
        .with_help("check the request")
});

static TRACED: LazyLock<Definition> = LazyLock::new(|| PLAIN.with_trace());

static LAYER: LazyLock<Definition> = LazyLock::new(|| Definition::new().with_code("layer"));

fn bench_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");

    group.bench_function("emit_empty", |b| b.iter(|| black_box(PLAIN.emit(""))));

    group.bench_function("emit_literal", |b| {
        b.iter(|| black_box(PLAIN.emit(black_box("field rejected"))))
    });

    group.bench_function("emit_formatted", |b| {
        b.iter(|| black_box(PLAIN.emitf(format_args!("id={}", black_box(42)))))
    });

    group.bench_function("wrap_foreign", |b| {
        b.iter(|| black_box(PLAIN.wrap(io::Error::other("disk"), "")))
    });

    group.bench_function("emit_traced", |b| b.iter(|| black_box(TRACED.emit(""))));

    group.finish();
}

fn bench_explanation(c: &mut Criterion) {
    let mut group = c.benchmark_group("explanation");

    for fragments in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("append", fragments), &fragments, |b, &n| {
            b.iter(|| {
                let mut err = PLAIN.emit("");
                for _ in 0..n {
                    err.explain("context");
                }
                black_box(err)
            })
        });
    }

    group.finish();
}

fn chain(depth: usize) -> Instance {
    let mut err = PLAIN.emit("root");
    for _ in 0..depth {
        err = LAYER.wrap(err, "");
    }
    err
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let miss = Definition::new().with_code("miss");

    for depth in [0usize, 8, 32] {
        let err = chain(depth);
        group.bench_with_input(BenchmarkId::new("is_hit", depth), &err, |b, err| {
            b.iter(|| black_box(matching::is(err, &PLAIN)))
        });
        group.bench_with_input(BenchmarkId::new("is_miss", depth), &err, |b, err| {
            b.iter(|| black_box(matching::is(err, &miss)))
        });
    }

    let mut collector = LAYER.collect();
    for idx in 0..64 {
        collector.add_with(PLAIN.emit(""), "items[{}]", &[&idx]);
    }
    let collected = collector.finish();
    group.bench_function("nested_find_64", |b| {
        b.iter(|| black_box(collected.as_ref().and_then(|e| e.nested_find(&miss))))
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for members in [2usize, 16] {
        group.bench_with_input(BenchmarkId::new("multi", members), &members, |b, &n| {
            b.iter(|| black_box(multi((0..n).map(|_| PLAIN.emit("")))))
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    let err = PLAIN.emit("quantity must be positive");
    group.bench_function("render", |b| b.iter(|| black_box(err.render())));
    group.bench_function("to_json", |b| b.iter(|| black_box(err.to_json())));

    let mut line = String::with_capacity(256);
    let wrapped = LAYER.wrap(err.clone(), "outer");
    group.bench_function("diagnostic_write", |b| {
        b.iter(|| {
            line.clear();
            let _ = wrapped.diagnostic_log().write_to(&mut line);
            black_box(line.len())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_creation,
    bench_explanation,
    bench_matching,
    bench_aggregation,
    bench_serialization
);
criterion_main!(benches);
