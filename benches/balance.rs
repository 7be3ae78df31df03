//! Benchmarks for balance scoring and pattern matching.
//!
//! Both run against a walker that has answered the whole canonical tree, the
//! largest vector the reference configuration can produce.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ideograph::prelude::*;

fn answered_walker(graph: &PositionGraph, flip_every: usize) -> Walker {
    let tree = &graph.trees()[0];
    let mut walker = graph.create_walker("bench");
    let mut frontier = vec![tree.root().id.clone()];
    let mut i = 0;
    while let Some(fork) = frontier.pop() {
        let pole = if i % flip_every == 0 { Pole::B } else { Pole::A };
        walk_step(graph, &mut walker, &fork, pole).unwrap();
        frontier.extend(tree.children_of(&fork).iter().cloned());
        i += 1;
    }
    walker
}

fn bench_balance(c: &mut Criterion) {
    let (graph, _) = IdeographConfig::canonical().build().unwrap();
    let mut group = c.benchmark_group("balance_analyze");
    for flip_every in [1usize, 2, 5] {
        let walker = answered_walker(&graph, flip_every);
        group.bench_with_input(BenchmarkId::from_parameter(flip_every), &walker, |b, w| {
            b.iter(|| black_box(analyze_walker(black_box(&graph), black_box(w))));
        });
    }
    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let (graph, library) = IdeographConfig::canonical().build().unwrap();
    let walker = answered_walker(&graph, 3);

    c.bench_function("match_canonical_patterns", |b| {
        b.iter(|| {
            black_box(
                match_walker(&graph, black_box(&walker), library.patterns(), graph.config())
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_balance, bench_match);
criterion_main!(benches);
