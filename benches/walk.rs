//! Benchmarks for walking the canonical tree.
//!
//! Measures:
//! - a full depth-first walk of all 25 forks (one propagation per step)
//! - a single propagation from a fully answered walker
//! - ranking the open forks with the prober

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ideograph::prelude::*;
use std::collections::VecDeque;

/// Fork ids in breadth-first order, so every fork is reachable when asked.
fn walk_order(graph: &PositionGraph) -> Vec<ForkId> {
    let tree = &graph.trees()[0];
    let mut order = Vec::new();
    let mut queue = VecDeque::from([tree.root().id.clone()]);
    while let Some(id) = queue.pop_front() {
        queue.extend(tree.children_of(&id).iter().cloned());
        order.push(id);
    }
    order
}

fn full_walk(graph: &PositionGraph, order: &[ForkId]) -> Walker {
    let mut walker = graph.create_walker("bench");
    for (i, fork) in order.iter().enumerate() {
        let pole = if i % 3 == 0 { Pole::B } else { Pole::A };
        walk_step(graph, &mut walker, fork, pole).unwrap();
    }
    walker
}

fn bench_full_canonical_walk(c: &mut Criterion) {
    let (graph, _) = IdeographConfig::canonical().build().unwrap();
    let order = walk_order(&graph);

    c.bench_function("canonical_full_walk", |b| {
        b.iter(|| black_box(full_walk(black_box(&graph), &order)));
    });
}

fn bench_single_propagation(c: &mut Criterion) {
    let (graph, _) = IdeographConfig::canonical().build().unwrap();
    let walker = full_walk(&graph, &walk_order(&graph));

    c.bench_function("canonical_propagate_answered", |b| {
        b.iter(|| {
            black_box(ideograph::walker::propagate(
                black_box(&graph),
                black_box(walker.explicit_answers()),
            ))
        });
    });
}

fn bench_rank_forks(c: &mut Criterion) {
    let (graph, _) = IdeographConfig::canonical().build().unwrap();
    let prober = Prober::for_graph(&graph);
    let mut walker = graph.create_walker("bench");
    for fork in ["meaning", "human_nature", "knowledge", "individualism"] {
        walk_step(&graph, &mut walker, &ForkId::from(fork), Pole::A).unwrap();
    }

    c.bench_function("rank_open_forks", |b| {
        b.iter(|| black_box(prober.rank_forks(black_box(&graph), black_box(&walker))));
    });
}

criterion_group!(
    benches,
    bench_full_canonical_walk,
    bench_single_propagation,
    bench_rank_forks
);
criterion_main!(benches);
