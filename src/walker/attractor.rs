//! Population density over positions: attractors and voids.
//!
//! A position is *visited* by every walker that currently accepts it
//! (`v > presence_epsilon`). Attractors are heavily visited positions with
//! strong positive support flowing in. Voids are positions that positive
//! edges from visited sources lead to, yet few walkers hold.
//!
//! # Citations
//! - Scheffer, "Critical Transitions in Nature and Society" (2009) – basins of attraction
//! - Noelle-Neumann, "The Spiral of Silence" (1974) – positions that stay unvoiced

use super::Walker;
use crate::core::{Axis, PositionId};
use crate::graph::edge::{Edge, EdgeKind, Sign};
use crate::graph::PositionGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Cut-offs for density detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityThresholds {
    /// Visits a position needs before it can be an attractor.
    pub min_visits: usize,
    pub min_strength: f64,
    /// Expected visitors a position needs before it can be a void.
    pub min_expected: f64,
    pub min_void_ratio: f64,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            min_visits: 10,
            min_strength: 0.3,
            min_expected: 5.0,
            min_void_ratio: 0.7,
        }
    }
}

/// A heavily visited position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    pub center: PositionId,
    /// Sources of positive edges into the center.
    pub basin: BTreeSet<PositionId>,
    pub visits: usize,
    /// visit share × 0.5 + incoming count × 0.25 + incoming weight × 0.25,
    /// each term capped at 1.
    pub strength: f64,
}

/// Hypothesis for why few walkers hold a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidReason {
    /// A popular position contradicts it.
    SociallyCostly,
    /// Its support comes from three or more axes.
    RareCombination,
    /// No walker holds it by a direct answer.
    Unarticulated,
    Unknown,
}

/// A position that is structurally expected but rarely held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Void {
    pub position: PositionId,
    /// Sources of the positive edges that lead here.
    pub expected_from: Vec<PositionId>,
    /// Σ source visits × edge weight.
    pub expected_visitors: f64,
    pub actual_visitors: usize,
    /// `1 - actual / expected`; 1 means nobody is there.
    pub void_ratio: f64,
    pub reasons: Vec<VoidReason>,
}

/// Number of walkers accepting each position; unvisited positions are
/// absent.
pub fn visit_counts(graph: &PositionGraph, walkers: &[Walker]) -> BTreeMap<PositionId, usize> {
    let epsilon = graph.config().presence_epsilon;
    let mut visits = BTreeMap::new();
    for walker in walkers {
        for (id, value) in walker.vector().iter() {
            if value > epsilon && graph.contains_position(id) {
                *visits.entry(id.clone()).or_insert(0) += 1;
            }
        }
    }
    visits
}

fn supporting_edges<'g>(
    graph: &'g PositionGraph,
    id: &'g PositionId,
) -> impl Iterator<Item = &'g Edge> + 'g {
    graph.edges_to(id).filter(|edge| edge.sign == Sign::Positive)
}

/// Positions with enough visits and strength, strongest first; ties go to
/// position id.
pub fn detect_attractors(
    graph: &PositionGraph,
    walkers: &[Walker],
    thresholds: &DensityThresholds,
) -> Vec<Attractor> {
    let visits = visit_counts(graph, walkers);
    let max_visits = visits.values().copied().max().unwrap_or(0).max(1) as f64;

    let mut attractors: Vec<Attractor> = visits
        .iter()
        .filter(|&(_, &count)| count >= thresholds.min_visits)
        .filter_map(|(id, &count)| {
            let (basin, weight): (BTreeSet<PositionId>, f64) = supporting_edges(graph, id)
                .fold((BTreeSet::new(), 0.0), |(mut basin, weight), edge| {
                    basin.insert(edge.source.clone());
                    (basin, weight + edge.weight)
                });
            let incoming = supporting_edges(graph, id).count() as f64;
            let strength = count as f64 / max_visits * 0.5
                + (incoming / 10.0).min(1.0) * 0.25
                + (weight / 5.0).min(1.0) * 0.25;
            (strength >= thresholds.min_strength).then(|| Attractor {
                center: id.clone(),
                basin,
                visits: count,
                strength,
            })
        })
        .collect();
    attractors.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.center.cmp(&b.center))
    });
    debug!(walkers = walkers.len(), attractors = attractors.len(), "attractors detected");
    attractors
}

fn void_reasons(
    graph: &PositionGraph,
    id: &PositionId,
    sources: &[PositionId],
    visits: &BTreeMap<PositionId, usize>,
    walkers: &[Walker],
    thresholds: &DensityThresholds,
) -> Vec<VoidReason> {
    let mut reasons = Vec::new();
    let contradicted_by_popular = graph
        .neighbors(id, &[EdgeKind::Contradicts])
        .into_iter()
        .any(|n| visits.get(n.position).copied().unwrap_or(0) >= thresholds.min_visits);
    if contradicted_by_popular {
        reasons.push(VoidReason::SociallyCostly);
    }

    let axes: BTreeSet<Axis> = sources
        .iter()
        .filter_map(|source| graph.position(source))
        .map(|position| position.axis)
        .collect();
    if axes.len() >= 3 {
        reasons.push(VoidReason::RareCombination);
    }

    let articulated = graph.position(id).is_some_and(|position| {
        walkers
            .iter()
            .any(|w| w.explicit_pole(&position.fork_id) == Some(position.pole))
    });
    if !articulated {
        reasons.push(VoidReason::Unarticulated);
    }

    if reasons.is_empty() {
        reasons.push(VoidReason::Unknown);
    }
    reasons
}

/// Positions far emptier than their support predicts, emptiest first; ties
/// go to position id.
pub fn detect_voids(
    graph: &PositionGraph,
    walkers: &[Walker],
    thresholds: &DensityThresholds,
) -> Vec<Void> {
    let visits = visit_counts(graph, walkers);
    let mut voids = Vec::new();
    for position in graph.positions() {
        let id = &position.id;
        let mut expected_from = Vec::new();
        let mut expected = 0.0;
        for edge in supporting_edges(graph, id) {
            expected += visits.get(&edge.source).copied().unwrap_or(0) as f64 * edge.weight;
            expected_from.push(edge.source.clone());
        }
        if expected_from.is_empty() || expected < thresholds.min_expected || expected <= 0.0 {
            continue;
        }
        let actual = visits.get(id).copied().unwrap_or(0);
        let void_ratio = 1.0 - actual as f64 / expected;
        if void_ratio < thresholds.min_void_ratio {
            continue;
        }
        let reasons = void_reasons(graph, id, &expected_from, &visits, walkers, thresholds);
        voids.push(Void {
            position: id.clone(),
            expected_from,
            expected_visitors: expected,
            actual_visitors: actual,
            void_ratio,
            reasons,
        });
    }
    voids.sort_by(|a, b| {
        b.void_ratio
            .total_cmp(&a.void_ratio)
            .then_with(|| a.position.cmp(&b.position))
    });
    debug!(walkers = walkers.len(), voids = voids.len(), "voids detected");
    voids
}

/// The attractor whose basin overlaps most with what the walker accepts.
///
/// Holding the center counts two. Ties go to the earlier attractor; `None`
/// without any overlap.
pub fn attractor_basin<'a>(
    graph: &PositionGraph,
    walker: &Walker,
    attractors: &'a [Attractor],
) -> Option<&'a Attractor> {
    let epsilon = graph.config().presence_epsilon;
    let accepts = |id: &PositionId| walker.value(id) > epsilon;
    let mut best: Option<(&Attractor, usize)> = None;
    for attractor in attractors {
        let mut overlap = attractor.basin.iter().filter(|id| accepts(id)).count();
        if accepts(&attractor.center) {
            overlap += 2;
        }
        if overlap > best.map_or(0, |(_, o)| o) {
            best = Some((attractor, overlap));
        }
    }
    best.map(|(attractor, _)| attractor)
}

/// Up to `n` voids the walker does not hold but accepts a source of; most
/// connected first, then emptiest, then position id.
pub fn suggest_void_exploration<'a>(
    graph: &PositionGraph,
    walker: &Walker,
    voids: &'a [Void],
    n: usize,
) -> Vec<&'a Void> {
    let epsilon = graph.config().presence_epsilon;
    let mut candidates: Vec<(&Void, usize)> = voids
        .iter()
        .filter(|void| walker.value(&void.position) <= epsilon)
        .map(|void| {
            let connection = void
                .expected_from
                .iter()
                .filter(|source| walker.value(source) > epsilon)
                .count();
            (void, connection)
        })
        .filter(|(_, connection)| *connection > 0)
        .collect();
    candidates.sort_by(|(a, ca), (b, cb)| {
        cb.cmp(ca)
            .then_with(|| b.void_ratio.total_cmp(&a.void_ratio))
            .then_with(|| a.position.cmp(&b.position))
    });
    candidates.into_iter().take(n).map(|(void, _)| void).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrossLinkSpec, EngineConfig};
    use crate::core::{ForkId, Pole, Tier};
    use crate::forks::tests::spec;
    use crate::forks::ForkTree;
    use crate::walker::walk_step;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    /// root with children `p` and `q`, plus `p_a` IMPLIES `q_b`.
    fn graph() -> PositionGraph {
        let tree = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("p", Some("root"), Tier::Meta),
            spec("q", Some("root"), Tier::Meta),
        ])
        .unwrap();
        PositionGraph::builder(EngineConfig::default())
            .with_tree(tree)
            .with_cross_links([CrossLinkSpec {
                source: pid("p_a"),
                target: pid("q_b"),
                kind: EdgeKind::Implies,
                weight: 0.9,
                sign: None,
            }])
            .build()
            .unwrap()
    }

    fn walker(graph: &PositionGraph, id: &str, poles: [Pole; 3]) -> Walker {
        let mut walker = graph.create_walker(id);
        for (fork, pole) in ["root", "p", "q"].into_iter().zip(poles) {
            walk_step(graph, &mut walker, &ForkId::from(fork), pole).unwrap();
        }
        walker
    }

    fn crowd(graph: &PositionGraph) -> Vec<Walker> {
        (0..3).map(|i| walker(graph, &format!("w{i}"), [Pole::A; 3])).collect()
    }

    fn small() -> DensityThresholds {
        DensityThresholds {
            min_visits: 2,
            min_expected: 1.0,
            ..DensityThresholds::default()
        }
    }

    #[test]
    fn nothing_is_dense_without_walkers() {
        let graph = graph();
        assert!(detect_attractors(&graph, &[], &DensityThresholds::default()).is_empty());
        assert!(detect_voids(&graph, &[], &DensityThresholds::default()).is_empty());
    }

    #[test]
    fn crowded_positions_become_attractors() {
        let graph = graph();
        let walkers = crowd(&graph);
        let visits = visit_counts(&graph, &walkers);
        assert_eq!(visits.get(&pid("root_a")), Some(&3));
        assert_eq!(visits.get(&pid("q_b")), None);

        let attractors = detect_attractors(&graph, &walkers, &small());
        let centers: Vec<&str> = attractors.iter().map(|a| a.center.as_str()).collect();
        assert_eq!(centers, vec!["p_a", "q_a", "root_a"]);
        assert_eq!(attractors[0].basin, [pid("root_a")].into_iter().collect());
        // 0.5 + 1/10 × 0.25 + 0.6/5 × 0.25.
        assert!((attractors[0].strength - 0.555).abs() < 1e-12);
        assert!(attractors[2].basin.is_empty());

        assert!(detect_attractors(&graph, &walkers, &DensityThresholds::default()).is_empty());
    }

    #[test]
    fn implied_but_unheld_position_is_a_void() {
        let graph = graph();
        let walkers = crowd(&graph);
        let voids = detect_voids(&graph, &walkers, &small());
        let void = voids.iter().find(|v| v.position == pid("q_b")).unwrap();
        assert_eq!(void.actual_visitors, 0);
        assert_eq!(void.void_ratio, 1.0);
        assert!((void.expected_visitors - 2.7).abs() < 1e-12);
        assert!(void.expected_from.contains(&pid("p_a")));
        assert_eq!(void.reasons, vec![VoidReason::SociallyCostly, VoidReason::Unarticulated]);
        assert!(voids.iter().all(|v| v.position != pid("q_a")));
    }

    #[test]
    fn walker_basin_prefers_held_centers() {
        let graph = graph();
        let walkers = crowd(&graph);
        let attractors = detect_attractors(&graph, &walkers, &small());
        let basin = attractor_basin(&graph, &walkers[0], &attractors).unwrap();
        assert_eq!(basin.center, pid("p_a"));

        let stranger = graph.create_walker("s");
        assert!(attractor_basin(&graph, &stranger, &attractors).is_none());
    }

    #[test]
    fn voids_are_suggested_to_connected_walkers_only() {
        let graph = graph();
        let walkers = crowd(&graph);
        let voids = detect_voids(&graph, &walkers, &small());

        let suggested = suggest_void_exploration(&graph, &walkers[0], &voids, 3);
        assert!(suggested.iter().any(|v| v.position == pid("q_b")));
        assert!(suggested.len() <= 3);

        let holder = walker(&graph, "h", [Pole::B; 3]);
        let suggested = suggest_void_exploration(&graph, &holder, &voids, 3);
        assert!(suggested.iter().all(|v| v.position != pid("q_b")));
    }
}
