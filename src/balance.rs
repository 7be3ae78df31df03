//! Weighted-balance scoring of a position vector.
//!
//! The balance engine reads a vector against the graph and reports how
//! internally consistent it is:
//!
//! - **Triads** are three supported positions with at least two linked
//!   pairs. An open pair is closed by the holder's attitude relation,
//!   `sgn(v_a · v_c)`. A triad is balanced when the product of its three
//!   signs is positive.
//! - **SGM** is `(balanced − imbalanced) / total`, undefined without triads.
//! - **Constraint** is the share of supported position pairs that are
//!   linked by an edge.
//! - **Extremeness** is the mean `|v|` over explicit positions that belong to
//!   at least one triad. Constraint is established first, so isolated
//!   positions never count.
//!
//! # Citations
//! - Heider, "Attitudes and cognitive organization" (1946)
//! - Cartwright & Harary, "Structural balance: a generalization of Heider's theory" (1956)
//! - Schröder, Hoey & Rogers, "Modeling dynamic identities and uncertainty in social interactions" (2016) – weighted balance

use crate::core::PositionId;
use crate::error::{IdeographError, Result};
use crate::graph::edge::{EdgeKind, Sign};
use crate::graph::{triad, PositionGraph};
use crate::walker::{PositionVector, Walker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A triad whose sign product is negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalancedTriad {
    pub members: [PositionId; 3],
    /// Mean `|v|` of the three members.
    pub strength: f64,
}

/// Two accepted positions joined by a PRIORITIZES_OVER edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityConflict {
    /// Edge source: the position that should win.
    pub dominant: PositionId,
    pub subordinate: PositionId,
    pub weight: f64,
}

/// Balance measures of one vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub triad_count: usize,
    pub balanced: usize,
    pub imbalanced: usize,
    /// In `[-1, 1]`; `None` when there are no triads.
    pub sgm: Option<f64>,
    /// `None` when no explicit position lies in a triad.
    pub extremeness: Option<f64>,
    /// Linked pairs / possible pairs; `None` below two supported positions.
    pub constraint: Option<f64>,
    /// Strongest first.
    pub imbalanced_triads: Vec<ImbalancedTriad>,
    pub priority_conflicts: Vec<PriorityConflict>,
}

impl BalanceReport {
    /// SGM, or `InsufficientData` when there are no triads.
    pub fn require_sgm(&self) -> Result<f64> {
        self.sgm.ok_or_else(|| {
            IdeographError::InsufficientData("no triads in the supported positions".into())
        })
    }

    /// Extremeness, or `InsufficientData` when no explicit position is
    /// constrained.
    pub fn require_extremeness(&self) -> Result<f64> {
        self.extremeness.ok_or_else(|| {
            IdeographError::InsufficientData("no explicit position lies in a triad".into())
        })
    }

    /// Whether every triad is balanced (vacuously true without triads).
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.imbalanced == 0
    }
}

/// Scores a vector. `explicit` names the positions set by direct answers.
pub fn analyze(
    graph: &PositionGraph,
    vector: &PositionVector,
    explicit: &BTreeSet<PositionId>,
) -> BalanceReport {
    let config = graph.config();
    let supported: BTreeSet<&PositionId> = vector
        .iter()
        .filter(|(id, v)| config.is_present(*v) && graph.contains_position(id))
        .map(|(id, _)| id)
        .collect();

    let triads = triad::among(graph, |id| supported.contains(id));
    let mut balanced = 0;
    let mut imbalanced_triads = Vec::new();
    let mut constrained: BTreeSet<&PositionId> = BTreeSet::new();
    for triad in &triads {
        let sign = triad.sign_with(|a, b| Sign::of(vector.get(a) * vector.get(b)));
        match sign {
            Some(Sign::Positive) => balanced += 1,
            Some(Sign::Negative) => {
                let strength = triad.members.iter().map(|m| vector.get(m).abs()).sum::<f64>() / 3.0;
                imbalanced_triads.push(ImbalancedTriad {
                    members: triad.members.clone(),
                    strength,
                });
            }
            None => continue,
        }
        constrained.extend(triad.members.iter());
    }
    let imbalanced = imbalanced_triads.len();
    let triad_count = balanced + imbalanced;
    imbalanced_triads.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.members.cmp(&b.members))
    });

    let sgm = (triad_count > 0).then(|| (balanced as f64 - imbalanced as f64) / triad_count as f64);

    let constrained_explicit: Vec<f64> = constrained
        .iter()
        .filter(|id| explicit.contains(**id))
        .map(|id| vector.get(id).abs())
        .collect();
    let extremeness = (!constrained_explicit.is_empty())
        .then(|| constrained_explicit.iter().sum::<f64>() / constrained_explicit.len() as f64);

    let n = supported.len();
    let constraint = (n >= 2).then(|| {
        let linked: usize = supported
            .iter()
            .map(|id| {
                graph
                    .linked(id)
                    .into_iter()
                    .filter(|other| *other > *id && supported.contains(other))
                    .count()
            })
            .sum();
        linked as f64 / (n * (n - 1) / 2) as f64
    });

    let priority_conflicts: Vec<PriorityConflict> = graph
        .edges()
        .iter()
        .filter(|edge| edge.kind == EdgeKind::PrioritizesOver)
        .filter(|edge| vector.get(&edge.source) > config.presence_epsilon)
        .filter(|edge| vector.get(&edge.target) > config.presence_epsilon)
        .map(|edge| PriorityConflict {
            dominant: edge.source.clone(),
            subordinate: edge.target.clone(),
            weight: edge.weight,
        })
        .collect();

    debug!(
        supported = n,
        triads = triad_count,
        imbalanced,
        sgm = ?sgm,
        priority_conflicts = priority_conflicts.len(),
        "balance computed"
    );
    BalanceReport {
        triad_count,
        balanced,
        imbalanced,
        sgm,
        extremeness,
        constraint,
        imbalanced_triads,
        priority_conflicts,
    }
}

/// Scores a walker's current vector with its explicit answers.
pub fn analyze_walker(graph: &PositionGraph, walker: &Walker) -> BalanceReport {
    let explicit: BTreeSet<PositionId> = walker.answered_positions().into_iter().collect();
    analyze(graph, walker.vector(), &explicit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrossLinkSpec, EngineConfig};
    use crate::core::{ForkId, Pole, Tier};
    use crate::forks::tests::{chain, spec};
    use crate::forks::ForkTree;
    use crate::walker::walk_step;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    /// root with two children `p` and `q`, plus `p_a` CONTRADICTS `q_a`.
    fn forked(kind: EdgeKind) -> PositionGraph {
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
                target: pid("q_a"),
                kind,
                weight: 0.5,
                sign: None,
            }])
            .build()
            .unwrap()
    }

    fn answer_all_a(graph: &PositionGraph) -> Walker {
        let mut walker = graph.create_walker("w");
        for fork in ["root", "p", "q"] {
            walk_step(graph, &mut walker, &ForkId::from(fork), Pole::A).unwrap();
        }
        walker
    }

    #[test]
    fn empty_vector_has_no_sgm() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let report = analyze_walker(&graph, &graph.create_walker("w"));
        assert_eq!(report.sgm, None);
        assert_eq!(report.extremeness, None);
        assert_eq!(report.constraint, None);
        assert!(matches!(report.require_sgm(), Err(IdeographError::InsufficientData(_))));
    }

    #[test]
    fn consistent_tree_walk_is_balanced() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &ForkId::from("root"), Pole::A).unwrap();
        walk_step(&graph, &mut walker, &ForkId::from("child1"), Pole::A).unwrap();
        let report = analyze_walker(&graph, &walker);
        assert!(report.triad_count > 0);
        assert_eq!(report.sgm, Some(1.0));
        assert!(report.is_balanced());
        assert_eq!(report.extremeness, Some(1.0));
    }

    #[test]
    fn accepted_contradiction_is_imbalanced() {
        let graph = forked(EdgeKind::Contradicts);
        let walker = answer_all_a(&graph);
        assert_eq!(walker.value(&pid("p_a")), 1.0);
        assert_eq!(walker.value(&pid("q_a")), 1.0);

        let report = analyze_walker(&graph, &walker);
        let flagged: Vec<&[PositionId; 3]> = report.imbalanced_triads.iter().map(|t| &t.members).collect();
        assert!(flagged.contains(&&[pid("p_a"), pid("q_a"), pid("root_a")]));
        let sgm = report.require_sgm().unwrap();
        assert!((-1.0..1.0).contains(&sgm));
        assert!(report
            .imbalanced_triads
            .windows(2)
            .all(|w| w[0].strength >= w[1].strength));
    }

    #[test]
    fn priority_conflicts_need_both_accepted() {
        let graph = forked(EdgeKind::PrioritizesOver);
        let walker = answer_all_a(&graph);
        let report = analyze_walker(&graph, &walker);
        assert_eq!(report.priority_conflicts.len(), 1);
        assert_eq!(report.priority_conflicts[0].dominant, pid("p_a"));

        let mut split = graph.create_walker("s");
        walk_step(&graph, &mut split, &ForkId::from("root"), Pole::A).unwrap();
        walk_step(&graph, &mut split, &ForkId::from("p"), Pole::A).unwrap();
        walk_step(&graph, &mut split, &ForkId::from("q"), Pole::B).unwrap();
        assert!(analyze_walker(&graph, &split).priority_conflicts.is_empty());
    }

    #[test]
    fn extremeness_ignores_isolated_positions() {
        let solo = ForkTree::from_specs(vec![spec("solo", None, Tier::Root)]).unwrap();
        let graph = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_tree(solo)
            .build()
            .unwrap();
        // solo_a and solo_b are answered graph positions linked only to each
        // other, so they sit in no triad.
        let vector = PositionVector::from_map(
            [
                (pid("root_a"), 1.0),
                (pid("root_b"), -1.0),
                (pid("child1_a"), 0.5),
                (pid("solo_a"), 0.2),
                (pid("solo_b"), -0.2),
            ]
            .into_iter()
            .collect(),
        );
        let explicit: BTreeSet<PositionId> =
            [pid("root_a"), pid("root_b"), pid("solo_a"), pid("solo_b")].into_iter().collect();
        let report = analyze(&graph, &vector, &explicit);
        assert!(report.imbalanced_triads.iter().all(|t| !t.members.contains(&pid("solo_a"))));
        // Counting the solo poles would give 0.6.
        assert_eq!(report.extremeness, Some(1.0));
        // root_a–root_b, root_a–child1_a, root_b–child1_a and solo_a–solo_b
        // out of ten pairs.
        assert_eq!(report.constraint, Some(0.4));
    }

    #[test]
    fn unknown_ids_are_not_supported() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let vector = PositionVector::from_map(
            [(pid("root_a"), 1.0), (pid("root_b"), -1.0), (pid("stray"), 0.2)].into_iter().collect(),
        );
        let explicit: BTreeSet<PositionId> = [pid("root_a"), pid("root_b"), pid("stray")].into_iter().collect();
        let report = analyze(&graph, &vector, &explicit);
        assert_eq!(report.constraint, Some(1.0));
        assert_eq!(report.sgm, None);
    }
}
