//! Adaptive probing: ask the forks earlier answers fail to predict.
//!
//! Before each answer the prober reads the walker's lean on the fork
//! (`v[A] − v[B]`, the same propagation the walker uses). After the answer it
//! compares:
//!
//! - a **match** means the fork was redundant for this walker and bumps the
//!   fork's global match counter;
//! - a **mismatch** is a surprise: the fork's axis is flagged as an
//!   orthogonal dimension for this walker and the mismatch counter grows;
//! - no lean at all is recorded as unpredicted and counts nowhere.
//!
//! Forks are then ranked by expected information gain, i.e. how often they
//! have surprised walkers so far.
//!
//! Counterfactual probes follow a MEDIATOR or CONFOUNDER edge out of an
//! accepted answer to an open fork and ask whether a changed premise would
//! move the walker there.
//!
//! # Citations
//! - Settles, "Active Learning Literature Survey" (2009) – uncertainty sampling
//! - van der Linden & Glas, "Elements of Adaptive Testing" (2010) – item selection by information

pub mod stats;

use crate::core::{Axis, ForkId, Pole, PositionId};
use crate::error::{IdeographError, Result};
use crate::graph::edge::EdgeKind;
use crate::graph::PositionGraph;
use crate::walker::{walk_step, Walker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub use stats::{ForkCounts, RedundancyStats};

/// Predicted pole of a reachable, unanswered fork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub fork_id: ForkId,
    pub pole: Pole,
    /// `|v[A] − v[B]|`.
    pub confidence: f64,
}

/// How an answer compared with the prediction made just before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Answer matched the prediction.
    Redundant,
    /// Answer contradicted the prediction.
    Surprise,
    /// No prediction was available.
    Unpredicted,
    /// The fork already carried this answer; nothing was recorded.
    Repeated,
}

/// One probed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub fork_id: ForkId,
    pub answered: Pole,
    pub predicted: Option<Pole>,
    pub outcome: ProbeOutcome,
    pub axis: Axis,
}

/// Per-walker probing state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeSession {
    walker_id: String,
    records: Vec<ProbeRecord>,
    orthogonal: BTreeSet<Axis>,
}

impl ProbeSession {
    pub fn new(walker_id: impl Into<String>) -> Self {
        Self {
            walker_id: walker_id.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn walker_id(&self) -> &str {
        &self.walker_id
    }

    /// Every probed answer, in order.
    pub fn outcomes(&self) -> &[ProbeRecord] {
        &self.records
    }

    /// Axes on which this walker's answers were not predictable.
    pub fn orthogonal_dimensions(&self) -> &BTreeSet<Axis> {
        &self.orthogonal
    }

    /// Surprises over predicted answers; `None` before any prediction.
    pub fn surprise_rate(&self) -> Option<f64> {
        let predicted = self
            .records
            .iter()
            .filter(|r| matches!(r.outcome, ProbeOutcome::Redundant | ProbeOutcome::Surprise))
            .count();
        let surprises = self
            .records
            .iter()
            .filter(|r| r.outcome == ProbeOutcome::Surprise)
            .count();
        (predicted > 0).then(|| surprises as f64 / predicted as f64)
    }
}

/// A candidate fork with its expected information gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFork {
    pub fork_id: ForkId,
    pub information_gain: f64,
    pub depth: usize,
}

/// A "suppose ..." question about a position downstream of an accepted
/// answer through a causal edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualProbe {
    /// Accepted position the edge leaves from.
    pub premise: PositionId,
    pub target: PositionId,
    pub target_fork: ForkId,
    /// `Mediator` or `Confounder`.
    pub via: EdgeKind,
    pub question: String,
    /// Current lean on the target fork, when it is reachable and leans.
    pub prediction: Option<Prediction>,
}

/// Prediction, comparison and ranking over shared redundancy counters.
#[derive(Debug, Clone)]
pub struct Prober {
    stats: Arc<RedundancyStats>,
}

impl Prober {
    /// A prober over counters shared with other probers.
    pub fn new(stats: Arc<RedundancyStats>) -> Self {
        Self { stats }
    }

    /// A prober with fresh counters for every fork of the graph.
    pub fn for_graph(graph: &PositionGraph) -> Self {
        Self::new(Arc::new(RedundancyStats::for_graph(graph)))
    }

    /// The shared counters.
    pub fn stats(&self) -> &Arc<RedundancyStats> {
        &self.stats
    }

    /// Predicted poles for every reachable, unanswered fork with a nonzero
    /// lean. Reads the walker without changing it.
    pub fn predict(&self, graph: &PositionGraph, walker: &Walker) -> Vec<Prediction> {
        graph
            .reachable_forks(&walker.answered_forks())
            .into_iter()
            .filter_map(|fork| {
                let (pole, diff) = walker.vector().lean(&fork.id)?;
                Some(Prediction {
                    fork_id: fork.id.clone(),
                    pole,
                    confidence: diff.abs(),
                })
            })
            .collect()
    }

    /// Answers a fork and scores the answer against the prior prediction.
    ///
    /// All-or-nothing: if the walk step fails, neither the session nor the
    /// counters change.
    pub fn answer(
        &self,
        graph: &PositionGraph,
        walker: &mut Walker,
        session: &mut ProbeSession,
        fork_id: &ForkId,
        pole: Pole,
    ) -> Result<ProbeRecord> {
        let fork = graph
            .fork(fork_id)
            .ok_or_else(|| IdeographError::UnknownFork(fork_id.clone()))?;
        // The counter set is fixed at construction, so a fork known here can
        // always be recorded after the walk step.
        self.stats.counts(fork_id)?;
        let repeated = walker.explicit_pole(fork_id).is_some();
        let predicted = walker.vector().lean(fork_id).map(|(pole, _)| pole);

        walk_step(graph, walker, fork_id, pole)?;

        let outcome = match predicted {
            _ if repeated => ProbeOutcome::Repeated,
            None => ProbeOutcome::Unpredicted,
            Some(expected) if expected == pole => ProbeOutcome::Redundant,
            Some(_) => ProbeOutcome::Surprise,
        };
        match outcome {
            ProbeOutcome::Redundant => self.stats.record(fork_id, true)?,
            ProbeOutcome::Surprise => {
                self.stats.record(fork_id, false)?;
                if session.orthogonal.insert(fork.axis) {
                    warn!(
                        walker = walker.id(),
                        fork = %fork_id,
                        axis = %fork.axis,
                        "orthogonal dimension flagged"
                    );
                }
            }
            ProbeOutcome::Unpredicted | ProbeOutcome::Repeated => {}
        }

        let record = ProbeRecord {
            fork_id: fork_id.clone(),
            answered: pole,
            predicted,
            outcome,
            axis: fork.axis,
        };
        debug!(
            walker = walker.id(),
            fork = %fork_id,
            outcome = ?outcome,
            "probe answered"
        );
        session.records.push(record.clone());
        Ok(record)
    }

    /// Reachable, unanswered forks by expected information gain, highest
    /// first; ties go to the shallower fork, then to fork id.
    pub fn rank_forks(&self, graph: &PositionGraph, walker: &Walker) -> Vec<RankedFork> {
        let mut ranked: Vec<RankedFork> = graph
            .reachable_forks(&walker.answered_forks())
            .into_iter()
            .map(|fork| RankedFork {
                fork_id: fork.id.clone(),
                information_gain: self.stats.information_gain(&fork.id),
                depth: fork.depth,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.information_gain
                .total_cmp(&a.information_gain)
                .then_with(|| a.depth.cmp(&b.depth))
                .then_with(|| a.fork_id.cmp(&b.fork_id))
        });
        ranked
    }

    /// The single best fork to ask next, if any fork is still open.
    pub fn next_best_fork(&self, graph: &PositionGraph, walker: &Walker) -> Option<RankedFork> {
        self.rank_forks(graph, walker).into_iter().next()
    }

    /// The first MEDIATOR or CONFOUNDER edge, in answered-position order,
    /// from an accepted answer to a fork the walker has not answered.
    pub fn counterfactual(
        &self,
        graph: &PositionGraph,
        walker: &Walker,
        scenario: &str,
    ) -> Option<CounterfactualProbe> {
        let answered = walker.answered_forks();
        let accepted: Vec<PositionId> = walker
            .explicit_answers()
            .iter()
            .map(|(fork, pole)| PositionId::for_pole(fork, *pole))
            .collect();
        for premise in &accepted {
            for edge in graph.edges_from(premise) {
                if !matches!(edge.kind, EdgeKind::Mediator | EdgeKind::Confounder) {
                    continue;
                }
                let Some(target) = graph.position(&edge.target) else {
                    continue;
                };
                if answered.contains(&target.fork_id) {
                    continue;
                }
                let prediction = graph
                    .tree_of(&target.fork_id)
                    .filter(|tree| tree.is_reachable(&target.fork_id, &answered))
                    .and_then(|_| walker.vector().lean(&target.fork_id))
                    .map(|(pole, diff)| Prediction {
                        fork_id: target.fork_id.clone(),
                        pole,
                        confidence: diff.abs(),
                    });
                debug!(
                    walker = walker.id(),
                    premise = %premise,
                    target = %target.id,
                    via = %edge.kind,
                    "counterfactual probe"
                );
                return Some(CounterfactualProbe {
                    premise: premise.clone(),
                    target: target.id.clone(),
                    target_fork: target.fork_id.clone(),
                    via: edge.kind,
                    question: format!(
                        "Suppose {scenario}. Would that change your view on: {}?",
                        target.claim
                    ),
                    prediction,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrossLinkSpec, EngineConfig};
    use crate::core::Tier;
    use crate::forks::tests::{chain, spec};
    use crate::forks::ForkTree;

    fn fid(raw: &str) -> ForkId {
        ForkId::from(raw)
    }

    /// root with children `left` and `right`.
    fn fan() -> PositionGraph {
        let tree = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("left", Some("root"), Tier::Axiom),
            spec("right", Some("root"), Tier::Axiom),
        ])
        .unwrap();
        PositionGraph::from_tree(tree, EngineConfig::default()).unwrap()
    }

    #[test]
    fn higher_mismatch_rate_ranks_first() {
        let graph = fan();
        let prober = Prober::for_graph(&graph);
        prober.stats().add(&fid("left"), 1, 9).unwrap();
        prober.stats().add(&fid("right"), 9, 1).unwrap();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &fid("root"), Pole::A).unwrap();

        let ranked = prober.rank_forks(&graph, &walker);
        assert_eq!(ranked[0].fork_id, fid("left"));
        assert!((ranked[0].information_gain - 0.9).abs() < 1e-12);
        assert!((ranked[1].information_gain - 0.1).abs() < 1e-12);
    }

    #[test]
    fn mismatch_rates_point_eight_and_point_one() {
        let graph = fan();
        let prober = Prober::for_graph(&graph);
        prober.stats().add(&fid("right"), 2, 8).unwrap();
        prober.stats().add(&fid("left"), 9, 1).unwrap();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &fid("root"), Pole::A).unwrap();
        assert_eq!(prober.next_best_fork(&graph, &walker).unwrap().fork_id, fid("right"));
    }

    #[test]
    fn fresh_walker_can_only_be_asked_the_root() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let prober = Prober::for_graph(&graph);
        let walker = graph.create_walker("w");
        let ranked = prober.rank_forks(&graph, &walker);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].fork_id, fid("root"));
        assert_eq!(ranked[0].information_gain, stats::UNOBSERVED_GAIN);
    }

    #[test]
    fn match_and_surprise_update_counters_and_session() {
        let graph = fan();
        let prober = Prober::for_graph(&graph);
        let mut walker = graph.create_walker("w");
        let mut session = ProbeSession::new("w");

        let first = prober.answer(&graph, &mut walker, &mut session, &fid("root"), Pole::A).unwrap();
        assert_eq!(first.outcome, ProbeOutcome::Unpredicted);
        assert_eq!(session.surprise_rate(), None);

        let predictions = prober.predict(&graph, &walker);
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.pole == Pole::A));

        let hit = prober.answer(&graph, &mut walker, &mut session, &fid("left"), Pole::A).unwrap();
        assert_eq!(hit.outcome, ProbeOutcome::Redundant);
        let miss = prober.answer(&graph, &mut walker, &mut session, &fid("right"), Pole::B).unwrap();
        assert_eq!(miss.outcome, ProbeOutcome::Surprise);

        assert_eq!(prober.stats().counts(&fid("left")).unwrap().matches, 1);
        assert_eq!(prober.stats().counts(&fid("right")).unwrap().mismatches, 1);
        assert!(session.orthogonal_dimensions().contains(&Axis::Uncategorized));
        assert_eq!(session.surprise_rate(), Some(0.5));
        assert_eq!(session.outcomes().len(), 3);
    }

    #[test]
    fn failed_answer_changes_nothing() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let prober = Prober::for_graph(&graph);
        let mut walker = graph.create_walker("w");
        let mut session = ProbeSession::new("w");

        let err = prober
            .answer(&graph, &mut walker, &mut session, &fid("child2"), Pole::A)
            .unwrap_err();
        assert!(matches!(err, IdeographError::UnreachableFork { .. }));
        assert!(session.outcomes().is_empty());
        assert!(walker.choices().is_empty());
        assert_eq!(prober.stats().snapshot().values().map(ForkCounts::observations).sum::<u64>(), 0);
    }

    #[test]
    fn counters_from_another_graph_reject_before_answering() {
        let graph = fan();
        let other = PositionGraph::from_tree(
            ForkTree::from_specs(vec![spec("solo", None, Tier::Root)]).unwrap(),
            EngineConfig::default(),
        )
        .unwrap();
        let prober = Prober::new(Arc::new(RedundancyStats::for_graph(&other)));
        let mut walker = graph.create_walker("w");
        let mut session = ProbeSession::new("w");

        let err = prober
            .answer(&graph, &mut walker, &mut session, &fid("root"), Pole::A)
            .unwrap_err();
        assert!(matches!(err, IdeographError::UnknownFork(ref f) if *f == fid("root")));
        assert_eq!(walker.explicit_pole(&fid("root")), None);
        assert!(walker.vector().is_empty());
        assert!(walker.choices().is_empty());
        assert!(session.outcomes().is_empty());
    }

    #[test]
    fn repeated_answers_are_not_counted() {
        let graph = fan();
        let prober = Prober::for_graph(&graph);
        let mut walker = graph.create_walker("w");
        let mut session = ProbeSession::new("w");
        prober.answer(&graph, &mut walker, &mut session, &fid("root"), Pole::A).unwrap();
        prober.answer(&graph, &mut walker, &mut session, &fid("left"), Pole::A).unwrap();
        let again = prober.answer(&graph, &mut walker, &mut session, &fid("left"), Pole::A).unwrap();
        assert_eq!(again.outcome, ProbeOutcome::Repeated);
        assert_eq!(prober.stats().counts(&fid("left")).unwrap().observations(), 1);
    }

    #[test]
    fn counterfactual_follows_causal_edges_to_open_forks() {
        let tree = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("left", Some("root"), Tier::Axiom),
            spec("right", Some("root"), Tier::Axiom),
        ])
        .unwrap();
        let graph = PositionGraph::builder(EngineConfig::default())
            .with_tree(tree)
            .with_cross_links([CrossLinkSpec {
                source: PositionId::from("left_a"),
                target: PositionId::from("right_b"),
                kind: EdgeKind::Confounder,
                weight: 0.5,
                sign: None,
            }])
            .build()
            .unwrap();
        let prober = Prober::for_graph(&graph);
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &fid("root"), Pole::A).unwrap();
        assert!(prober.counterfactual(&graph, &walker, "x").is_none());

        walk_step(&graph, &mut walker, &fid("left"), Pole::A).unwrap();
        let probe = prober.counterfactual(&graph, &walker, "trade collapsed").unwrap();
        assert_eq!(probe.premise, PositionId::from("left_a"));
        assert_eq!(probe.target, PositionId::from("right_b"));
        assert_eq!(probe.via, EdgeKind::Confounder);
        assert!(probe.question.starts_with("Suppose trade collapsed."));
        // Confounders do not propagate, so the lean still comes from the root.
        assert_eq!(probe.prediction.map(|p| p.pole), Some(Pole::A));

        walk_step(&graph, &mut walker, &fid("right"), Pole::B).unwrap();
        assert!(prober.counterfactual(&graph, &walker, "x").is_none());
    }

    #[test]
    fn plain_tree_has_no_counterfactuals() {
        let graph = fan();
        let prober = Prober::for_graph(&graph);
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &fid("root"), Pole::A).unwrap();
        walk_step(&graph, &mut walker, &fid("left"), Pole::B).unwrap();
        assert!(prober.counterfactual(&graph, &walker, "x").is_none());
    }
}
