//! Productive tension: which of a walker's inconsistencies are worth
//! challenging, and where a challenge is likely to move them.
//!
//! Every tension carries a score (how sharp the inconsistency is) and a
//! tractability (how movable the positions involved are). Foundational
//! tiers resist change; concrete policy gives way easily. Firmly held
//! positions resist more than propagated leanings.
//!
//! # Citations
//! - Festinger, "A Theory of Cognitive Dissonance" (1957)
//! - Rokeach, "The Nature of Human Values" (1973) – central beliefs resist change

use crate::balance::analyze_walker;
use crate::core::{Pole, PositionId, Tier};
use crate::graph::edge::Sign;
use crate::graph::PositionGraph;
use crate::walker::Walker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Imbalanced triads read per walker.
pub const MAX_TRIAD_TENSIONS: usize = 5;

/// Kind of inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionKind {
    ImbalancedTriad,
    /// Both ends of a PRIORITIZES_OVER edge are accepted.
    PriorityConflict,
    /// A policy answer with no accepted, more abstract position implying it.
    LevelMismatch,
}

/// One inconsistency in a walker's vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tension {
    pub kind: TensionKind,
    pub positions: Vec<PositionId>,
    pub score: f64,
    /// In `[0, 1]`; higher is easier to move.
    pub tractability: f64,
}

impl Tension {
    /// `score × tractability`.
    #[inline]
    pub fn challenge_value(&self) -> f64 {
        self.score * self.tractability
    }
}

/// An open position worth putting to the walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub position: PositionId,
    /// In `[0, 1]`.
    pub score: f64,
}

fn tier_tractability(tier: Tier) -> f64 {
    match tier {
        Tier::Root | Tier::Meta | Tier::Axiom => 0.2,
        Tier::Domain => 0.6,
        Tier::Policy => 0.9,
    }
}

fn tier_challenge(tier: Tier) -> f64 {
    match tier {
        Tier::Root | Tier::Meta | Tier::Axiom => 0.3,
        Tier::Domain => 1.0,
        Tier::Policy => 0.6,
    }
}

/// Mean over positions of tier tractability × `(1.5 - |v|)`, capped at 1.
pub fn tractability(graph: &PositionGraph, walker: &Walker, positions: &[PositionId]) -> f64 {
    if positions.is_empty() {
        return 0.5;
    }
    let sum: f64 = positions
        .iter()
        .map(|id| match graph.position(id) {
            Some(position) => tier_tractability(position.tier) * (1.5 - walker.value(id).abs()),
            None => 0.5,
        })
        .sum();
    (sum / positions.len() as f64).min(1.0)
}

fn level_mismatches(graph: &PositionGraph, walker: &Walker) -> Vec<Tension> {
    let epsilon = graph.config().presence_epsilon;
    walker
        .explicit_answers()
        .iter()
        .filter_map(|(fork_id, pole)| graph.fork(fork_id).map(|fork| fork.position_id(*pole)))
        .filter(|id| graph.position(id).is_some_and(|p| p.tier == Tier::Policy))
        .filter(|id| {
            !graph.edges_to(id).any(|edge| {
                edge.kind.propagates()
                    && edge.sign == Sign::Positive
                    && walker.value(&edge.source) > epsilon
                    && graph
                        .position(&edge.source)
                        .is_some_and(|source| source.tier < Tier::Policy)
            })
        })
        .map(|id| Tension {
            kind: TensionKind::LevelMismatch,
            positions: vec![id],
            score: 0.6,
            tractability: 0.8,
        })
        .collect()
}

/// Every tension in the walker's vector, highest challenge value first;
/// ties go to kind, then positions.
///
/// Reads the strongest [`MAX_TRIAD_TENSIONS`] imbalanced triads, every
/// priority conflict and every level mismatch.
pub fn find_tensions(graph: &PositionGraph, walker: &Walker) -> Vec<Tension> {
    let report = analyze_walker(graph, walker);
    let mut tensions: Vec<Tension> = report
        .imbalanced_triads
        .iter()
        .take(MAX_TRIAD_TENSIONS)
        .map(|triad| {
            let positions = triad.members.to_vec();
            Tension {
                kind: TensionKind::ImbalancedTriad,
                tractability: tractability(graph, walker, &positions),
                positions,
                score: triad.strength,
            }
        })
        .collect();
    tensions.extend(report.priority_conflicts.iter().map(|conflict| Tension {
        kind: TensionKind::PriorityConflict,
        positions: vec![conflict.dominant.clone(), conflict.subordinate.clone()],
        score: conflict.weight,
        tractability: 0.7,
    }));
    tensions.extend(level_mismatches(graph, walker));

    tensions.sort_by(|a, b| {
        b.challenge_value()
            .total_cmp(&a.challenge_value())
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.positions.cmp(&b.positions))
    });
    debug!(walker = walker.id(), tensions = tensions.len(), "tensions found");
    tensions
}

/// Up to `n` positions of reachable, unanswered forks, best challenge
/// first; ties go to position id.
///
/// Mid-tier, well connected, weakly held positions that sit in an
/// imbalanced triad score highest.
pub fn suggest_challenge(graph: &PositionGraph, walker: &Walker, n: usize) -> Vec<Challenge> {
    let report = analyze_walker(graph, walker);
    let in_tension: BTreeSet<&PositionId> = report
        .imbalanced_triads
        .iter()
        .flat_map(|triad| triad.members.iter())
        .collect();

    let mut challenges: Vec<Challenge> = graph
        .reachable_forks(&walker.answered_forks())
        .into_iter()
        .flat_map(|fork| [Pole::A, Pole::B].map(|pole| fork.position_id(pole)))
        .filter_map(|id| {
            let position = graph.position(&id)?;
            let degree = graph.edges_from(&id).count() + graph.edges_to(&id).count();
            let mut score = tier_challenge(position.tier) * 0.3
                + (degree as f64 / 10.0).min(1.0) * 0.3
                + (1.0 - walker.value(&id).abs()) * 0.2;
            if in_tension.contains(&id) {
                score += 0.2;
            }
            Some(Challenge {
                position: id,
                score: score.min(1.0),
            })
        })
        .collect();
    challenges.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.position.cmp(&b.position))
    });
    challenges.truncate(n);
    challenges
}
