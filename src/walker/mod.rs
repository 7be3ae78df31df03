//! Walkers: an individual's trajectory through the fork tree.
//!
//! A [`Walker`] owns an append-only log of [`Choice`] records and the
//! [`PositionVector`] derived from it. Only [`walk_step`] and [`supersede`]
//! mutate a walker; both validate first and mutate afterwards, so a failed
//! call leaves the walker exactly as it was.
//!
//! The vector is never patched incrementally. Each step recomputes it from
//! the explicit answers (see [`propagate`]), which keeps it a pure function
//! of the graph, the explicit answers and the reachability they induce.
//!
//! # Citations
//! - Converse, "The nature of belief systems in mass publics" (1964) – constraint between idea-elements

pub mod attractor;
pub mod basin;
pub mod propagate;
pub mod trajectory;

use crate::core::{ForkId, Pole, PositionId};
use crate::error::{IdeographError, Result};
use crate::forks::Fork;
use crate::graph::PositionGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub use attractor::{
    attractor_basin, detect_attractors, detect_voids, suggest_void_exploration, Attractor,
    DensityThresholds, Void, VoidReason,
};
pub use basin::{suggest_outside_basin, Suggestion, SuggestionReason};
pub use propagate::propagate;
pub use trajectory::{Trajectory, TrajectoryPhase};

/// Acceptance strength per position; absent entries read as `0.0`.
///
/// # Invariant
/// - Every stored value is in `[-1, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionVector(BTreeMap<PositionId, f64>);

impl PositionVector {
    pub(crate) fn from_map(values: BTreeMap<PositionId, f64>) -> Self {
        Self(values)
    }

    /// Strength of a position (`0.0` when absent).
    #[inline]
    pub fn get(&self, id: &PositionId) -> f64 {
        self.0.get(id).copied().unwrap_or(0.0)
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&PositionId, f64)> {
        self.0.iter().map(|(id, v)| (id, *v))
    }

    /// Which pole of `fork` the vector leans to, with the differential
    /// `v[A] - v[B]`. `None` when the differential is zero.
    pub fn lean(&self, fork: &ForkId) -> Option<(Pole, f64)> {
        let diff = self.get(&PositionId::for_pole(fork, Pole::A))
            - self.get(&PositionId::for_pole(fork, Pole::B));
        if diff > 0.0 {
            Some((Pole::A, diff))
        } else if diff < 0.0 {
            Some((Pole::B, diff))
        } else {
            None
        }
    }
}

/// How a choice entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceOrigin {
    /// Answered directly.
    Explicit,
    /// Explicit answer replacing an earlier one for the same fork.
    Superseding,
    /// Inferred by propagation; the fork itself is unanswered.
    Propagated,
}

impl ChoiceOrigin {
    #[inline]
    pub fn is_explicit(self) -> bool {
        !matches!(self, ChoiceOrigin::Propagated)
    }
}

/// One entry of a walker's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub fork_id: ForkId,
    pub accepted_pole: Pole,
    pub origin: ChoiceOrigin,
    /// `1.0` for explicit answers; `|v[A] - v[B]|` for propagated ones.
    pub strength: f64,
}

/// A tracked individual's trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct Walker {
    id: String,
    choices: Vec<Choice>,
    explicit: BTreeMap<ForkId, Pole>,
    vector: PositionVector,
}

impl Walker {
    /// Creates an empty walker.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            choices: Vec::new(),
            explicit: BTreeMap::new(),
            vector: PositionVector::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The full log, in order.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Current derived vector.
    #[inline]
    pub fn vector(&self) -> &PositionVector {
        &self.vector
    }

    /// Strength of one position.
    #[inline]
    pub fn value(&self, id: &PositionId) -> f64 {
        self.vector.get(id)
    }

    /// Current explicit answer for a fork.
    pub fn explicit_pole(&self, fork: &ForkId) -> Option<Pole> {
        self.explicit.get(fork).copied()
    }

    /// Current explicit answers, keyed by fork.
    pub fn explicit_answers(&self) -> &BTreeMap<ForkId, Pole> {
        &self.explicit
    }

    /// Forks with an explicit answer.
    pub fn answered_forks(&self) -> HashSet<ForkId> {
        self.explicit.keys().cloned().collect()
    }

    /// Both positions of every explicitly answered fork.
    pub fn answered_positions(&self) -> Vec<PositionId> {
        self.explicit
            .keys()
            .flat_map(|fork| [Pole::A, Pole::B].map(|pole| PositionId::for_pole(fork, pole)))
            .collect()
    }

    /// Read-only, serialisable copy of the walker.
    pub fn snapshot(&self) -> WalkerSnapshot {
        WalkerSnapshot {
            walker_id: self.id.clone(),
            choices: self.choices.clone(),
            explicit: self.explicit.clone(),
            vector: self.vector.clone(),
        }
    }

    fn push(&mut self, fork_id: ForkId, accepted_pole: Pole, origin: ChoiceOrigin, strength: f64) {
        let seq = self.choices.len() as u64;
        self.choices.push(Choice {
            seq,
            fork_id,
            accepted_pole,
            origin,
            strength,
        });
    }

    /// Recomputes the vector and logs every unanswered fork whose inferred
    /// pole appeared or flipped.
    fn recompute(&mut self, graph: &PositionGraph) {
        let before = std::mem::take(&mut self.vector);
        self.vector = propagate(graph, &self.explicit);

        let forks: Vec<&Fork> = graph
            .forks()
            .filter(|fork| !self.explicit.contains_key(&fork.id))
            .collect();
        for fork in forks {
            let Some((pole, diff)) = self.vector.lean(&fork.id) else {
                continue;
            };
            if before.lean(&fork.id).map(|(old, _)| old) != Some(pole) {
                self.push(fork.id.clone(), pole, ChoiceOrigin::Propagated, diff.abs());
            }
        }
    }
}

/// Serialisable view of a walker for external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerSnapshot {
    pub walker_id: String,
    pub choices: Vec<Choice>,
    pub explicit: BTreeMap<ForkId, Pole>,
    pub vector: PositionVector,
}

impl WalkerSnapshot {
    /// Encodes the snapshot as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Decodes a snapshot from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }

    /// Encodes the snapshot as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn check_fork<'g>(graph: &'g PositionGraph, fork_id: &ForkId) -> Result<&'g Fork> {
    graph
        .fork(fork_id)
        .ok_or_else(|| IdeographError::UnknownFork(fork_id.clone()))
}

fn check_reachable(graph: &PositionGraph, walker: &Walker, fork_id: &ForkId) -> Result<()> {
    match graph.missing_ancestor(fork_id, &walker.answered_forks())? {
        Some(missing_ancestor) => Err(IdeographError::UnreachableFork {
            fork: fork_id.clone(),
            missing_ancestor,
        }),
        None => Ok(()),
    }
}

/// Records an explicit answer and re-propagates.
///
/// Fails with `UnknownFork`, `UnreachableFork` (an ancestor is unanswered)
/// or `AnswerConflict` (already answered with the other pole). Answering a
/// fork again with the same pole changes nothing. Returns a copy of the
/// updated vector.
pub fn walk_step(
    graph: &PositionGraph,
    walker: &mut Walker,
    fork_id: &ForkId,
    accepted_pole: Pole,
) -> Result<PositionVector> {
    check_fork(graph, fork_id)?;
    match walker.explicit_pole(fork_id) {
        Some(existing) if existing == accepted_pole => {
            debug!(walker = %walker.id, fork = %fork_id, pole = %accepted_pole, "repeat answer ignored");
            return Ok(walker.vector.clone());
        }
        Some(existing) => {
            return Err(IdeographError::AnswerConflict {
                fork: fork_id.clone(),
                existing,
            });
        }
        None => {}
    }
    check_reachable(graph, walker, fork_id)?;

    walker.explicit.insert(fork_id.clone(), accepted_pole);
    walker.push(fork_id.clone(), accepted_pole, ChoiceOrigin::Explicit, 1.0);
    walker.recompute(graph);

    debug!(
        walker = %walker.id,
        fork = %fork_id,
        pole = %accepted_pole,
        answered = walker.explicit.len(),
        log = walker.choices.len(),
        "walk step"
    );
    Ok(walker.vector.clone())
}

/// Replaces an earlier explicit answer and recomputes from scratch.
///
/// A fork without an earlier answer is handled exactly like [`walk_step`].
/// Descendants keep their answers: gating depends on a fork being answered,
/// not on which pole was taken.
pub fn supersede(
    graph: &PositionGraph,
    walker: &mut Walker,
    fork_id: &ForkId,
    accepted_pole: Pole,
) -> Result<PositionVector> {
    check_fork(graph, fork_id)?;
    match walker.explicit_pole(fork_id) {
        None => walk_step(graph, walker, fork_id, accepted_pole),
        Some(existing) if existing == accepted_pole => Ok(walker.vector.clone()),
        Some(previous) => {
            walker.explicit.insert(fork_id.clone(), accepted_pole);
            walker.push(fork_id.clone(), accepted_pole, ChoiceOrigin::Superseding, 1.0);
            walker.recompute(graph);
            debug!(
                walker = %walker.id,
                fork = %fork_id,
                from = %previous,
                to = %accepted_pole,
                "answer superseded"
            );
            Ok(walker.vector.clone())
        }
    }
}
