//! Momentum and phase of a walker's motion through the tree.
//!
//! Each explicit answer pushes the momentum of its fork's axis toward `+1`
//! (pole A) or `-1` (pole B) with an exponential moving average. Velocity is
//! the mean size of the recent momentum changes; the phase reads both.

use super::Walker;
use crate::core::{Axis, Pole};
use crate::graph::PositionGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight kept from the previous momentum on every step.
pub const MOMENTUM_RETENTION: f64 = 0.7;

/// Steps read for velocity and oscillation.
pub const RECENT_WINDOW: usize = 4;

/// Velocity above which a walker is still moving.
pub const TRANSITION_VELOCITY: f64 = 0.2;

/// Where a walker is in its motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryPhase {
    /// Fewer than three explicit steps.
    Early,
    /// Momentum is still changing fast.
    Transitioning,
    /// Momentum has stopped changing much.
    Settled,
    /// Recent steps keep reversing an axis.
    Oscillating,
}

/// Momentum summary of one walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Per-axis momentum in `[-1, 1]`; positive leans to pole A.
    pub momentum: BTreeMap<Axis, f64>,
    /// Mean `|Δmomentum|` over the recent window.
    pub velocity: f64,
    pub phase: TrajectoryPhase,
    /// Explicit steps read.
    pub steps: usize,
    /// Steps that pushed an axis against its current momentum.
    pub reversals: usize,
}

impl Trajectory {
    /// Replays the walker's explicit and superseding choices in log order.
    ///
    /// Choices on forks the graph does not know are skipped.
    pub fn of(graph: &PositionGraph, walker: &Walker) -> Self {
        let mut momentum: BTreeMap<Axis, f64> = BTreeMap::new();
        let mut deltas = Vec::new();
        let mut reversed = Vec::new();
        for choice in walker.choices().iter().filter(|c| c.origin.is_explicit()) {
            let Some(fork) = graph.fork(&choice.fork_id) else {
                continue;
            };
            let direction = match choice.accepted_pole {
                Pole::A => 1.0,
                Pole::B => -1.0,
            };
            let m = momentum.entry(fork.axis).or_insert(0.0);
            let before = *m;
            *m = before * MOMENTUM_RETENTION + direction * (1.0 - MOMENTUM_RETENTION);
            deltas.push((*m - before).abs());
            reversed.push(before * direction < 0.0);
        }

        let steps = deltas.len();
        let recent = steps.saturating_sub(RECENT_WINDOW);
        let velocity = if steps == 0 {
            0.0
        } else {
            deltas[recent..].iter().sum::<f64>() / (steps - recent) as f64
        };
        let recent_reversals = reversed[recent..].iter().filter(|r| **r).count();
        let phase = if steps < 3 {
            TrajectoryPhase::Early
        } else if recent_reversals >= 2 {
            TrajectoryPhase::Oscillating
        } else if velocity > TRANSITION_VELOCITY {
            TrajectoryPhase::Transitioning
        } else {
            TrajectoryPhase::Settled
        };

        Self {
            momentum,
            velocity,
            phase,
            steps,
            reversals: reversed.iter().filter(|r| **r).count(),
        }
    }

    /// Momentum of one axis (`0.0` when the walker never answered on it).
    #[inline]
    pub fn momentum_on(&self, axis: Axis) -> f64 {
        self.momentum.get(&axis).copied().unwrap_or(0.0)
    }

    /// The axis with the largest `|momentum|`; ties go to axis order.
    pub fn dominant_axis(&self) -> Option<Axis> {
        self.momentum
            .iter()
            .fold(None, |best: Option<(Axis, f64)>, (axis, m)| match best {
                Some((_, b)) if b >= m.abs() => best,
                _ => Some((*axis, m.abs())),
            })
            .map(|(axis, _)| axis)
    }
}
