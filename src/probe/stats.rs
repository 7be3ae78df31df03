//! Global per-fork redundancy counters.
//!
//! The counter map is fixed when the stats are built from a graph; only the
//! counts change afterwards. Counts are increment-only `AtomicU64`s with
//! relaxed ordering, so any number of walkers on any number of threads can
//! record through a shared `Arc<RedundancyStats>` without locks. Readers may
//! see slightly stale counts, which ranking tolerates.

use crate::core::ForkId;
use crate::error::{IdeographError, Result};
use crate::graph::PositionGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Expected information gain of a fork nobody has observed yet.
pub const UNOBSERVED_GAIN: f64 = 0.5;

#[derive(Debug, Default)]
struct Counters {
    matches: AtomicU64,
    mismatches: AtomicU64,
}

/// Match/mismatch counts of one fork at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkCounts {
    pub matches: u64,
    pub mismatches: u64,
}

impl ForkCounts {
    #[inline]
    pub fn observations(&self) -> u64 {
        self.matches + self.mismatches
    }

    /// `matches / observations`, `None` when unobserved.
    pub fn redundancy_rate(&self) -> Option<f64> {
        let total = self.observations();
        (total > 0).then(|| self.matches as f64 / total as f64)
    }

    /// `1 - redundancy_rate`, or the prior when unobserved.
    pub fn information_gain(&self) -> f64 {
        self.redundancy_rate().map_or(UNOBSERVED_GAIN, |rate| 1.0 - rate)
    }
}

/// Shared redundancy counters for every fork of a graph.
#[derive(Debug)]
pub struct RedundancyStats {
    counters: HashMap<ForkId, Counters>,
}

impl RedundancyStats {
    /// Zeroed counters for every fork in the graph.
    pub fn for_graph(graph: &PositionGraph) -> Self {
        Self {
            counters: graph
                .forks()
                .map(|fork| (fork.id.clone(), Counters::default()))
                .collect(),
        }
    }

    fn counters(&self, fork: &ForkId) -> Result<&Counters> {
        self.counters
            .get(fork)
            .ok_or_else(|| IdeographError::UnknownFork(fork.clone()))
    }

    /// Records one prediction outcome.
    pub fn record(&self, fork: &ForkId, matched: bool) -> Result<()> {
        self.add(fork, u64::from(matched), u64::from(!matched))
    }

    /// Adds bulk counts, e.g. when restoring from a snapshot.
    pub fn add(&self, fork: &ForkId, matches: u64, mismatches: u64) -> Result<()> {
        let counters = self.counters(fork)?;
        counters.matches.fetch_add(matches, Ordering::Relaxed);
        counters.mismatches.fetch_add(mismatches, Ordering::Relaxed);
        Ok(())
    }

    /// Current counts of one fork.
    pub fn counts(&self, fork: &ForkId) -> Result<ForkCounts> {
        let counters = self.counters(fork)?;
        Ok(ForkCounts {
            matches: counters.matches.load(Ordering::Relaxed),
            mismatches: counters.mismatches.load(Ordering::Relaxed),
        })
    }

    /// Expected information gain of one fork; the prior for unknown forks.
    pub fn information_gain(&self, fork: &ForkId) -> f64 {
        self.counts(fork)
            .map_or(UNOBSERVED_GAIN, |counts| counts.information_gain())
    }

    /// Point-in-time copy of every counter, sorted by fork id.
    pub fn snapshot(&self) -> BTreeMap<ForkId, ForkCounts> {
        self.counters
            .keys()
            .filter_map(|fork| Some((fork.clone(), self.counts(fork).ok()?)))
            .collect()
    }

    /// Restores counts from a snapshot. Forks unknown to this graph are
    /// rejected before anything is added.
    pub fn restore(&self, snapshot: &BTreeMap<ForkId, ForkCounts>) -> Result<()> {
        if let Some(unknown) = snapshot.keys().find(|fork| !self.counters.contains_key(*fork)) {
            return Err(IdeographError::UnknownFork(unknown.clone()));
        }
        for (fork, counts) in snapshot {
            self.add(fork, counts.matches, counts.mismatches)?;
        }
        Ok(())
    }
}
