//! Ideograph: belief trajectories through a tree of ideological forks.
//!
//! An ideology is modelled as a path through binary dilemmas ("forks")
//! arranged in a tree of decreasing abstraction, from a single root question
//! down to concrete policies. The crate provides:
//! - a validated fork tree whose two poles per fork become positions in a
//!   signed, weighted [`PositionGraph`], enriched by typed cross-links;
//! - [`Walker`]s that answer reachable forks and propagate the consequences
//!   through the graph with attenuation;
//! - structural balance scoring (SGM, extremeness, constraint) of a walker's
//!   position vector;
//! - pattern matching against canonical profiles, with typed aberrations;
//! - adaptive probing that learns which forks are redundant and ranks the
//!   rest by expected information gain, plus counterfactual probes;
//! - trajectory momentum, population attractors and voids, productive
//!   tensions and archetypes.
//!
//! # Name Origin: "Ideograph"
//!
//! McGee's "ideograph" is a one-term sum of an ideological commitment:
//! "liberty", "equality", "the people". Each fork pole here is one such term,
//! and a walker's vector is the pattern of ideographs it has come to accept.
//!
//! # Concurrency
//!
//! A built [`PositionGraph`] and [`PatternLibrary`] are immutable and
//! `Send + Sync`; share them behind an `Arc`. Walkers are independent values
//! owned by one caller at a time. Redundancy counters are atomic and shared
//! by every [`Prober`].
//!
//! # References
//!
//! - McGee, M.C. "The 'ideograph': A link between rhetoric and ideology" (1980)
//! - Converse, P. "The nature of belief systems in mass publics" (1964)
//! - Heider, F. "Attitudes and cognitive organization" (1946)
//! - Cartwright, Harary. "Structural balance" (1956)
//!
//! # Example
//!
//! ```
//! use ideograph::prelude::*;
//!
//! let (graph, library) = IdeographConfig::canonical().build().unwrap();
//! let mut walker = graph.create_walker("reader");
//! walk_step(&graph, &mut walker, &ForkId::from("meaning"), Pole::B).unwrap();
//! walk_step(&graph, &mut walker, &ForkId::from("knowledge"), Pole::B).unwrap();
//!
//! assert!(walker.value(&PositionId::from("change_a")) != 0.0);
//! let report = analyze_walker(&graph, &walker);
//! assert!(report.is_balanced());
//! let matched = match_walker(&graph, &walker, library.patterns(), graph.config()).unwrap();
//! assert!(!matched.pattern_id.is_empty());
//! ```

pub mod balance;
pub mod config;
pub mod core;
pub mod error;
pub mod fingerprint;
pub mod forks;
pub mod graph;
pub mod pattern;
pub mod probe;
pub mod tension;
pub mod walker;

pub use crate::balance::{analyze_walker, BalanceReport};
pub use crate::config::{EngineConfig, IdeographConfig};
pub use crate::core::{Axis, ForkId, Pole, Position, PositionId, Tier};
pub use crate::error::{IdeographError, Result};
pub use crate::forks::{Fork, ForkTree};
pub use crate::graph::{GraphBuilder, PositionGraph};
pub use crate::pattern::{match_walker, Pattern, PatternLibrary, PatternMatch};
pub use crate::probe::{Prober, ProbeSession, RedundancyStats};
pub use crate::walker::{supersede, walk_step, PositionVector, Walker};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::balance::{analyze, analyze_walker, BalanceReport, ImbalancedTriad, PriorityConflict};
    pub use crate::config::{
        CrossLinkSpec, EngineConfig, ForkSpec, IdeographConfig, PatternSpec, PoleSpec,
    };
    pub use crate::core::{Axis, ForkId, Pole, Position, PositionId, Tier};
    pub use crate::error::{IdeographError, Result};
    pub use crate::fingerprint::{Canonicalizable, HashValue};
    pub use crate::forks::compaction::{Archetype, ForkDecisiveness, TreeShape};
    pub use crate::forks::{Fork, ForkTree};
    pub use crate::graph::edge::{Edge, EdgeKind, EdgeOrigin, Sign};
    pub use crate::graph::{GraphBuilder, PositionGraph, Triad};
    pub use crate::pattern::{
        cosine_similarity, distance, match_walker, Aberration, AberrationKind,
        AberrationProfile, Basin, Pattern, PatternLibrary, PatternMatch,
    };
    pub use crate::probe::{
        CounterfactualProbe, ForkCounts, Prediction, ProbeOutcome, ProbeRecord, ProbeSession,
        Prober, RankedFork, RedundancyStats,
    };
    pub use crate::tension::{find_tensions, suggest_challenge, Challenge, Tension, TensionKind};
    pub use crate::walker::{
        detect_attractors, detect_voids, suggest_outside_basin, suggest_void_exploration,
        supersede, walk_step, Attractor, Choice, ChoiceOrigin, DensityThresholds, PositionVector,
        Suggestion, SuggestionReason, Trajectory, TrajectoryPhase, Void, VoidReason, Walker,
        WalkerSnapshot,
    };
}
