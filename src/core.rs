//! Core identifiers and immutable records of the ideological graph.
//!
//! A [`Position`] is one pole of a binary fork. Positions are created once by
//! the fork-tree builder and never change afterwards; walkers only ever hold
//! *strengths* keyed by [`PositionId`].
//!
//! # Citations
//! - Converse, "The nature of belief systems in mass publics" (1964) – belief elements and constraint
//! - Heider, "Attitudes and cognitive organization" (1946) – attitude objects as graph nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a fork (binary dilemma) in the fork tree.
///
/// # Invariant
/// - Unique across every fork tree loaded into one `PositionGraph`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForkId(String);

impl ForkId {
    /// Creates a fork id from any string-like value.
    #[inline]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ForkId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a position (one pole of a fork).
///
/// Positions derived from a fork follow the `<fork_id>_a` / `<fork_id>_b`
/// convention; see [`PositionId::for_pole`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(String);

impl PositionId {
    /// Creates a position id from any string-like value.
    #[inline]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Canonical id of the given pole of a fork.
    pub fn for_pole(fork: &ForkId, pole: Pole) -> Self {
        Self(format!("{}_{}", fork.as_str(), pole.suffix()))
    }

    /// Returns the raw string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PositionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One side of a binary fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pole {
    /// First option of the dilemma.
    A,
    /// Second option of the dilemma.
    B,
}

impl Pole {
    /// The other pole of the same fork.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Pole::A => Pole::B,
            Pole::B => Pole::A,
        }
    }

    /// Suffix used in derived position ids.
    #[inline]
    pub const fn suffix(self) -> &'static str {
        match self {
            Pole::A => "a",
            Pole::B => "b",
        }
    }
}

impl fmt::Display for Pole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pole::A => "A",
            Pole::B => "B",
        })
    }
}

/// Depth class of a fork and of both its positions.
///
/// The derived `Ord` follows tree depth: `Root < Meta < Axiom < Domain < Policy`.
/// A child fork's tier is never shallower than its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Deepest questions (meaning, human nature).
    Root,
    /// Ontological commitments.
    Meta,
    /// Foundational values.
    Axiom,
    /// Area-specific stances and organising frameworks.
    Domain,
    /// Concrete policy positions.
    Policy,
}

impl Tier {
    /// All tiers in depth order.
    pub const ALL: [Tier; 5] = [Tier::Root, Tier::Meta, Tier::Axiom, Tier::Domain, Tier::Policy];

    /// Zero-based depth rank of this tier.
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Number of tier steps between two tiers.
    #[inline]
    pub fn distance(self, other: Tier) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Root => "ROOT",
            Tier::Meta => "META",
            Tier::Axiom => "AXIOM",
            Tier::Domain => "DOMAIN",
            Tier::Policy => "POLICY",
        };
        f.write_str(name)
    }
}

/// Topical region a fork belongs to.
///
/// Orthogonal to [`Tier`]: a policy fork and an axiom fork can share an axis.
/// Patterns key their tier expectations by axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Metaphysics,
    Epistemology,
    Governance,
    Economics,
    Social,
    CivilLiberties,
    ForeignPolicy,
    Technology,
    Environment,
    Identity,
    #[default]
    Uncategorized,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Metaphysics => "metaphysics",
            Axis::Epistemology => "epistemology",
            Axis::Governance => "governance",
            Axis::Economics => "economics",
            Axis::Social => "social",
            Axis::CivilLiberties => "civil_liberties",
            Axis::ForeignPolicy => "foreign_policy",
            Axis::Technology => "technology",
            Axis::Environment => "environment",
            Axis::Identity => "identity",
            Axis::Uncategorized => "uncategorized",
        };
        f.write_str(name)
    }
}

/// A node in the position graph: one pole of a fork.
///
/// Immutable once emitted by `ForkTree::to_graph_positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique identifier (`<fork>_a` / `<fork>_b`).
    pub id: PositionId,
    /// Fork this position is a pole of.
    pub fork_id: ForkId,
    /// Which pole of the fork.
    pub pole: Pole,
    /// Short valence label of the pole, e.g. "inherent" vs "constructed".
    pub label: String,
    /// Full claim text.
    pub claim: String,
    /// Depth class, shared with the owning fork.
    pub tier: Tier,
    /// Topical region, shared with the owning fork.
    pub axis: Axis,
    /// Depth in the fork tree (root = 0).
    pub level: usize,
}

impl Position {
    /// Id of the opposite pole of the same fork.
    pub fn sibling_id(&self) -> PositionId {
        PositionId::for_pole(&self.fork_id, self.pole.opposite())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} {}]: {}", self.id, self.tier, self.axis, self.label)
    }
}

/// Clamps a strength into the closed interval `[-1, 1]`.
///
/// NaN collapses to `0.0` so a malformed weight can never leak into a vector.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
