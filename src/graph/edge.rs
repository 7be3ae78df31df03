//! Typed, signed edges between positions.
//!
//! Edge behaviour is a closed set: every [`EdgeKind`] maps to a fixed
//! [`Propagation`] rule through [`EdgeKind::propagation`]. The walker never
//! dispatches on anything but this table.
//!
//! # Citations
//! - Cartwright & Harary, "Structural balance: a generalization of Heider's theory" (1956) – signed edges
//! - Pearl, "Causality" (2009), Ch. 1 – colliders, confounders and mediators

use crate::core::PositionId;
use crate::error::{IdeographError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign of a relation: `+1` (consonant) or `-1` (dissonant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Sign as a float factor.
    #[inline]
    pub const fn value(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }

    /// Sign of a nonzero number; `None` for zero or NaN.
    pub fn of(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Sign::Positive)
        } else if value < 0.0 {
            Some(Sign::Negative)
        } else {
            None
        }
    }

    /// Product of two signs.
    #[inline]
    pub const fn times(self, other: Sign) -> Sign {
        match (self, other) {
            (Sign::Positive, Sign::Positive) | (Sign::Negative, Sign::Negative) => Sign::Positive,
            _ => Sign::Negative,
        }
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> i8 {
        match sign {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(raw: i8) -> std::result::Result<Self, Self::Error> {
        match raw {
            1 => Ok(Sign::Positive),
            -1 => Ok(Sign::Negative),
            other => Err(format!("edge sign must be +1 or -1, got {other}")),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sign::Positive => "+",
            Sign::Negative => "-",
        })
    }
}

/// Type of relation between two positions.
///
/// Variant order is the tie-break order when several edges join one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Holding the source typically means holding the target.
    Implies,
    /// Source and target rarely coexist.
    Contradicts,
    /// Gateway between two positions; propagates like `Implies`.
    Mediator,
    /// When the two clash, the source wins.
    PrioritizesOver,
    /// Two incompatible paths arrive at the same position.
    Collider,
    /// A hidden variable drives both positions.
    Confounder,
}

/// How an edge kind moves acceptance during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Carries acceptance along the edge with the given fixed sign.
    Carry(Sign),
    /// Never propagates; only read by the balance engine.
    Inert,
}

impl EdgeKind {
    /// All kinds, in tie-break order.
    pub const ALL: [EdgeKind; 6] = [
        EdgeKind::Implies,
        EdgeKind::Contradicts,
        EdgeKind::Mediator,
        EdgeKind::PrioritizesOver,
        EdgeKind::Collider,
        EdgeKind::Confounder,
    ];

    /// Kinds that carry acceptance during a walk.
    pub const PROPAGATING: [EdgeKind; 3] =
        [EdgeKind::Implies, EdgeKind::Contradicts, EdgeKind::Mediator];

    /// The propagation table.
    pub const fn propagation(self) -> Propagation {
        match self {
            EdgeKind::Implies | EdgeKind::Mediator => Propagation::Carry(Sign::Positive),
            EdgeKind::Contradicts => Propagation::Carry(Sign::Negative),
            EdgeKind::PrioritizesOver | EdgeKind::Collider | EdgeKind::Confounder => {
                Propagation::Inert
            }
        }
    }

    /// Sign imposed by the kind, if any.
    pub const fn fixed_sign(self) -> Option<Sign> {
        match self.propagation() {
            Propagation::Carry(sign) => Some(sign),
            Propagation::Inert => None,
        }
    }

    /// Sign used when a declared edge of this kind omits one.
    pub const fn default_sign(self) -> Sign {
        match self {
            EdgeKind::Implies | EdgeKind::Mediator | EdgeKind::Collider | EdgeKind::Confounder => {
                Sign::Positive
            }
            EdgeKind::Contradicts | EdgeKind::PrioritizesOver => Sign::Negative,
        }
    }

    /// Whether this kind carries acceptance.
    #[inline]
    pub const fn propagates(self) -> bool {
        matches!(self.propagation(), Propagation::Carry(_))
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeKind::Implies => "IMPLIES",
            EdgeKind::Contradicts => "CONTRADICTS",
            EdgeKind::Mediator => "MEDIATOR",
            EdgeKind::PrioritizesOver => "PRIORITIZES_OVER",
            EdgeKind::Collider => "COLLIDER",
            EdgeKind::Confounder => "CONFOUNDER",
        };
        f.write_str(name)
    }
}

/// Where an edge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    /// Emitted by a fork tree (pole/pole or parent/child).
    Tree,
    /// Declared cross-link; may form cycles.
    CrossLink,
}

/// A directed, typed, signed, weighted edge.
///
/// # Invariants
/// - `source != target`.
/// - `weight` is in `[0, 1]`.
/// - `sign` equals `kind.fixed_sign()` whenever that is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PositionId,
    pub target: PositionId,
    pub kind: EdgeKind,
    pub sign: Sign,
    pub weight: f64,
    pub origin: EdgeOrigin,
}

impl Edge {
    /// Creates a validated edge.
    ///
    /// `sign` defaults to the kind's default sign and must agree with the
    /// kind's fixed sign when it has one.
    pub fn new(
        source: PositionId,
        target: PositionId,
        kind: EdgeKind,
        sign: Option<Sign>,
        weight: f64,
        origin: EdgeOrigin,
    ) -> Result<Self> {
        if source == target {
            return Err(IdeographError::config(format!(
                "self-edge on {source} ({kind})"
            )));
        }
        if weight.is_nan() || !(0.0..=1.0).contains(&weight) {
            return Err(IdeographError::config(format!(
                "edge {source} -> {target} ({kind}) has weight {weight} outside [0, 1]"
            )));
        }
        let sign = match (kind.fixed_sign(), sign) {
            (Some(fixed), Some(given)) if fixed != given => {
                return Err(IdeographError::config(format!(
                    "edge {source} -> {target}: {kind} is always {fixed}, declared {given}"
                )));
            }
            (Some(fixed), _) => fixed,
            (None, Some(given)) => given,
            (None, None) => kind.default_sign(),
        };
        Ok(Self {
            source,
            target,
            kind,
            sign,
            weight,
            origin,
        })
    }

    /// The endpoint opposite `position`, if `position` is an endpoint.
    pub fn other_end(&self, position: &PositionId) -> Option<&PositionId> {
        if &self.source == position {
            Some(&self.target)
        } else if &self.target == position {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Whether the edge touches `position`.
    #[inline]
    pub fn touches(&self, position: &PositionId) -> bool {
        &self.source == position || &self.target == position
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}{}-> {} (w={:.2})",
            self.source, self.kind, self.sign, self.target, self.weight
        )
    }
}
