//! Typed deviations of a walker from a canonical pattern.
//!
//! Borrowing the vocabulary of chromosomal aberrations: a position the
//! pattern expects but the walker lacks is a *deletion*, an unexpected one is
//! an *insertion*, a shared position anchored at the wrong tier is a
//! *translocation*, and a shared position with flipped sign is an
//! *inversion*.

use super::{present_union, Pattern};
use crate::config::EngineConfig;
use crate::core::{Axis, PositionId};
use crate::graph::PositionGraph;
use crate::walker::Walker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest possible tier distance (ROOT to POLICY).
const MAX_TIER_DISTANCE: f64 = 4.0;

/// Number of aberrations at which the count factor saturates.
const COUNT_SATURATION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AberrationKind {
    /// Expected by the pattern, absent in the walker.
    Deletion,
    /// Present in the walker, absent in the pattern.
    Insertion,
    /// Present in both, but the pattern anchors the axis at another tier.
    Translocation,
    /// Present in both with opposite signs beyond tolerance.
    Inversion,
}

impl fmt::Display for AberrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AberrationKind::Deletion => "DELETION",
            AberrationKind::Insertion => "INSERTION",
            AberrationKind::Translocation => "TRANSLOCATION",
            AberrationKind::Inversion => "INVERSION",
        })
    }
}

/// One deviation. Computed on demand, never stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aberration {
    pub walker_id: String,
    pub pattern_id: String,
    pub position_id: PositionId,
    pub kind: AberrationKind,
    /// `|p|`, `|w|`, tier distance or `|p - w|` depending on `kind`.
    pub magnitude: f64,
    /// Axis of the position.
    pub axis: Axis,
}

impl Aberration {
    /// Magnitude scaled into `[0, 1]`.
    pub fn normalized_magnitude(&self) -> f64 {
        let scaled = match self.kind {
            AberrationKind::Deletion | AberrationKind::Insertion => self.magnitude,
            AberrationKind::Translocation => self.magnitude / MAX_TIER_DISTANCE,
            AberrationKind::Inversion => self.magnitude / 2.0,
        };
        scaled.clamp(0.0, 1.0)
    }
}

impl fmt::Display for Aberration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} vs {} ({}, {:.2})",
            self.kind, self.position_id, self.pattern_id, self.axis, self.magnitude
        )
    }
}

/// Lists every aberration of `walker` against `pattern`, in position order.
///
/// A position can carry both a translocation and an inversion.
pub fn detect(
    graph: &PositionGraph,
    walker: &Walker,
    pattern: &Pattern,
    config: &EngineConfig,
) -> Vec<Aberration> {
    let mut out = Vec::new();
    for id in present_union(walker, pattern, config) {
        let p = pattern.value(id);
        let w = walker.value(id);
        let position = graph.position(id);
        let axis = position.map(|pos| pos.axis).unwrap_or_default();
        let mut push = |kind, magnitude| {
            out.push(Aberration {
                walker_id: walker.id().to_string(),
                pattern_id: pattern.id.clone(),
                position_id: id.clone(),
                kind,
                magnitude,
                axis,
            })
        };

        match (config.is_present(p), config.is_present(w)) {
            (true, false) => push(AberrationKind::Deletion, p.abs()),
            (false, true) => push(AberrationKind::Insertion, w.abs()),
            (true, true) => {
                if let Some(pos) = position {
                    if let Some(expected) = pattern.tier_expectations.get(&pos.axis) {
                        if *expected != pos.tier {
                            push(
                                AberrationKind::Translocation,
                                f64::from(expected.distance(pos.tier)),
                            );
                        }
                    }
                }
                if p.signum() != w.signum() && (p - w).abs() > config.inversion_tolerance {
                    push(AberrationKind::Inversion, (p - w).abs());
                }
            }
            (false, false) => {}
        }
    }
    out
}

/// Summary of a walker's aberrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AberrationProfile {
    pub walker_id: String,
    pub aberrations: Vec<Aberration>,
    /// Mean normalised magnitude × `(0.5 + 0.5 × min(1, n/10))`.
    pub uniqueness: f64,
    /// Most frequent kind; ties go to kind order.
    pub dominant_kind: Option<AberrationKind>,
    /// Most frequent axis; ties go to axis order.
    pub primary_axis: Option<Axis>,
}

impl AberrationProfile {
    pub fn from_aberrations(walker_id: impl Into<String>, aberrations: Vec<Aberration>) -> Self {
        let n = aberrations.len();
        let uniqueness = if n == 0 {
            0.0
        } else {
            let mean = aberrations.iter().map(Aberration::normalized_magnitude).sum::<f64>() / n as f64;
            mean * (0.5 + 0.5 * (n as f64 / COUNT_SATURATION).min(1.0))
        };
        let dominant_kind = most_frequent(aberrations.iter().map(|a| a.kind));
        let primary_axis = most_frequent(aberrations.iter().map(|a| a.axis));
        Self {
            walker_id: walker_id.into(),
            aberrations,
            uniqueness,
            dominant_kind,
            primary_axis,
        }
    }

    pub fn by_kind(&self, kind: AberrationKind) -> impl Iterator<Item = &Aberration> {
        self.aberrations.iter().filter(move |a| a.kind == kind)
    }

    pub fn by_axis(&self, axis: Axis) -> impl Iterator<Item = &Aberration> {
        self.aberrations.iter().filter(move |a| a.axis == axis)
    }

    /// No aberrations at all.
    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.aberrations.is_empty()
    }
}

fn most_frequent<T: Ord + Copy>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    // Iteration is ascending, so `>` keeps the smallest key on ties.
    let mut best: Option<(T, usize)> = None;
    for (item, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ForkId, Pole, Tier};
    use crate::forks::tests::chain;
    use crate::walker::walk_step;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    fn walked() -> (PositionGraph, Walker) {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &ForkId::from("root"), Pole::A).unwrap();
        (graph, walker)
    }

    fn kinds(aberrations: &[Aberration]) -> Vec<(&str, AberrationKind)> {
        aberrations.iter().map(|a| (a.position_id.as_str(), a.kind)).collect()
    }

    #[test]
    fn identical_pattern_has_no_aberrations() {
        let (graph, walker) = walked();
        let pattern = Pattern::from_vector("self", walker.vector());
        assert!(detect(&graph, &walker, &pattern, &EngineConfig::default()).is_empty());
    }

    #[test]
    fn deletion_insertion_inversion() {
        let (graph, walker) = walked();
        let mut pattern = Pattern::from_vector("p", walker.vector());
        pattern.expected.remove(&pid("child1_a"));
        pattern.expected.insert(pid("child2_b"), 0.7);
        pattern.expected.insert(pid("root_a"), -0.5);

        let found = detect(&graph, &walker, &pattern, &EngineConfig::default());
        assert_eq!(
            kinds(&found),
            vec![
                ("child1_a", AberrationKind::Insertion),
                ("child2_b", AberrationKind::Deletion),
                ("root_a", AberrationKind::Inversion),
            ]
        );
        assert!((found[2].magnitude - 1.5).abs() < 1e-12);
        assert!((found[1].magnitude - 0.7).abs() < 1e-12);
    }

    #[test]
    fn small_opposite_differences_are_tolerated() {
        let (graph, mut walker) = walked();
        walk_step(&graph, &mut walker, &ForkId::from("child1"), Pole::A).unwrap();
        let mut pattern = Pattern::from_vector("p", walker.vector());
        let w = walker.value(&pid("child2_a"));
        assert!(w > 0.0);
        // Opposite sign but within tolerance only if |p - w| <= 0.25.
        pattern.expected.insert(pid("child2_a"), -0.01);
        let found = detect(&graph, &walker, &pattern, &EngineConfig::default());
        let inverted = found.iter().any(|a| a.kind == AberrationKind::Inversion);
        assert_eq!(inverted, (w + 0.01) > 0.25);
    }

    #[test]
    fn translocation_uses_tier_distance() {
        let (graph, walker) = walked();
        let mut pattern = Pattern::from_vector("p", walker.vector());
        pattern.tier_expectations.insert(Axis::Uncategorized, Tier::Policy);
        let found = detect(&graph, &walker, &pattern, &EngineConfig::default());
        let root = found
            .iter()
            .find(|a| a.position_id == pid("root_a"))
            .unwrap();
        assert_eq!(root.kind, AberrationKind::Translocation);
        assert_eq!(root.magnitude, 4.0);
        assert_eq!(root.normalized_magnitude(), 1.0);
    }

    #[test]
    fn profile_summarises() {
        let make = |kind, magnitude, axis| Aberration {
            walker_id: "w".into(),
            pattern_id: "p".into(),
            position_id: pid("x"),
            kind,
            magnitude,
            axis,
        };
        let profile = AberrationProfile::from_aberrations(
            "w",
            vec![
                make(AberrationKind::Inversion, 2.0, Axis::Economics),
                make(AberrationKind::Deletion, 0.5, Axis::Economics),
                make(AberrationKind::Inversion, 1.0, Axis::Social),
            ],
        );
        // mean(1.0, 0.5, 0.5) × (0.5 + 0.5 × 0.3)
        assert!((profile.uniqueness - (2.0 / 3.0) * 0.65).abs() < 1e-12);
        assert_eq!(profile.dominant_kind, Some(AberrationKind::Inversion));
        assert_eq!(profile.primary_axis, Some(Axis::Economics));
        assert_eq!(profile.by_kind(AberrationKind::Inversion).count(), 2);

        let empty = AberrationProfile::from_aberrations("w", Vec::new());
        assert!(empty.is_canonical());
        assert_eq!(empty.uniqueness, 0.0);
        assert_eq!(empty.dominant_kind, None);
    }
}
