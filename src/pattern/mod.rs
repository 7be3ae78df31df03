//! Canonical patterns and matching walkers against them.
//!
//! A [`Pattern`] is a named profile of expected acceptance strengths. The
//! [`PatternLibrary`] is the validated, fingerprinted collection every walker
//! is compared to. Matching picks the nearest pattern by mean absolute
//! difference and lists the typed deviations ([`Aberration`]s) from it.
//!
//! # Citations
//! - Salton & McGill, "Introduction to Modern Information Retrieval" (1983) – cosine similarity
//! - Poole & Rosenthal, "Ideology and Congress" (2007) – ideal points and distance to canonical profiles

pub mod aberration;
pub mod canonical;

use crate::config::{EngineConfig, PatternSpec};
use crate::core::{Axis, PositionId, Tier};
use crate::error::{IdeographError, Result};
use crate::fingerprint::{push_f64, push_str, Canonicalizable, HashValue, DOMAIN_PATTERN_LIBRARY_V1};
use crate::graph::PositionGraph;
use crate::walker::{PositionVector, Walker};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub use aberration::{Aberration, AberrationKind, AberrationProfile};

/// A named canonical profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub description: String,
    /// Expected strength per position; absent positions read as `0.0`.
    pub expected: BTreeMap<PositionId, f64>,
    /// Tier at which the pattern anchors each axis.
    pub tier_expectations: BTreeMap<Axis, Tier>,
}

impl Pattern {
    /// A pattern equal to a walker's current vector, with no tier expectations.
    pub fn from_vector(id: impl Into<String>, vector: &PositionVector) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            expected: vector.iter().map(|(id, v)| (id.clone(), v)).collect(),
            tier_expectations: BTreeMap::new(),
        }
    }

    /// Expected strength of a position.
    #[inline]
    pub fn value(&self, id: &PositionId) -> f64 {
        self.expected.get(id).copied().unwrap_or(0.0)
    }
}

impl From<PatternSpec> for Pattern {
    fn from(spec: PatternSpec) -> Self {
        Self {
            id: spec.id,
            description: spec.description,
            expected: spec.expected,
            tier_expectations: spec.tier_expectations,
        }
    }
}

/// Cosine similarity between a walker and a pattern over the walker's
/// explicitly answered positions.
///
/// `None` when the walker has no answers or either side is all zeros there.
pub fn cosine_similarity(walker: &Walker, pattern: &Pattern) -> Option<f64> {
    let (mut dot, mut walker_norm, mut pattern_norm) = (0.0, 0.0, 0.0);
    for id in walker.answered_positions() {
        let w = walker.value(&id);
        let p = pattern.value(&id);
        dot += w * p;
        walker_norm += w * w;
        pattern_norm += p * p;
    }
    if walker_norm == 0.0 || pattern_norm == 0.0 {
        return None;
    }
    Some(dot / (walker_norm.sqrt() * pattern_norm.sqrt()))
}

/// The pattern a walker currently resembles most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basin {
    pub pattern_id: String,
    pub similarity: f64,
}

/// Validated, fingerprinted set of patterns, sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
    fingerprint: HashValue,
}

impl PatternLibrary {
    /// Validates pattern definitions against a graph.
    ///
    /// Fails with `Config` on duplicate ids, unknown positions or values
    /// outside `[-1, 1]`.
    pub fn from_specs(
        graph: &PositionGraph,
        specs: impl IntoIterator<Item = PatternSpec>,
    ) -> Result<Self> {
        Self::new(graph, specs.into_iter().map(Pattern::from).collect())
    }

    /// Validates already constructed patterns against a graph.
    pub fn new(graph: &PositionGraph, mut patterns: Vec<Pattern>) -> Result<Self> {
        let mut ids = BTreeSet::new();
        for pattern in &patterns {
            if !ids.insert(pattern.id.as_str()) {
                return Err(IdeographError::config(format!(
                    "duplicate pattern id {}",
                    pattern.id
                )));
            }
            for (position, &value) in &pattern.expected {
                if !graph.contains_position(position) {
                    return Err(IdeographError::config(format!(
                        "pattern {} references unknown position {position}",
                        pattern.id
                    )));
                }
                if value.is_nan() || !(-1.0..=1.0).contains(&value) {
                    return Err(IdeographError::config(format!(
                        "pattern {}: {position} = {value} is outside [-1, 1]",
                        pattern.id
                    )));
                }
            }
        }
        patterns.sort_by(|a, b| a.id.cmp(&b.id));
        let mut library = Self {
            patterns,
            fingerprint: HashValue::zero(),
        };
        library.fingerprint = library.fingerprint_in(DOMAIN_PATTERN_LIBRARY_V1);
        Ok(library)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in id order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.patterns[idx])
    }

    #[inline]
    pub fn fingerprint(&self) -> HashValue {
        self.fingerprint
    }

    /// Most similar pattern at or above `min_similarity`; ties go to the
    /// smaller id.
    pub fn best_basin(&self, walker: &Walker, min_similarity: f64) -> Option<Basin> {
        let mut best: Option<Basin> = None;
        for pattern in &self.patterns {
            let Some(similarity) = cosine_similarity(walker, pattern) else {
                continue;
            };
            if similarity < min_similarity {
                continue;
            }
            if best.as_ref().map_or(true, |b| similarity > b.similarity) {
                best = Some(Basin {
                    pattern_id: pattern.id.clone(),
                    similarity,
                });
            }
        }
        best
    }
}

impl Canonicalizable for PatternLibrary {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.patterns.len() as u64).to_le_bytes());
        for pattern in &self.patterns {
            push_str(&mut out, &pattern.id);
            out.extend_from_slice(&(pattern.expected.len() as u64).to_le_bytes());
            for (position, value) in &pattern.expected {
                push_str(&mut out, position.as_str());
                push_f64(&mut out, *value);
            }
            out.extend_from_slice(&(pattern.tier_expectations.len() as u64).to_le_bytes());
            for (axis, tier) in &pattern.tier_expectations {
                push_str(&mut out, &axis.to_string());
                out.push(tier.rank());
            }
        }
        out
    }
}

/// Result of matching a walker against a pattern set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub walker_id: String,
    pub pattern_id: String,
    /// Mean absolute difference over positions present on either side.
    pub distance: f64,
    pub aberrations: Vec<Aberration>,
}

/// Mean absolute difference between a walker and a pattern over the union
/// of positions present on either side. Zero when both are empty.
pub fn distance(walker: &Walker, pattern: &Pattern, config: &EngineConfig) -> f64 {
    let union = present_union(walker, pattern, config);
    if union.is_empty() {
        return 0.0;
    }
    let total: f64 = union
        .iter()
        .map(|id| (pattern.value(id) - walker.value(id)).abs())
        .sum();
    total / union.len() as f64
}

pub(crate) fn present_union<'a>(
    walker: &'a Walker,
    pattern: &'a Pattern,
    config: &EngineConfig,
) -> BTreeSet<&'a PositionId> {
    walker
        .vector()
        .iter()
        .filter(|(_, v)| config.is_present(*v))
        .map(|(id, _)| id)
        .chain(
            pattern
                .expected
                .iter()
                .filter(|(_, v)| config.is_present(**v))
                .map(|(id, _)| id),
        )
        .collect()
}

/// Finds the nearest pattern and the walker's aberrations from it.
///
/// Ties on distance go to the smaller pattern id. Fails with
/// `NoPatternProvided` on an empty slice.
pub fn match_walker(
    graph: &PositionGraph,
    walker: &Walker,
    patterns: &[Pattern],
    config: &EngineConfig,
) -> Result<PatternMatch> {
    let mut best: Option<(&Pattern, f64)> = None;
    for pattern in patterns {
        let d = distance(walker, pattern, config);
        let better = match best {
            None => true,
            Some((current, best_d)) => d < best_d || (d == best_d && pattern.id < current.id),
        };
        if better {
            best = Some((pattern, d));
        }
    }
    let (pattern, distance) = best.ok_or(IdeographError::NoPatternProvided)?;
    let aberrations = aberration::detect(graph, walker, pattern, config);

    debug!(
        walker = walker.id(),
        pattern = %pattern.id,
        distance,
        aberrations = aberrations.len(),
        "walker matched"
    );
    Ok(PatternMatch {
        walker_id: walker.id().to_string(),
        pattern_id: pattern.id.clone(),
        distance,
        aberrations,
    })
}
