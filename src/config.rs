//! Configuration surface of the engine.
//!
//! Everything the engine needs is supplied as data: the fork-tree
//! definition, cross-link edges, canonical patterns and a handful of numeric
//! parameters. The whole surface deserialises from JSON or CBOR and is
//! validated once by [`IdeographConfig::build`]; nothing is re-checked at
//! walk time.

use crate::core::{Axis, ForkId, PositionId, Tier};
use crate::error::{IdeographError, Result};
use crate::graph::edge::{EdgeKind, Sign};
use crate::graph::PositionGraph;
use crate::pattern::PatternLibrary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric parameters of propagation, basin detection and matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied per propagation hop, in `(0, 1]`.
    pub attenuation: f64,
    /// Propagation along a path stops once `|strength|` drops below this.
    pub propagation_threshold: f64,
    /// Weight of parent→child IMPLIES/CONTRADICTS edges emitted by fork trees.
    pub tree_edge_weight: f64,
    /// Minimum cosine similarity for a pattern to count as a walker's basin.
    pub min_basin_similarity: f64,
    /// Opposite-sign differences at or below this are not inversions.
    pub inversion_tolerance: f64,
    /// Strengths with `|v|` at or below this count as absent.
    pub presence_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attenuation: 0.8,
            propagation_threshold: 0.05,
            tree_edge_weight: 0.6,
            min_basin_similarity: 0.5,
            inversion_tolerance: 0.25,
            presence_epsilon: 1e-6,
        }
    }
}

impl EngineConfig {
    /// Checks every parameter against its admissible range.
    pub fn validate(&self) -> Result<()> {
        check_range("attenuation", self.attenuation, f64::MIN_POSITIVE, 1.0)?;
        check_range(
            "propagation_threshold",
            self.propagation_threshold,
            f64::MIN_POSITIVE,
            1.0,
        )?;
        check_range("tree_edge_weight", self.tree_edge_weight, 0.0, 1.0)?;
        check_range("min_basin_similarity", self.min_basin_similarity, -1.0, 1.0)?;
        check_range("inversion_tolerance", self.inversion_tolerance, 0.0, 2.0)?;
        check_range("presence_epsilon", self.presence_epsilon, 0.0, 0.5)?;
        Ok(())
    }

    /// Whether a strength counts as present.
    #[inline]
    pub fn is_present(&self, value: f64) -> bool {
        value.abs() > self.presence_epsilon
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_nan() || value < min || value > max {
        return Err(IdeographError::config(format!(
            "{name} = {value} is outside [{min}, {max}]"
        )));
    }
    Ok(())
}

/// Label and claim of one pole of a fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoleSpec {
    /// Short valence label ("inherent", "constructed").
    pub label: String,
    /// Full claim text.
    pub claim: String,
}

impl PoleSpec {
    /// Creates a pole description.
    pub fn new(label: impl Into<String>, claim: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            claim: claim.into(),
        }
    }
}

fn default_half() -> f64 {
    0.5
}

/// Definition of one fork in a fork tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkSpec {
    /// Unique fork id.
    pub id: ForkId,
    /// The dilemma framing.
    #[serde(default)]
    pub question: String,
    /// Parent fork; `None` for the root.
    #[serde(default)]
    pub parent: Option<ForkId>,
    /// Depth class.
    pub tier: Tier,
    /// Topical region.
    #[serde(default)]
    pub axis: Axis,
    /// First option.
    pub pole_a: PoleSpec,
    /// Second option.
    pub pole_b: PoleSpec,
    /// How strongly the fork divides people; weight of the pole/pole edge.
    #[serde(default = "default_half")]
    pub polarization: f64,
    /// How much downstream this fork affects.
    #[serde(default = "default_half")]
    pub importance: f64,
}

/// A declared edge cutting across the tree backbone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossLinkSpec {
    pub source: PositionId,
    pub target: PositionId,
    pub kind: EdgeKind,
    #[serde(default = "default_half")]
    pub weight: f64,
    /// Required to agree with the kind's fixed sign, when it has one.
    #[serde(default)]
    pub sign: Option<Sign>,
}

/// Definition of a canonical pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Unique pattern id.
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Expected acceptance strength per position, each in `[-1, 1]`.
    pub expected: BTreeMap<PositionId, f64>,
    /// Tier at which this pattern anchors each axis.
    #[serde(default)]
    pub tier_expectations: BTreeMap<Axis, Tier>,
}

/// The complete configuration surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeographConfig {
    pub engine: EngineConfig,
    pub forks: Vec<ForkSpec>,
    pub cross_links: Vec<CrossLinkSpec>,
    pub patterns: Vec<PatternSpec>,
}

impl IdeographConfig {
    /// The reference configuration: canonical 25-fork tree, its cross-links
    /// and canonical patterns.
    pub fn canonical() -> Self {
        Self {
            engine: EngineConfig::default(),
            forks: crate::forks::canonical::canonical_forks(),
            cross_links: crate::forks::canonical::canonical_cross_links(),
            patterns: crate::pattern::canonical::canonical_patterns(),
        }
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a configuration from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }

    /// Serializes the configuration to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Validates everything and builds the shared reference data.
    pub fn build(&self) -> Result<(PositionGraph, PatternLibrary)> {
        let tree = crate::forks::ForkTree::from_specs(self.forks.clone())?;
        let graph = PositionGraph::builder(self.engine.clone())
            .with_tree(tree)
            .with_cross_links(self.cross_links.iter().cloned())
            .build()?;
        let library = PatternLibrary::from_specs(&graph, self.patterns.iter().cloned())?;
        Ok((graph, library))
    }
}
