//! Suggestions that lie outside a walker's current basin.
//!
//! The basin is the canonical pattern closest (by cosine similarity over the
//! explicitly answered positions) to the walker. Suggestions are unanswered
//! positions the basin rejects, or that pull against what the walker has
//! already answered through shared edges.

use super::Walker;
use crate::core::PositionId;
use crate::graph::edge::EdgeKind;
use crate::graph::PositionGraph;
use crate::pattern::PatternLibrary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Why a position was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionReason {
    /// The basin pattern expects the position to be rejected.
    BasinRejects,
    /// Edges to answered positions correlate negatively.
    EdgeTension,
}

/// A position worth exploring outside the basin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub position: PositionId,
    /// Basin value when it is negative, otherwise the edge correlation.
    pub expected: f64,
    pub reason: SuggestionReason,
    /// Pattern the walker's basin was matched to.
    pub basin: String,
}

/// Unanswered positions that lie outside the walker's basin.
///
/// Empty when the walker has no answers or no pattern reaches the minimum
/// basin similarity. Ordered by `|expected|` descending, then position id.
pub fn suggest_outside_basin(
    graph: &PositionGraph,
    walker: &Walker,
    library: &PatternLibrary,
) -> Vec<Suggestion> {
    let Some(basin) = library.best_basin(walker, graph.config().min_basin_similarity) else {
        debug!(walker = walker.id(), "no confident basin");
        return Vec::new();
    };
    let Some(pattern) = library.get(&basin.pattern_id) else {
        return Vec::new();
    };

    let answered: HashSet<PositionId> = walker.answered_positions().into_iter().collect();
    let mut suggestions = Vec::new();
    for position in graph.positions() {
        if answered.contains(&position.id) {
            continue;
        }
        let expected = pattern.value(&position.id);
        let correlation: f64 = graph
            .neighbors(&position.id, &EdgeKind::ALL)
            .into_iter()
            .filter(|n| answered.contains(n.position))
            .map(|n| n.edge.sign.value() * walker.value(n.position))
            .sum();

        let suggestion = if expected < 0.0 {
            Some((expected, SuggestionReason::BasinRejects))
        } else if correlation < 0.0 {
            Some((correlation, SuggestionReason::EdgeTension))
        } else {
            None
        };
        if let Some((expected, reason)) = suggestion {
            suggestions.push(Suggestion {
                position: position.id.clone(),
                expected,
                reason,
                basin: basin.pattern_id.clone(),
            });
        }
    }

    suggestions.sort_by(|a, b| {
        b.expected
            .abs()
            .total_cmp(&a.expected.abs())
            .then_with(|| a.position.cmp(&b.position))
    });
    debug!(
        walker = walker.id(),
        basin = %basin.pattern_id,
        similarity = basin.similarity,
        suggestions = suggestions.len(),
        "outside-basin suggestions"
    );
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, PatternSpec};
    use crate::core::{ForkId, Pole};
    use crate::forks::tests::chain;
    use crate::walker::walk_step;
    use std::collections::BTreeMap;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    fn setup() -> (PositionGraph, PatternLibrary) {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let expected: BTreeMap<PositionId, f64> = [
            (pid("root_a"), 1.0),
            (pid("root_b"), -1.0),
            (pid("child1_a"), 0.8),
            (pid("child1_b"), -0.8),
            (pid("child2_a"), -0.6),
        ]
        .into_iter()
        .collect();
        let library = PatternLibrary::from_specs(
            &graph,
            [PatternSpec {
                id: "rooted".into(),
                description: String::new(),
                expected,
                tier_expectations: BTreeMap::new(),
            }],
        )
        .unwrap();
        (graph, library)
    }

    #[test]
    fn no_answers_no_suggestions() {
        let (graph, library) = setup();
        let walker = graph.create_walker("empty");
        assert!(suggest_outside_basin(&graph, &walker, &library).is_empty());
    }

    #[test]
    fn suggestions_come_from_basin_and_edges() {
        let (graph, library) = setup();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &ForkId::from("root"), Pole::A).unwrap();

        let suggestions = suggest_outside_basin(&graph, &walker, &library);
        let ids: Vec<&str> = suggestions.iter().map(|s| s.position.as_str()).collect();
        // child1_b: basin -0.8; child2_a: basin -0.6.
        assert_eq!(ids, vec!["child1_b", "child2_a"]);
        assert_eq!(suggestions[0].reason, SuggestionReason::BasinRejects);
        assert_eq!(suggestions[0].basin, "rooted");
        assert!(!ids.contains(&"root_b"));
    }

    #[test]
    fn dissimilar_walker_has_no_basin() {
        let (graph, library) = setup();
        let mut walker = graph.create_walker("w");
        walk_step(&graph, &mut walker, &ForkId::from("root"), Pole::B).unwrap();
        assert!(suggest_outside_basin(&graph, &walker, &library).is_empty());
    }
}
