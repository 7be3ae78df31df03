//! Fork decisiveness and tree compaction.
//!
//! Ranks forks by how much knowing their answer tells about the rest of the
//! tree, and extracts the smallest prefix of that ranking whose cumulative
//! information gain reaches a target. Structural metrics come from the tree
//! alone; empirical metrics are added when walkers are supplied.
//!
//! Archetypes are named combinations of answers on decisive forks. A
//! walker's fit to one is the share of its leaning forks that agree.
//!
//! # Citations
//! - Freeman, "A set of measures of centrality based on betweenness" (1977)
//! - Quinlan, "Induction of decision trees" (1986) – information gain as a split criterion
//! - Haidt, "The Righteous Mind" (2012) – recurring moral-political types

use super::{Fork, ForkTree};
use crate::core::{ForkId, Pole, Tier};
use crate::walker::Walker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How decisive one fork is for downstream positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkDecisiveness {
    pub fork_id: ForkId,
    /// Positions in the fork's subtree, the fork's own two included.
    pub downstream_positions: usize,
    pub depth: usize,
    /// Approximate betweenness in `[0, 1]`; peaks mid-tree.
    pub betweenness: f64,
    /// polarization × 0.4 + downstream share × 0.3 + importance × 0.3.
    pub information_gain: f64,
    /// Share of answered children that followed the parent's pole.
    pub prediction_accuracy: f64,
    /// `4p(1 - p)` over walkers that answered the fork.
    pub variance_explained: f64,
    /// Downstream positions as a share of all positions.
    pub downstream_share: f64,
}

impl ForkDecisiveness {
    /// Combined decisiveness score.
    pub fn score(&self) -> f64 {
        self.information_gain * 0.3
            + self.prediction_accuracy * 0.25
            + self.downstream_share * 0.2
            + self.variance_explained * 0.15
            + self.betweenness * 0.1
    }
}

fn count_downstream(tree: &ForkTree, id: &ForkId) -> usize {
    2 + tree
        .children_of(id)
        .iter()
        .map(|child| count_downstream(tree, child))
        .sum::<usize>()
}

fn betweenness(tree: &ForkTree, fork: &Fork, max_depth: usize) -> f64 {
    let children = tree.children_of(&fork.id).len() as f64;
    let half = max_depth as f64 / 2.0;
    let depth_factor = 1.0 - (fork.depth as f64 - half).abs() / (half + 1.0);
    (children * 0.2 * depth_factor).clamp(0.0, 1.0)
}

fn prediction_accuracy(tree: &ForkTree, fork: &Fork, walkers: &[Walker]) -> f64 {
    let children = tree.children_of(&fork.id);
    if walkers.is_empty() {
        return 0.0;
    }
    if children.is_empty() {
        return 0.5;
    }
    let (mut followed, mut total) = (0usize, 0usize);
    for walker in walkers {
        let Some(parent_pole) = walker.explicit_pole(&fork.id) else {
            continue;
        };
        for child in children {
            if let Some(child_pole) = walker.explicit_pole(child) {
                total += 1;
                if child_pole == parent_pole {
                    followed += 1;
                }
            }
        }
    }
    if total == 0 {
        0.5
    } else {
        followed as f64 / total as f64
    }
}

fn variance_explained(fork: &Fork, walkers: &[Walker]) -> f64 {
    let (mut a, mut total) = (0usize, 0usize);
    for pole in walkers.iter().filter_map(|w| w.explicit_pole(&fork.id)) {
        total += 1;
        if pole == Pole::A {
            a += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    let p = a as f64 / total as f64;
    4.0 * p * (1.0 - p)
}

/// Decisiveness of every fork, most decisive first; ties go to fork id.
///
/// With no walkers the empirical terms are zero and the ranking is purely
/// structural.
pub fn analyze(tree: &ForkTree, walkers: &[Walker]) -> Vec<ForkDecisiveness> {
    let max_depth = tree.max_depth();
    let total_positions = (tree.len() * 2) as f64;
    let mut out: Vec<ForkDecisiveness> = tree
        .forks()
        .map(|fork| {
            let downstream_positions = count_downstream(tree, &fork.id);
            let downstream_share = downstream_positions as f64 / total_positions;
            ForkDecisiveness {
                fork_id: fork.id.clone(),
                downstream_positions,
                depth: fork.depth,
                betweenness: betweenness(tree, fork, max_depth),
                information_gain: fork.polarization * 0.4
                    + downstream_share * 0.3
                    + fork.importance * 0.3,
                prediction_accuracy: prediction_accuracy(tree, fork, walkers),
                variance_explained: variance_explained(fork, walkers),
                downstream_share,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.fork_id.cmp(&b.fork_id))
    });
    out
}

/// Smallest prefix of a ranking whose cumulative information gain reaches
/// `target` (gains combine as `c += g × (1 - c)`).
pub fn minimal_set(ranking: &[ForkDecisiveness], target: f64) -> Vec<ForkId> {
    let mut cumulative = 0.0;
    let mut out = Vec::new();
    for entry in ranking {
        out.push(entry.fork_id.clone());
        cumulative += entry.information_gain * (1.0 - cumulative);
        if cumulative >= target {
            break;
        }
    }
    out
}

/// Shape summary of a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeShape {
    pub total_forks: usize,
    pub max_depth: usize,
    /// Mean child count over forks that have children.
    pub avg_branching: f64,
    /// `1 / avg_branching`; 1 means a chain.
    pub linearity: f64,
    /// Fork count per tier, in depth order, empty tiers included.
    pub tier_counts: Vec<(Tier, usize)>,
}

impl TreeShape {
    pub fn of(tree: &ForkTree) -> Self {
        let branching: Vec<usize> = tree
            .forks()
            .map(|fork| tree.children_of(&fork.id).len())
            .filter(|&n| n > 0)
            .collect();
        let avg_branching = if branching.is_empty() {
            1.0
        } else {
            branching.iter().sum::<usize>() as f64 / branching.len() as f64
        };
        Self {
            total_forks: tree.len(),
            max_depth: tree.max_depth(),
            avg_branching,
            linearity: 1.0 / avg_branching,
            tier_counts: Tier::ALL
                .iter()
                .map(|&tier| (tier, tree.forks_at_tier(tier).len()))
                .collect(),
        }
    }

    /// The tree branches rather than forming a near-chain.
    #[inline]
    pub fn is_divergent(&self) -> bool {
        self.linearity < 0.8
    }
}

/// A recurring combination of answers on decisive forks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub description: String,
    /// Defining answers.
    pub fork_choices: BTreeMap<ForkId, Pole>,
    /// Psychological correlates.
    pub traits: Vec<String>,
    /// Rough share of the population, in `[0, 1]`.
    pub population_share: f64,
}

impl Archetype {
    /// Share of the defining forks the walker leans on that agree with the
    /// archetype. `None` when the walker leans on none of them.
    pub fn fit(&self, walker: &Walker) -> Option<f64> {
        let (mut agree, mut total) = (0usize, 0usize);
        for (fork, expected) in &self.fork_choices {
            if let Some((pole, _)) = walker.vector().lean(fork) {
                total += 1;
                if pole == *expected {
                    agree += 1;
                }
            }
        }
        (total > 0).then(|| agree as f64 / total as f64)
    }
}

struct ArchetypeRow {
    name: &'static str,
    description: &'static str,
    choices: &'static [(&'static str, Pole)],
    traits: &'static [&'static str],
    population_share: f64,
}

#[rustfmt::skip]
fn archetype_rows() -> Vec<ArchetypeRow> {
    use Pole::{A, B};
    vec![
        ArchetypeRow {
            name: "traditionalist",
            description: "Order through hierarchy and accumulated wisdom",
            choices: &[("human_nature", B), ("knowledge", B), ("equality_vs_hierarchy", B),
                       ("tradition_vs_progress", B), ("freedom_vs_equality", B)],
            traits: &["conscientiousness", "low_openness", "orderliness"],
            population_share: 0.20,
        },
        ArchetypeRow {
            name: "progressive",
            description: "Progress through liberation and rational reform",
            choices: &[("human_nature", A), ("knowledge", A), ("equality_vs_hierarchy", A),
                       ("tradition_vs_progress", A), ("freedom_vs_equality", A)],
            traits: &["openness", "agreeableness", "compassion"],
            population_share: 0.22,
        },
        ArchetypeRow {
            name: "libertarian",
            description: "Freedom as the paramount value",
            choices: &[("human_nature", A), ("individualism", B), ("freedom_vs_equality", B),
                       ("markets", B), ("state", B)],
            traits: &["low_agreeableness", "autonomy", "individualism"],
            population_share: 0.12,
        },
        ArchetypeRow {
            name: "communitarian",
            description: "Society as an organic whole; duty over rights",
            choices: &[("individualism", A), ("equality_vs_hierarchy", A), ("nationalism", B),
                       ("welfare", A)],
            traits: &["agreeableness", "collectivism", "loyalty"],
            population_share: 0.15,
        },
        ArchetypeRow {
            name: "technocrat",
            description: "Rational optimisation by experts",
            choices: &[("knowledge", A), ("change", A), ("state", A), ("tech_regulation", B)],
            traits: &["intellect", "systemizing", "low_tradition"],
            population_share: 0.10,
        },
        ArchetypeRow {
            name: "populist",
            description: "The people against the elites",
            choices: &[("equality_vs_hierarchy", A), ("nationalism", B), ("trade", A),
                       ("immigration", B)],
            traits: &["distrust", "anti_elite", "in_group_loyalty"],
            population_share: 0.18,
        },
    ]
}

/// The six reference archetypes over the canonical tree.
pub fn canonical_archetypes() -> Vec<Archetype> {
    archetype_rows()
        .into_iter()
        .map(|row| Archetype {
            name: row.name.to_string(),
            description: row.description.to_string(),
            fork_choices: row
                .choices
                .iter()
                .map(|&(fork, pole)| (ForkId::from(fork), pole))
                .collect(),
            traits: row.traits.iter().map(|t| t.to_string()).collect(),
            population_share: row.population_share,
        })
        .collect()
}

/// Up to `n` canonical archetypes whose defining forks exist in the tree,
/// ordered by how many of them fall in the five most decisive forks of
/// the ranking's 0.7 minimal set. Ties keep reference order.
pub fn extract_archetypes(tree: &ForkTree, ranking: &[ForkDecisiveness], n: usize) -> Vec<Archetype> {
    let decisive: Vec<ForkId> = minimal_set(ranking, 0.7).into_iter().take(5).collect();
    let mut archetypes: Vec<(Archetype, usize)> = canonical_archetypes()
        .into_iter()
        .filter(|archetype| archetype.fork_choices.keys().all(|fork| tree.contains(fork)))
        .map(|archetype| {
            let overlap = archetype
                .fork_choices
                .keys()
                .filter(|fork| decisive.contains(*fork))
                .count();
            (archetype, overlap)
        })
        .collect();
    archetypes.sort_by(|a, b| b.1.cmp(&a.1));
    archetypes.into_iter().take(n).map(|(archetype, _)| archetype).collect()
}

/// The best-fitting archetype and its fit; ties go to the earlier one.
pub fn nearest_archetype<'a>(walker: &Walker, archetypes: &'a [Archetype]) -> Option<(&'a Archetype, f64)> {
    archetypes
        .iter()
        .filter_map(|archetype| archetype.fit(walker).map(|fit| (archetype, fit)))
        .fold(None, |best, (archetype, fit)| match best {
            Some((_, b)) if b >= fit => best,
            _ => Some((archetype, fit)),
        })
}
