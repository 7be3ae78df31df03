//! Triads: three positions with at least two of their three pairs linked.
//!
//! A triad is found through its *centre*, a member linked to both others.
//! Every closed 3-cycle has three centres and every open wedge has one, so
//! enumerating neighbour pairs of each centre and deduplicating by sorted
//! member ids visits each triad exactly once.

use super::edge::Sign;
use super::PositionGraph;
use crate::core::PositionId;
use std::collections::BTreeSet;

/// Three positions and the graph sign of each of their pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triad {
    /// Members in ascending id order.
    pub members: [PositionId; 3],
    /// Dominant edge sign of pairs `(0,1)`, `(0,2)`, `(1,2)`; `None` where
    /// the pair has no edge.
    pub edge_signs: [Option<Sign>; 3],
}

/// Member index pairs, aligned with `Triad::edge_signs`.
pub const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

impl Triad {
    fn from_members(graph: &PositionGraph, members: [PositionId; 3]) -> Self {
        let edge_signs = PAIRS.map(|(i, j)| graph.pair_sign(&members[i], &members[j]));
        Self { members, edge_signs }
    }

    /// All three pairs carry an edge.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.edge_signs.iter().all(Option::is_some)
    }

    /// Number of pairs carrying an edge (2 or 3).
    #[inline]
    pub fn linked_pairs(&self) -> usize {
        self.edge_signs.iter().filter(|s| s.is_some()).count()
    }

    #[inline]
    pub fn contains(&self, id: &PositionId) -> bool {
        self.members.contains(id)
    }

    /// Product of the three pair signs, filling unlinked pairs with `close`.
    ///
    /// `None` when `close` cannot supply a sign for an open pair.
    pub fn sign_with(
        &self,
        mut close: impl FnMut(&PositionId, &PositionId) -> Option<Sign>,
    ) -> Option<Sign> {
        let mut product = Sign::Positive;
        for (slot, (i, j)) in self.edge_signs.iter().zip(PAIRS) {
            let sign = match slot {
                Some(sign) => *sign,
                None => close(&self.members[i], &self.members[j])?,
            };
            product = product.times(sign);
        }
        Some(product)
    }
}

fn sorted_triple(a: &PositionId, b: &PositionId, c: &PositionId) -> [PositionId; 3] {
    let mut members = [a.clone(), b.clone(), c.clone()];
    members.sort();
    members
}

/// Every triad whose members all satisfy `admit`, sorted by member ids.
pub fn among(graph: &PositionGraph, admit: impl Fn(&PositionId) -> bool) -> Vec<Triad> {
    let mut seen: BTreeSet<[PositionId; 3]> = BTreeSet::new();
    for centre in graph.positions().iter().map(|p| &p.id).filter(|id| admit(id)) {
        let linked: Vec<&PositionId> = graph
            .linked(centre)
            .into_iter()
            .filter(|id| admit(id))
            .collect();
        for (i, x) in linked.iter().enumerate() {
            for y in &linked[i + 1..] {
                seen.insert(sorted_triple(centre, x, y));
            }
        }
    }
    seen.into_iter()
        .map(|members| Triad::from_members(graph, members))
        .collect()
}

/// Every structural triad containing `id`, sorted by member ids.
pub fn containing(graph: &PositionGraph, id: &PositionId) -> Vec<Triad> {
    let mut seen: BTreeSet<[PositionId; 3]> = BTreeSet::new();
    let around = graph.linked(id);
    for (i, x) in around.iter().enumerate() {
        // `id` as centre.
        for y in &around[i + 1..] {
            seen.insert(sorted_triple(id, x, y));
        }
        // A neighbour as centre.
        for y in graph.linked(x) {
            if y != id {
                seen.insert(sorted_triple(id, x, y));
            }
        }
    }
    seen.into_iter()
        .map(|members| Triad::from_members(graph, members))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::forks::tests::chain;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    fn graph() -> PositionGraph {
        PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn tree_triads_are_balanced_when_closed() {
        let graph = graph();
        let triads = graph.triads_containing(&pid("root_a"));
        assert!(!triads.is_empty());
        for triad in triads.iter().filter(|t| t.is_closed()) {
            assert_eq!(triad.sign_with(|_, _| None), Some(Sign::Positive), "{triad:?}");
        }
    }

    #[test]
    fn open_wedges_need_a_closing_sign() {
        let graph = graph();
        let wedge = graph
            .triads_containing(&pid("root_a"))
            .into_iter()
            .find(|t| t.contains(&pid("child2_a")))
            .unwrap();
        assert_eq!(wedge.linked_pairs(), 2);
        assert!(!wedge.is_closed());
        assert_eq!(wedge.sign_with(|_, _| None), None);
        assert!(wedge.sign_with(|_, _| Some(Sign::Negative)).is_some());
    }

    #[test]
    fn among_respects_admission() {
        let graph = graph();
        let all = among(&graph, |_| true);
        let roots_only = among(&graph, |id| id.as_str().starts_with("root") || id.as_str().starts_with("child1"));
        assert!(roots_only.len() < all.len());
        assert!(roots_only
            .iter()
            .all(|t| t.members.iter().all(|m| !m.as_str().starts_with("child2"))));
        // Every triad around a position is also found by the global pass.
        for triad in graph.triads_containing(&pid("child1_b")) {
            assert!(all.contains(&triad));
        }
    }

    #[test]
    fn members_are_sorted_and_unique() {
        let graph = graph();
        for triad in among(&graph, |_| true) {
            assert!(triad.members[0] < triad.members[1]);
            assert!(triad.members[1] < triad.members[2]);
        }
    }
}
