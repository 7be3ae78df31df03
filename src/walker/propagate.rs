//! Breadth-first acceptance propagation.
//!
//! The vector is always recomputed from the complete set of explicit answers:
//! each explicitly set position is a source, each source runs its own BFS
//! along propagating edges in both directions, and contributions are summed
//! then clamped. The result depends only on the graph, the explicit answers
//! and the reachability they induce.
//!
//! # Citations
//! - Cormen et al., "Introduction to Algorithms", Section 22.2 (2009) – BFS
//! - Collins & Loftus, "A spreading-activation theory of semantic processing" (1975) – attenuated activation

use super::PositionVector;
use crate::core::{clamp_unit, ForkId, Pole, PositionId};
use crate::graph::edge::{EdgeKind, Propagation};
use crate::graph::PositionGraph;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

/// Computes the position vector implied by a set of explicit answers.
///
/// - Explicit poles are `+1` (accepted) and `-1` (rejected) and are never
///   overwritten.
/// - Each hop multiplies by the edge sign, the edge weight and the
///   attenuation factor; a path stops once `|strength|` falls below the
///   propagation threshold.
/// - Positions of forks that are not reachable are neither written nor
///   traversed.
pub fn propagate(graph: &PositionGraph, explicit: &BTreeMap<ForkId, Pole>) -> PositionVector {
    let config = graph.config();
    let answered: HashSet<ForkId> = explicit.keys().cloned().collect();

    // Forks whose positions may receive propagation: answered ones plus the
    // reachable frontier.
    let mut admitted: HashSet<&ForkId> = explicit.keys().filter_map(|id| graph.fork(id)).map(|f| &f.id).collect();
    admitted.extend(graph.reachable_forks(&answered).into_iter().map(|fork| &fork.id));

    let mut fixed: BTreeMap<PositionId, f64> = BTreeMap::new();
    for (fork, pole) in explicit {
        fixed.insert(PositionId::for_pole(fork, *pole), 1.0);
        fixed.insert(PositionId::for_pole(fork, pole.opposite()), -1.0);
    }

    let admits = |id: &PositionId| {
        graph
            .position(id)
            .map(|p| admitted.contains(&p.fork_id))
            .unwrap_or(false)
    };

    let mut inferred: HashMap<PositionId, f64> = HashMap::new();
    let mut hops = 0usize;
    for (source, &seed) in &fixed {
        let mut visited: HashSet<&PositionId> = HashSet::from([source]);
        let mut queue: VecDeque<(&PositionId, f64)> = VecDeque::from([(source, seed)]);
        while let Some((current, strength)) = queue.pop_front() {
            for neighbor in graph.neighbors(current, &EdgeKind::PROPAGATING) {
                let Propagation::Carry(sign) = neighbor.edge.kind.propagation() else {
                    continue;
                };
                let next = strength * sign.value() * neighbor.edge.weight * config.attenuation;
                if next.abs() < config.propagation_threshold
                    || fixed.contains_key(neighbor.position)
                    || !admits(neighbor.position)
                    || !visited.insert(neighbor.position)
                {
                    continue;
                }
                *inferred.entry(neighbor.position.clone()).or_insert(0.0) += next;
                hops += 1;
                queue.push_back((neighbor.position, next));
            }
        }
    }

    let mut values = fixed;
    for (id, sum) in inferred {
        let value = clamp_unit(sum);
        if config.is_present(value) {
            values.insert(id, value);
        }
    }

    debug!(
        sources = explicit.len() * 2,
        hops,
        nonzero = values.len(),
        "propagation complete"
    );
    PositionVector::from_map(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::forks::tests::chain;

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    fn answers(pairs: &[(&str, Pole)]) -> BTreeMap<ForkId, Pole> {
        pairs.iter().map(|(f, p)| (ForkId::from(*f), *p)).collect()
    }

    #[test]
    fn empty_answers_give_empty_vector() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        assert!(propagate(&graph, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn both_poles_of_a_parent_push_the_child_the_same_way() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let vector = propagate(&graph, &answers(&[("root", Pole::A)]));
        // root_a via IMPLIES and root_b via CONTRADICTS: 2 × 0.6 × 0.8
        assert!((vector.get(&pid("child1_a")) - 0.96).abs() < 1e-9);
        assert!((vector.get(&pid("child1_b")) + 0.96).abs() < 1e-9);
        assert_eq!(vector.get(&pid("child2_a")), 0.0);
    }

    #[test]
    fn threshold_cuts_weak_paths() {
        let config = EngineConfig {
            propagation_threshold: 0.5,
            ..EngineConfig::default()
        };
        let graph = PositionGraph::from_tree(chain(), config).unwrap();
        let vector = propagate(&graph, &answers(&[("root", Pole::A)]));
        // 0.48 per hop is below 0.5.
        assert!(vector.get(&pid("child1_a")).abs() < 1e-12);
    }

    #[test]
    fn explicit_values_are_never_overwritten() {
        let graph = PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap();
        let vector = propagate(&graph, &answers(&[("root", Pole::A), ("child1", Pole::B)]));
        assert_eq!(vector.get(&pid("child1_b")), 1.0);
        assert_eq!(vector.get(&pid("child1_a")), -1.0);
        assert_eq!(vector.get(&pid("root_a")), 1.0);
        // child2 is now reachable and receives propagation from child1.
        assert!(vector.get(&pid("child2_b")) > 0.0);
        assert!(vector.get(&pid("child2_a")) < 0.0);
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let config = EngineConfig {
            attenuation: 1.0,
            tree_edge_weight: 1.0,
            ..EngineConfig::default()
        };
        let graph = PositionGraph::from_tree(chain(), config).unwrap();
        let vector = propagate(&graph, &answers(&[("root", Pole::A)]));
        assert!(vector.iter().all(|(_, v)| (-1.0..=1.0).contains(&v)));
        assert_eq!(vector.get(&pid("child1_a")), 1.0);
    }
}
