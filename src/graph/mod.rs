//! The position graph: positions as nodes, typed signed edges between them.
//!
//! A [`PositionGraph`] is assembled once by a [`GraphBuilder`] from one or
//! more fork trees plus declared cross-links, then frozen. Everything after
//! `build()` is a read-only query, so a single graph can be shared (by
//! reference or `Arc`) across any number of walkers on any number of threads.
//!
//! # Layout
//! - Positions live in a dense `Vec` with an id→index map.
//! - Edges live in one `Vec`: tree edges first, cross-links after
//!   `tree_edge_count`. Both halves are reachable through per-position
//!   incidence lists of edge indices.
//! - The dominant sign of every connected pair is precomputed for the
//!   balance engine (`pair_sign`).
//!
//! # Citations
//! - Cartwright & Harary, "Structural balance: a generalization of Heider's theory" (1956)
//! - Wasserman & Faust, "Social Network Analysis" (1994), Ch. 6 – signed graphs, triads

pub mod edge;
pub mod triad;

use crate::config::{CrossLinkSpec, EngineConfig};
use crate::core::{ForkId, Position, PositionId, Tier};
use crate::error::{IdeographError, Result};
use crate::fingerprint::{push_f64, push_str, Canonicalizable, HashValue, DOMAIN_POSITION_GRAPH_V1};
use crate::forks::{Fork, ForkTree};
use crate::walker::Walker;
use edge::{Edge, EdgeKind, EdgeOrigin, Sign};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};
pub use triad::Triad;

/// One edge seen from one of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'g> {
    /// The endpoint opposite the queried position.
    pub position: &'g PositionId,
    /// The connecting edge.
    pub edge: &'g Edge,
    /// `true` when the queried position is the edge's source.
    pub outgoing: bool,
}

/// Incremental constructor for a [`PositionGraph`].
///
/// Fork trees emit their positions and edges through [`GraphBuilder::add_position`]
/// and [`GraphBuilder::add_edge`]; cross-links are added last, once every
/// position exists.
#[derive(Debug)]
pub struct GraphBuilder {
    config: EngineConfig,
    trees: Vec<ForkTree>,
    cross_links: Vec<CrossLinkSpec>,
    positions: Vec<Position>,
    index: HashMap<PositionId, usize>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(PositionId, PositionId, EdgeKind)>,
}

impl GraphBuilder {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            cross_links: Vec::new(),
            positions: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
        }
    }

    /// Engine parameters the graph is being built with.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Queues a fork tree.
    pub fn with_tree(mut self, tree: ForkTree) -> Self {
        self.trees.push(tree);
        self
    }

    /// Queues declared cross-links.
    pub fn with_cross_links(mut self, links: impl IntoIterator<Item = CrossLinkSpec>) -> Self {
        self.cross_links.extend(links);
        self
    }

    /// Adds a position. Duplicate ids are rejected.
    pub fn add_position(&mut self, position: Position) -> Result<()> {
        if self.index.contains_key(&position.id) {
            return Err(IdeographError::config(format!(
                "duplicate position id {}",
                position.id
            )));
        }
        self.index.insert(position.id.clone(), self.positions.len());
        self.positions.push(position);
        Ok(())
    }

    /// Adds an edge between two known positions.
    ///
    /// Rejects unknown endpoints and duplicate `(source, target, kind)` triples.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.index.contains_key(endpoint) {
                return Err(IdeographError::config(format!(
                    "edge {edge} references unknown position {endpoint}"
                )));
            }
        }
        let key = (edge.source.clone(), edge.target.clone(), edge.kind);
        if !self.edge_keys.insert(key) {
            return Err(IdeographError::config(format!("duplicate edge {edge}")));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Validates and freezes the graph.
    pub fn build(self) -> Result<PositionGraph> {
        self.assemble().map_err(|err| {
            warn!(error = %err, "rejected graph configuration");
            err
        })
    }

    fn assemble(mut self) -> Result<PositionGraph> {
        self.config.validate()?;
        if self.trees.is_empty() {
            return Err(IdeographError::config("position graph needs at least one fork tree"));
        }

        let mut fork_index: HashMap<ForkId, usize> = HashMap::new();
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            for fork in tree.forks() {
                if fork_index.insert(fork.id.clone(), tree_idx).is_some() {
                    return Err(IdeographError::config(format!(
                        "fork id {} appears in more than one tree",
                        fork.id
                    )));
                }
            }
        }

        let trees = std::mem::take(&mut self.trees);
        for tree in &trees {
            tree.to_graph_positions(&mut self)?;
        }
        let tree_edge_count = self.edges.len();

        for link in std::mem::take(&mut self.cross_links) {
            let edge = Edge::new(
                link.source,
                link.target,
                link.kind,
                link.sign,
                link.weight,
                EdgeOrigin::CrossLink,
            )?;
            self.add_edge(edge)?;
        }

        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); self.positions.len()];
        for (edge_idx, edge) in self.edges.iter().enumerate() {
            incident[self.index[&edge.source]].push(edge_idx);
            incident[self.index[&edge.target]].push(edge_idx);
        }

        let pair_signs = dominant_pair_signs(&self.edges);

        let mut graph = PositionGraph {
            config: self.config,
            trees,
            fork_index,
            positions: self.positions,
            index: self.index,
            edges: self.edges,
            tree_edge_count,
            incident,
            pair_signs,
            fingerprint: HashValue::zero(),
        };
        graph.fingerprint = graph.fingerprint_in(DOMAIN_POSITION_GRAPH_V1);

        info!(
            forks = graph.fork_count(),
            positions = graph.position_count(),
            tree_edges = graph.tree_edge_count,
            cross_links = graph.edges.len() - graph.tree_edge_count,
            fingerprint = %graph.fingerprint,
            "position graph built"
        );
        Ok(graph)
    }
}

/// Ordered pair key so `(a, b)` and `(b, a)` collide.
fn pair_key(a: &PositionId, b: &PositionId) -> (PositionId, PositionId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// For every connected pair, the sign of its heaviest edge.
///
/// Equal weights fall back to `EdgeKind` order.
fn dominant_pair_signs(edges: &[Edge]) -> HashMap<(PositionId, PositionId), Sign> {
    let mut best: HashMap<(PositionId, PositionId), &Edge> = HashMap::new();
    for edge in edges {
        let key = pair_key(&edge.source, &edge.target);
        match best.get(&key) {
            Some(current)
                if current.weight > edge.weight
                    || (current.weight == edge.weight && current.kind <= edge.kind) => {}
            _ => {
                best.insert(key, edge);
            }
        }
    }
    best.into_iter().map(|(key, edge)| (key, edge.sign)).collect()
}

/// The frozen position graph.
///
/// # Invariants
/// - Every edge endpoint is a known position.
/// - No self-edges; no duplicate `(source, target, kind)` triples.
/// - Fork ids are unique across all loaded trees.
#[derive(Debug, Clone)]
pub struct PositionGraph {
    config: EngineConfig,
    trees: Vec<ForkTree>,
    fork_index: HashMap<ForkId, usize>,
    positions: Vec<Position>,
    index: HashMap<PositionId, usize>,
    edges: Vec<Edge>,
    tree_edge_count: usize,
    incident: Vec<Vec<usize>>,
    pair_signs: HashMap<(PositionId, PositionId), Sign>,
    fingerprint: HashValue,
}

impl PositionGraph {
    /// Starts building a graph with the given engine parameters.
    pub fn builder(config: EngineConfig) -> GraphBuilder {
        GraphBuilder::new(config)
    }

    /// Builds the graph of a single tree with no cross-links.
    pub fn from_tree(tree: ForkTree, config: EngineConfig) -> Result<Self> {
        Self::builder(config).with_tree(tree).build()
    }

    /// Creates an empty walker for this graph.
    pub fn create_walker(&self, id: impl Into<String>) -> Walker {
        Walker::new(id)
    }

    /// Engine parameters.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Content fingerprint of positions and edges.
    #[inline]
    pub fn fingerprint(&self) -> HashValue {
        self.fingerprint
    }

    #[inline]
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn fork_count(&self) -> usize {
        self.fork_index.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a position.
    pub fn position(&self, id: &PositionId) -> Option<&Position> {
        self.index.get(id).map(|&idx| &self.positions[idx])
    }

    /// Whether the graph contains a position.
    #[inline]
    pub fn contains_position(&self, id: &PositionId) -> bool {
        self.index.contains_key(id)
    }

    /// All positions in build order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// All edges: tree edges first, then cross-links.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges emitted by fork trees.
    pub fn tree_edges(&self) -> &[Edge] {
        &self.edges[..self.tree_edge_count]
    }

    /// Declared cross-links.
    pub fn cross_links(&self) -> &[Edge] {
        &self.edges[self.tree_edge_count..]
    }

    fn incident_edges(&self, id: &PositionId) -> impl Iterator<Item = &Edge> {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&idx| self.incident[idx].iter().map(move |&e| &self.edges[e]))
    }

    /// Edges leaving a position.
    pub fn edges_from<'g>(&'g self, id: &'g PositionId) -> impl Iterator<Item = &'g Edge> + 'g {
        self.incident_edges(id).filter(move |edge| &edge.source == id)
    }

    /// Edges arriving at a position.
    pub fn edges_to<'g>(&'g self, id: &'g PositionId) -> impl Iterator<Item = &'g Edge> + 'g {
        self.incident_edges(id).filter(move |edge| &edge.target == id)
    }

    /// Neighbours of a position over edges of the given kinds, both
    /// directions, in edge insertion order.
    ///
    /// An unknown position has no neighbours.
    pub fn neighbors(&self, id: &PositionId, kinds: &[EdgeKind]) -> Vec<Neighbor<'_>> {
        self.incident_edges(id)
            .filter(|edge| kinds.contains(&edge.kind))
            .map(|edge| {
                let outgoing = &edge.source == id;
                Neighbor {
                    position: if outgoing { &edge.target } else { &edge.source },
                    edge,
                    outgoing,
                }
            })
            .collect()
    }

    /// Dominant sign between two positions, if any edge joins them.
    ///
    /// With several edges on one pair the heaviest wins; equal weights fall
    /// back to edge-kind order.
    pub fn pair_sign(&self, a: &PositionId, b: &PositionId) -> Option<Sign> {
        self.pair_signs.get(&pair_key(a, b)).copied()
    }

    /// Positions joined to `id` by at least one edge of any kind.
    pub fn linked(&self, id: &PositionId) -> Vec<&PositionId> {
        let mut out: Vec<&PositionId> = self
            .incident_edges(id)
            .filter_map(|edge| edge.other_end(id))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Structural triads containing a position: closed 3-cycles and open
    /// wedges (two of three pairs linked).
    ///
    /// Sorted by member ids.
    pub fn triads_containing(&self, id: &PositionId) -> Vec<Triad> {
        triad::containing(self, id)
    }

    /// Fork owning a position.
    pub fn fork_of(&self, position: &PositionId) -> Option<&Fork> {
        self.position(position).and_then(|p| self.fork(&p.fork_id))
    }

    /// Looks up a fork across all trees.
    pub fn fork(&self, id: &ForkId) -> Option<&Fork> {
        self.tree_of(id).and_then(|tree| tree.get(id))
    }

    /// Tree containing a fork.
    pub fn tree_of(&self, fork: &ForkId) -> Option<&ForkTree> {
        self.fork_index.get(fork).map(|&idx| &self.trees[idx])
    }

    /// All loaded trees in load order.
    pub fn trees(&self) -> &[ForkTree] {
        &self.trees
    }

    /// Every fork of every tree, trees in load order.
    pub fn forks(&self) -> impl Iterator<Item = &Fork> {
        self.trees.iter().flat_map(ForkTree::forks)
    }

    /// Tier of every fork.
    pub fn fork_tiers(&self) -> BTreeMap<&ForkId, Tier> {
        self.forks().map(|fork| (&fork.id, fork.tier)).collect()
    }

    /// Ancestor gating across trees: the shallowest unanswered ancestor of
    /// `fork`, or `None` if it is reachable.
    pub fn missing_ancestor(
        &self,
        fork: &ForkId,
        answered: &HashSet<ForkId>,
    ) -> Result<Option<ForkId>> {
        let tree = self
            .tree_of(fork)
            .ok_or_else(|| IdeographError::UnknownFork(fork.clone()))?;
        Ok(tree.first_unanswered_ancestor(fork, answered))
    }

    /// Reachable, unanswered forks across every tree.
    pub fn reachable_forks(&self, answered: &HashSet<ForkId>) -> Vec<&Fork> {
        self.trees
            .iter()
            .flat_map(|tree| tree.reachable_forks(answered))
            .collect()
    }
}

impl Canonicalizable for PositionGraph {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.positions.len() * 64 + self.edges.len() * 48);

        let mut positions: Vec<&Position> = self.positions.iter().collect();
        positions.sort_by(|a, b| a.id.cmp(&b.id));
        out.extend_from_slice(&(positions.len() as u64).to_le_bytes());
        for position in positions {
            push_str(&mut out, position.id.as_str());
            push_str(&mut out, position.fork_id.as_str());
            out.push(position.tier.rank());
            push_str(&mut out, &position.axis.to_string());
            push_str(&mut out, &position.label);
        }

        let mut edges: Vec<&Edge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            (&a.source, &a.target, a.kind).cmp(&(&b.source, &b.target, b.kind))
        });
        out.extend_from_slice(&(edges.len() as u64).to_le_bytes());
        for edge in edges {
            push_str(&mut out, edge.source.as_str());
            push_str(&mut out, edge.target.as_str());
            push_str(&mut out, &edge.kind.to_string());
            out.push(i8::from(edge.sign) as u8);
            push_f64(&mut out, edge.weight);
            out.push(matches!(edge.origin, EdgeOrigin::Tree) as u8);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Tier;
    use crate::forks::tests::{chain, spec};

    fn pid(raw: &str) -> PositionId {
        PositionId::from(raw)
    }

    fn chain_graph() -> PositionGraph {
        PositionGraph::from_tree(chain(), EngineConfig::default()).unwrap()
    }

    fn link(source: &str, target: &str, kind: EdgeKind) -> CrossLinkSpec {
        CrossLinkSpec {
            source: pid(source),
            target: pid(target),
            kind,
            weight: 0.5,
            sign: None,
        }
    }

    #[test]
    fn tree_emits_positions_and_edges() {
        let graph = chain_graph();
        assert_eq!(graph.position_count(), 6);
        // 3 intra-fork edges + 2 parent links × 4 edges
        assert_eq!(graph.tree_edges().len(), 11);
        assert!(graph.cross_links().is_empty());

        let root_a = graph.neighbors(&pid("root_a"), &[EdgeKind::Implies]);
        assert_eq!(root_a.len(), 1);
        assert_eq!(root_a[0].position, &pid("child1_a"));
        assert!(root_a[0].outgoing);

        assert_eq!(graph.pair_sign(&pid("root_a"), &pid("child1_b")), Some(Sign::Negative));
        assert_eq!(graph.pair_sign(&pid("child1_b"), &pid("root_a")), Some(Sign::Negative));
        assert_eq!(graph.pair_sign(&pid("root_a"), &pid("child2_a")), None);
    }

    #[test]
    fn neighbors_follow_both_directions() {
        let graph = chain_graph();
        let incoming = graph.neighbors(&pid("child1_a"), &EdgeKind::ALL);
        // root_a IMPLIES, root_b CONTRADICTS, pole edge, child2_a IMPLIES, child2_b CONTRADICTS
        assert_eq!(incoming.len(), 5);
        assert!(graph.neighbors(&pid("ghost"), &EdgeKind::ALL).is_empty());
        assert_eq!(graph.edges_from(&pid("root_a")).count(), 3);
        assert_eq!(graph.edges_to(&pid("root_a")).count(), 0);
    }

    #[test]
    fn cross_links_are_validated() {
        let err = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_cross_links([link("root_a", "nowhere_a", EdgeKind::Collider)])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown position"));

        let err = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_cross_links([link("root_a", "child1_a", EdgeKind::Implies)])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate edge"));

        let graph = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_cross_links([link("root_a", "child2_b", EdgeKind::PrioritizesOver)])
            .build()
            .unwrap();
        assert_eq!(graph.cross_links().len(), 1);
        assert_eq!(graph.cross_links()[0].origin, EdgeOrigin::CrossLink);
        assert_eq!(graph.pair_sign(&pid("root_a"), &pid("child2_b")), Some(Sign::Negative));
    }

    #[test]
    fn heaviest_edge_decides_pair_sign() {
        let mut heavy = link("child1_a", "child2_a", EdgeKind::Collider);
        heavy.weight = 0.9;
        heavy.sign = Some(Sign::Negative);
        let graph = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_cross_links([heavy])
            .build()
            .unwrap();
        // Tree IMPLIES (0.6, +) loses to the 0.9 collider (-).
        assert_eq!(graph.pair_sign(&pid("child1_a"), &pid("child2_a")), Some(Sign::Negative));
    }

    #[test]
    fn colliding_trees_are_rejected() {
        let err = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_tree(chain())
            .build()
            .unwrap_err();
        assert!(matches!(err, IdeographError::Config(_)));

        let other = ForkTree::from_specs(vec![
            spec("other", None, Tier::Root),
            spec("leaf", Some("other"), Tier::Policy),
        ])
        .unwrap();
        let graph = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_tree(other)
            .build()
            .unwrap();
        assert_eq!(graph.fork_count(), 5);
        assert_eq!(graph.trees().len(), 2);
        assert_eq!(graph.tree_of(&ForkId::from("leaf")).unwrap().root().id.as_str(), "other");
        assert_eq!(graph.fork_of(&pid("leaf_b")).unwrap().id.as_str(), "leaf");
    }

    #[test]
    fn gating_spans_trees() {
        let graph = chain_graph();
        let answered = HashSet::new();
        assert_eq!(
            graph.missing_ancestor(&ForkId::from("child1"), &answered).unwrap(),
            Some(ForkId::from("root"))
        );
        assert!(matches!(
            graph.missing_ancestor(&ForkId::from("ghost"), &answered),
            Err(IdeographError::UnknownFork(_))
        ));
        assert_eq!(graph.reachable_forks(&answered).len(), 1);
        assert_eq!(graph.fork_tiers()[&ForkId::from("child2")], Tier::Axiom);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = chain_graph();
        let b = chain_graph();
        assert_eq!(a.fingerprint(), b.fingerprint());
        let linked = PositionGraph::builder(EngineConfig::default())
            .with_tree(chain())
            .with_cross_links([link("root_a", "child2_a", EdgeKind::Mediator)])
            .build()
            .unwrap();
        assert_ne!(a.fingerprint(), linked.fingerprint());
    }

    #[test]
    fn graph_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PositionGraph>();
    }
}
