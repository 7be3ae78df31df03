//! The fork tree: hierarchical backbone of binary dilemmas.
//!
//! Forks form a strict tree with a single root. The tree is the only source
//! of positions and of the ancestor-gating rule: a fork becomes reachable
//! once every fork on its path to the root has an explicit answer. Gating is
//! computed on this tree alone, never on the (possibly cyclic) position
//! graph built from it.
//!
//! # Citations
//! - Converse, "The nature of belief systems in mass publics" (1964) – centrality of abstract beliefs
//! - Cormen et al., "Introduction to Algorithms", Section 22.2 (2009) – BFS reachability

pub mod canonical;
pub mod compaction;

use crate::config::{ForkSpec, PoleSpec};
use crate::core::{Axis, ForkId, Pole, Position, PositionId, Tier};
use crate::error::{IdeographError, Result};
use crate::fingerprint::{push_f64, push_str, Canonicalizable, HashValue, DOMAIN_FORK_TREE_V1};
use crate::graph::edge::{Edge, EdgeKind, EdgeOrigin};
use crate::graph::GraphBuilder;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// A binary ideological dilemma.
#[derive(Debug, Clone, PartialEq)]
pub struct Fork {
    pub id: ForkId,
    pub question: String,
    pub parent: Option<ForkId>,
    pub tier: Tier,
    pub axis: Axis,
    pub pole_a: PoleSpec,
    pub pole_b: PoleSpec,
    pub polarization: f64,
    pub importance: f64,
    /// Distance from the root (root = 0).
    pub depth: usize,
}

impl Fork {
    /// Position id of one pole.
    #[inline]
    pub fn position_id(&self, pole: Pole) -> PositionId {
        PositionId::for_pole(&self.id, pole)
    }

    /// Label and claim of one pole.
    #[inline]
    pub fn pole(&self, pole: Pole) -> &PoleSpec {
        match pole {
            Pole::A => &self.pole_a,
            Pole::B => &self.pole_b,
        }
    }

    /// Whether this fork is the tree root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn position(&self, pole: Pole) -> Position {
        let spec = self.pole(pole);
        Position {
            id: self.position_id(pole),
            fork_id: self.id.clone(),
            pole,
            label: spec.label.clone(),
            claim: spec.claim.clone(),
            tier: self.tier,
            axis: self.axis,
            level: self.depth,
        }
    }
}

/// A validated fork tree.
///
/// # Invariants
/// - Exactly one root; every fork reaches it through `parent` links.
/// - No cycles, no missing parents, no duplicate ids.
/// - `child.tier >= parent.tier` for every edge of the tree.
#[derive(Debug, Clone)]
pub struct ForkTree {
    forks: BTreeMap<ForkId, Fork>,
    /// Declaration order, kept for deterministic iteration.
    order: Vec<ForkId>,
    children: HashMap<ForkId, Vec<ForkId>>,
    root: ForkId,
}

impl ForkTree {
    /// The canonical 25-fork contemporary ideology backbone.
    pub fn canonical() -> Result<Self> {
        Self::from_specs(canonical::canonical_forks())
    }

    /// Builds and validates a tree from fork definitions.
    ///
    /// Fails with [`IdeographError::Config`] on an empty definition, duplicate
    /// ids, missing parents, cycles, unreachable forks, zero or several
    /// roots, out-of-range weights, or a child shallower than its parent.
    pub fn from_specs(specs: Vec<ForkSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(IdeographError::config("fork tree is empty"));
        }

        let mut order = Vec::with_capacity(specs.len());
        let mut by_id: BTreeMap<ForkId, ForkSpec> = BTreeMap::new();
        for spec in specs {
            for (name, value) in [("polarization", spec.polarization), ("importance", spec.importance)] {
                if value.is_nan() || !(0.0..=1.0).contains(&value) {
                    return Err(IdeographError::config(format!(
                        "fork {}: {name} = {value} is outside [0, 1]",
                        spec.id
                    )));
                }
            }
            if spec.pole_a.label.is_empty() || spec.pole_b.label.is_empty() {
                return Err(IdeographError::config(format!(
                    "fork {} has an empty pole label",
                    spec.id
                )));
            }
            if by_id.contains_key(&spec.id) {
                return Err(IdeographError::config(format!("duplicate fork id {}", spec.id)));
            }
            order.push(spec.id.clone());
            by_id.insert(spec.id.clone(), spec);
        }

        for spec in by_id.values() {
            if let Some(parent) = &spec.parent {
                if !by_id.contains_key(parent) {
                    return Err(IdeographError::config(format!(
                        "fork {} references missing parent {parent}",
                        spec.id
                    )));
                }
            }
        }

        // Walk every parent chain; a chain longer than the fork count cycles.
        for id in &order {
            let mut seen = HashSet::new();
            let mut cursor = Some(id);
            while let Some(current) = cursor {
                if !seen.insert(current) {
                    return Err(IdeographError::config(format!(
                        "cycle in fork tree through {current}"
                    )));
                }
                cursor = by_id[current].parent.as_ref();
            }
        }

        let roots: Vec<&ForkId> = order.iter().filter(|id| by_id[*id].parent.is_none()).collect();
        let root = match roots.as_slice() {
            [single] => (*single).clone(),
            [] => return Err(IdeographError::config("fork tree has no root")),
            many => {
                let names: Vec<&str> = many.iter().map(|id| id.as_str()).collect();
                return Err(IdeographError::config(format!(
                    "fork tree has {} roots: {}",
                    many.len(),
                    names.join(", ")
                )));
            }
        };

        let mut children: HashMap<ForkId, Vec<ForkId>> = HashMap::new();
        for id in &order {
            if let Some(parent) = &by_id[id].parent {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }

        // BFS from the root assigns depths and proves reachability.
        let mut depth: HashMap<ForkId, usize> = HashMap::new();
        let mut queue = VecDeque::from([(root.clone(), 0usize)]);
        while let Some((id, d)) = queue.pop_front() {
            if depth.insert(id.clone(), d).is_some() {
                continue;
            }
            for child in children.get(&id).into_iter().flatten() {
                let parent_tier = by_id[&id].tier;
                let child_tier = by_id[child].tier;
                if child_tier < parent_tier {
                    return Err(IdeographError::config(format!(
                        "fork {child} ({child_tier}) is shallower than its parent {id} ({parent_tier})"
                    )));
                }
                queue.push_back((child.clone(), d + 1));
            }
        }
        if let Some(orphan) = order.iter().find(|id| !depth.contains_key(*id)) {
            return Err(IdeographError::config(format!(
                "fork {orphan} is unreachable from root {root}"
            )));
        }

        let forks = by_id
            .into_iter()
            .map(|(id, spec)| {
                let fork = Fork {
                    depth: depth[&id],
                    id: spec.id,
                    question: spec.question,
                    parent: spec.parent,
                    tier: spec.tier,
                    axis: spec.axis,
                    pole_a: spec.pole_a,
                    pole_b: spec.pole_b,
                    polarization: spec.polarization,
                    importance: spec.importance,
                };
                (id, fork)
            })
            .collect();

        Ok(Self {
            forks,
            order,
            children,
            root,
        })
    }

    /// The root fork.
    pub fn root(&self) -> &Fork {
        &self.forks[&self.root]
    }

    /// Looks up a fork.
    #[inline]
    pub fn get(&self, id: &ForkId) -> Option<&Fork> {
        self.forks.get(id)
    }

    /// Whether the tree contains a fork.
    #[inline]
    pub fn contains(&self, id: &ForkId) -> bool {
        self.forks.contains_key(id)
    }

    /// Number of forks.
    #[inline]
    pub fn len(&self) -> usize {
        self.forks.len()
    }

    /// Always false for a validated tree; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    /// Forks in declaration order.
    pub fn forks(&self) -> impl Iterator<Item = &Fork> {
        self.order.iter().map(move |id| &self.forks[id])
    }

    /// Direct children of a fork, in declaration order. Empty for leaves and
    /// unknown ids.
    pub fn children_of(&self, id: &ForkId) -> &[ForkId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The fork itself followed by its ancestors up to the root.
    ///
    /// Empty for an unknown id.
    pub fn path_to_root(&self, id: &ForkId) -> Vec<&Fork> {
        let mut path = Vec::new();
        let mut cursor = self.forks.get(id);
        while let Some(fork) = cursor {
            path.push(fork);
            cursor = fork.parent.as_ref().and_then(|p| self.forks.get(p));
        }
        path
    }

    /// Depth of a fork (root = 0).
    pub fn depth_of(&self, id: &ForkId) -> Option<usize> {
        self.forks.get(id).map(|fork| fork.depth)
    }

    /// Largest depth in the tree.
    pub fn max_depth(&self) -> usize {
        self.forks.values().map(|fork| fork.depth).max().unwrap_or(0)
    }

    /// Forks at one tier, in declaration order.
    pub fn forks_at_tier(&self, tier: Tier) -> Vec<&Fork> {
        self.forks().filter(|fork| fork.tier == tier).collect()
    }

    /// Shallowest ancestor of `id` that is not in `answered`.
    ///
    /// `None` means the fork is reachable. Unknown ids yield `None` as well;
    /// callers check membership first.
    pub fn first_unanswered_ancestor(
        &self,
        id: &ForkId,
        answered: &HashSet<ForkId>,
    ) -> Option<ForkId> {
        self.path_to_root(id)
            .into_iter()
            .skip(1)
            .filter(|ancestor| !answered.contains(&ancestor.id))
            .last()
            .map(|ancestor| ancestor.id.clone())
    }

    /// Whether the ancestor-gating rule admits `id` given the answered set.
    pub fn is_reachable(&self, id: &ForkId, answered: &HashSet<ForkId>) -> bool {
        self.contains(id) && self.first_unanswered_ancestor(id, answered).is_none()
    }

    /// Reachable forks that are not yet answered, in declaration order.
    pub fn reachable_forks(&self, answered: &HashSet<ForkId>) -> Vec<&Fork> {
        self.forks()
            .filter(|fork| !answered.contains(&fork.id))
            .filter(|fork| self.first_unanswered_ancestor(&fork.id, answered).is_none())
            .collect()
    }

    /// Emits every position and every tree edge into a graph builder.
    ///
    /// Per fork: both poles plus a CONTRADICTS edge between them weighted by
    /// polarization. Per parent→child link: parent A IMPLIES child A and
    /// CONTRADICTS child B; parent B IMPLIES child B and CONTRADICTS child A,
    /// all with the builder's `tree_edge_weight`.
    ///
    /// Returns the number of positions added.
    pub fn to_graph_positions(&self, graph: &mut GraphBuilder) -> Result<usize> {
        let weight = graph.config().tree_edge_weight;
        let mut count = 0;
        for fork in self.forks() {
            graph.add_position(fork.position(Pole::A))?;
            graph.add_position(fork.position(Pole::B))?;
            count += 2;
            graph.add_edge(Edge::new(
                fork.position_id(Pole::A),
                fork.position_id(Pole::B),
                EdgeKind::Contradicts,
                None,
                fork.polarization,
                EdgeOrigin::Tree,
            )?)?;
        }
        for fork in self.forks() {
            let Some(parent_id) = &fork.parent else {
                continue;
            };
            for parent_pole in [Pole::A, Pole::B] {
                let source = PositionId::for_pole(parent_id, parent_pole);
                graph.add_edge(Edge::new(
                    source.clone(),
                    fork.position_id(parent_pole),
                    EdgeKind::Implies,
                    None,
                    weight,
                    EdgeOrigin::Tree,
                )?)?;
                graph.add_edge(Edge::new(
                    source,
                    fork.position_id(parent_pole.opposite()),
                    EdgeKind::Contradicts,
                    None,
                    weight,
                    EdgeOrigin::Tree,
                )?)?;
            }
        }
        Ok(count)
    }

    /// Content fingerprint of the tree.
    pub fn fingerprint(&self) -> HashValue {
        self.fingerprint_in(DOMAIN_FORK_TREE_V1)
    }
}

impl Canonicalizable for ForkTree {
    fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.forks.len() * 128);
        out.extend_from_slice(&(self.forks.len() as u64).to_le_bytes());
        // BTreeMap iteration is sorted by id.
        for fork in self.forks.values() {
            push_str(&mut out, fork.id.as_str());
            push_str(&mut out, fork.parent.as_ref().map(ForkId::as_str).unwrap_or(""));
            out.push(fork.tier.rank());
            push_str(&mut out, &fork.axis.to_string());
            push_str(&mut out, &fork.pole_a.label);
            push_str(&mut out, &fork.pole_b.label);
            push_f64(&mut out, fork.polarization);
            push_f64(&mut out, fork.importance);
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn spec(id: &str, parent: Option<&str>, tier: Tier) -> ForkSpec {
        ForkSpec {
            id: ForkId::from(id),
            question: format!("{id}?"),
            parent: parent.map(ForkId::from),
            tier,
            axis: Axis::Uncategorized,
            pole_a: PoleSpec::new(format!("{id} yes"), format!("{id} yes")),
            pole_b: PoleSpec::new(format!("{id} no"), format!("{id} no")),
            polarization: 0.5,
            importance: 0.5,
        }
    }

    /// root → child1 → child2
    pub(crate) fn chain() -> ForkTree {
        ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("child1", Some("root"), Tier::Meta),
            spec("child2", Some("child1"), Tier::Axiom),
        ])
        .unwrap()
    }

    #[test]
    fn canonical_tree_shape() {
        let tree = ForkTree::canonical().unwrap();
        assert_eq!(tree.len(), 25);
        assert_eq!(tree.root().id.as_str(), "meaning");
        assert!(tree.forks().filter(|f| f.is_root()).count() == 1);
        assert_eq!(tree.forks_at_tier(Tier::Root).len(), 1);
        assert_eq!(tree.forks_at_tier(Tier::Policy).len(), 4);
    }

    #[test]
    fn children_and_paths() {
        let tree = chain();
        assert_eq!(tree.children_of(&ForkId::from("root")), &[ForkId::from("child1")]);
        assert!(tree.children_of(&ForkId::from("child2")).is_empty());
        assert!(tree.children_of(&ForkId::from("nope")).is_empty());

        let path: Vec<&str> = tree
            .path_to_root(&ForkId::from("child2"))
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(path, vec!["child2", "child1", "root"]);
        assert_eq!(tree.depth_of(&ForkId::from("child2")), Some(2));
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn rejects_missing_parent() {
        let err = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("orphan", Some("ghost"), Tier::Meta),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("missing parent"));
    }

    #[test]
    fn rejects_cycles() {
        let err = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("x", Some("y"), Tier::Meta),
            spec("y", Some("x"), Tier::Meta),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn rejects_multiple_roots_and_duplicates() {
        let err = ForkTree::from_specs(vec![
            spec("r1", None, Tier::Root),
            spec("r2", None, Tier::Root),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("2 roots"));

        let err = ForkTree::from_specs(vec![
            spec("root", None, Tier::Root),
            spec("root", None, Tier::Root),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        assert!(ForkTree::from_specs(Vec::new()).is_err());
    }

    #[test]
    fn rejects_tier_inversion() {
        let err = ForkTree::from_specs(vec![
            spec("root", None, Tier::Axiom),
            spec("child", Some("root"), Tier::Meta),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("shallower"));
    }

    #[test]
    fn gating_reports_shallowest_missing_ancestor() {
        let tree = chain();
        let mut answered = HashSet::new();
        assert!(tree.is_reachable(&ForkId::from("root"), &answered));
        assert_eq!(
            tree.first_unanswered_ancestor(&ForkId::from("child2"), &answered),
            Some(ForkId::from("root"))
        );
        answered.insert(ForkId::from("root"));
        assert!(tree.is_reachable(&ForkId::from("child1"), &answered));
        assert!(!tree.is_reachable(&ForkId::from("child2"), &answered));

        let reachable: Vec<&str> = tree.reachable_forks(&answered).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(reachable, vec!["child1"]);
    }

    #[test]
    fn fingerprint_ignores_declaration_order() {
        let a = chain();
        let b = ForkTree::from_specs(vec![
            spec("child2", Some("child1"), Tier::Axiom),
            spec("root", None, Tier::Root),
            spec("child1", Some("root"), Tier::Meta),
        ])
        .unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), ForkTree::canonical().unwrap().fingerprint());
    }
}
