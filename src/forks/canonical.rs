//! The canonical contemporary-ideology backbone: 25 forks under one root.
//!
//! `meaning` is the single root. `human_nature` and `knowledge` sit directly
//! below it at META tier. Organising frameworks (markets, state,
//! nationalism) are DOMAIN tier.
//!
//! Pole A is the left, progressive or collective pole of every fork and
//! pole B the right, traditional or individual one. The tree emits
//! parent-A IMPLIES child-A, so that ordering must hold on every parent and
//! child pair: received knowledge leads to gradual change and on to
//! tradition, constrained human nature to hierarchy.

use super::ForkTree;
use crate::config::{CrossLinkSpec, ForkSpec, PoleSpec};
use crate::core::{Axis, ForkId, PositionId, Tier};
use crate::graph::edge::{EdgeKind, Sign};

struct Row {
    id: &'static str,
    parent: Option<&'static str>,
    tier: Tier,
    axis: Axis,
    question: &'static str,
    a: (&'static str, &'static str),
    b: (&'static str, &'static str),
    polarization: f64,
    importance: f64,
}

impl Row {
    fn into_spec(self) -> ForkSpec {
        ForkSpec {
            id: ForkId::from(self.id),
            question: self.question.to_string(),
            parent: self.parent.map(ForkId::from),
            tier: self.tier,
            axis: self.axis,
            pole_a: PoleSpec::new(self.a.0, self.a.1),
            pole_b: PoleSpec::new(self.b.0, self.b.1),
            polarization: self.polarization,
            importance: self.importance,
        }
    }
}

#[rustfmt::skip]
fn rows() -> Vec<Row> {
    use Axis::*;
    use Tier::*;
    vec![
        // Root
        Row { id: "meaning", parent: None, tier: Root, axis: Metaphysics,
              question: "What is the meaning of human existence?",
              a: ("constructed", "Meaning is constructed and emergent"),
              b: ("inherent", "Life has inherent meaning or purpose"),
              polarization: 0.8, importance: 1.0 },

        // Meta
        Row { id: "human_nature", parent: Some("meaning"), tier: Meta, axis: Metaphysics,
              question: "What is human nature?",
              a: ("perfectible", "Humans are good and perfectible, and need liberation"),
              b: ("constrained", "Humans are flawed and need constraint"),
              polarization: 0.9, importance: 1.0 },
        Row { id: "knowledge", parent: Some("meaning"), tier: Meta, axis: Epistemology,
              question: "How do we know what is true?",
              a: ("reasoned", "Reason, empiricism and individual inquiry"),
              b: ("received", "Tradition, revelation and accumulated wisdom"),
              polarization: 0.7, importance: 0.9 },
        Row { id: "individualism", parent: Some("meaning"), tier: Meta, axis: Governance,
              question: "What is the basic unit of society?",
              a: ("collective", "The community, with individuals embedded in it"),
              b: ("individual", "The individual, with inherent rights"),
              polarization: 0.85, importance: 0.95 },
        Row { id: "equality_vs_hierarchy", parent: Some("human_nature"), tier: Meta, axis: Governance,
              question: "What is the natural order of society?",
              a: ("equality", "Fundamental equality; hierarchy is imposed"),
              b: ("hierarchy", "Natural hierarchy; equality is artificial"),
              polarization: 0.9, importance: 0.95 },
        Row { id: "change", parent: Some("knowledge"), tier: Meta, axis: Governance,
              question: "How should society change?",
              a: ("bold", "Bold transformation that breaks what is broken"),
              b: ("gradual", "Gradual reform that preserves what works"),
              polarization: 0.75, importance: 0.85 },

        // Axiom
        Row { id: "freedom_vs_equality", parent: Some("individualism"), tier: Axiom, axis: Governance,
              question: "When freedom and equality conflict, which prevails?",
              a: ("equality", "Outcomes matter more than process"),
              b: ("freedom", "Liberty must not be sacrificed"),
              polarization: 0.9, importance: 0.9 },
        Row { id: "security_vs_liberty", parent: Some("individualism"), tier: Axiom, axis: CivilLiberties,
              question: "When security and liberty conflict, which prevails?",
              a: ("security", "Safety enables all other goods"),
              b: ("liberty", "Freedom cannot be traded for safety"),
              polarization: 0.8, importance: 0.85 },
        Row { id: "tradition_vs_progress", parent: Some("change"), tier: Axiom, axis: Social,
              question: "Is the past a guide or an obstacle?",
              a: ("progress", "History is moral improvement"),
              b: ("tradition", "Accumulated wisdom; mind Chesterton's fence"),
              polarization: 0.85, importance: 0.85 },

        // Domain (including organising frameworks)
        Row { id: "markets", parent: Some("freedom_vs_equality"), tier: Domain, axis: Economics,
              question: "What role should markets play?",
              a: ("regulated", "Markets need strong regulation and planning"),
              b: ("free", "Free markets allocate best with minimal intervention"),
              polarization: 0.85, importance: 0.8 },
        Row { id: "state", parent: Some("freedom_vs_equality"), tier: Domain, axis: Governance,
              question: "What should the state do?",
              a: ("expansive", "Provide, protect and redistribute"),
              b: ("minimal", "Defense, courts and contracts only"),
              polarization: 0.85, importance: 0.85 },
        Row { id: "nationalism", parent: Some("individualism"), tier: Domain, axis: ForeignPolicy,
              question: "What is the proper scope of political community?",
              a: ("cosmopolitan", "Universal humanity and global institutions"),
              b: ("national", "Bounded communities and sovereignty"),
              polarization: 0.8, importance: 0.75 },
        Row { id: "immigration", parent: Some("nationalism"), tier: Domain, axis: Social,
              question: "What should immigration policy prioritize?",
              a: ("open", "Human mobility and economic growth"),
              b: ("restricted", "Cultural cohesion and labor protection"),
              polarization: 0.85, importance: 0.7 },
        Row { id: "trade", parent: Some("markets"), tier: Domain, axis: Economics,
              question: "What trade policy is best?",
              a: ("protected", "Domestic industry and strategic autonomy"),
              b: ("free_trade", "Comparative advantage and globalization"),
              polarization: 0.7, importance: 0.65 },
        Row { id: "welfare", parent: Some("state"), tier: Domain, axis: Economics,
              question: "What level of welfare state?",
              a: ("universal", "Universal services and a safety net"),
              b: ("targeted", "Targeted, means-tested, personal responsibility"),
              polarization: 0.8, importance: 0.75 },
        Row { id: "foreign_intervention", parent: Some("nationalism"), tier: Domain, axis: ForeignPolicy,
              question: "When should military force be used abroad?",
              a: ("restraint", "Rarely; non-intervention and anti-imperialism"),
              b: ("intervention", "When necessary for democracy, security and allies"),
              polarization: 0.75, importance: 0.7 },
        Row { id: "israel", parent: Some("foreign_intervention"), tier: Domain, axis: ForeignPolicy,
              question: "What is the right approach to Israel-Palestine?",
              a: ("palestinian_rights", "The occupation is unjust"),
              b: ("israeli_security", "Existential defense of an ally"),
              polarization: 0.95, importance: 0.6 },
        Row { id: "china", parent: Some("nationalism"), tier: Domain, axis: ForeignPolicy,
              question: "How should the West approach China?",
              a: ("engagement", "Interdependence and diplomacy"),
              b: ("confrontation", "Decoupling and containment"),
              polarization: 0.7, importance: 0.7 },
        Row { id: "tech_regulation", parent: Some("markets"), tier: Domain, axis: Technology,
              question: "How should technology be governed?",
              a: ("strong", "Safety, antitrust and privacy rules"),
              b: ("light_touch", "Innovation and disruption are good"),
              polarization: 0.65, importance: 0.65 },
        Row { id: "ai_risk", parent: Some("tech_regulation"), tier: Domain, axis: Technology,
              question: "Is advanced AI an existential threat?",
              a: ("threat", "Pause or regulate development urgently"),
              b: ("opportunity", "Benefits outweigh risks; continue"),
              polarization: 0.75, importance: 0.6 },
        Row { id: "climate", parent: Some("change"), tier: Domain, axis: Environment,
              question: "How urgent is climate action?",
              a: ("urgent", "Transform the economy, degrowth if needed"),
              b: ("gradual", "Technology will solve it; weigh costs and benefits"),
              polarization: 0.8, importance: 0.7 },

        // Policy
        Row { id: "abortion", parent: Some("tradition_vs_progress"), tier: Policy, axis: Social,
              question: "What abortion policy is right?",
              a: ("accessible", "Legal and accessible; bodily autonomy"),
              b: ("restricted", "Restricted or banned; fetal life"),
              polarization: 0.95, importance: 0.6 },
        Row { id: "guns", parent: Some("security_vs_liberty"), tier: Policy, axis: CivilLiberties,
              question: "What gun policy is right?",
              a: ("control", "Strict control and regulation"),
              b: ("permissive", "Second Amendment rights and self-defense"),
              polarization: 0.9, importance: 0.55 },
        Row { id: "speech", parent: Some("security_vs_liberty"), tier: Policy, axis: CivilLiberties,
              question: "How should offensive speech be handled?",
              a: ("moderation", "Platform moderation, harm reduction and norms"),
              b: ("absolutism", "Free speech absolutism, no censorship"),
              polarization: 0.8, importance: 0.6 },
        Row { id: "crypto", parent: Some("markets"), tier: Policy, axis: Technology,
              question: "What is crypto's role?",
              a: ("skeptic", "Speculation that needs heavy regulation"),
              b: ("exit", "Financial freedom through decentralization"),
              polarization: 0.7, importance: 0.45 },
    ]
}

/// Fork definitions of the canonical tree, in declaration order.
pub fn canonical_forks() -> Vec<ForkSpec> {
    rows().into_iter().map(Row::into_spec).collect()
}

fn cross(source: &str, target: &str, kind: EdgeKind, weight: f64, sign: Option<Sign>) -> CrossLinkSpec {
    CrossLinkSpec {
        source: PositionId::from(source),
        target: PositionId::from(target),
        kind,
        weight,
        sign,
    }
}

/// Cross-links between canonical positions that the tree does not encode.
pub fn canonical_cross_links() -> Vec<CrossLinkSpec> {
    use EdgeKind::*;
    vec![
        // Free-speech absolutism is reached from two incompatible directions.
        cross("state_b", "speech_b", Collider, 0.5, None),
        cross("nationalism_b", "speech_b", Collider, 0.5, None),
        // Labor protection drives both restriction stances.
        cross("immigration_b", "trade_a", Confounder, 0.6, None),
        cross("china_b", "trade_a", Confounder, 0.5, None),
        cross("knowledge_b", "tradition_vs_progress_b", Mediator, 0.5, None),
        cross("equality_vs_hierarchy_a", "welfare_a", Mediator, 0.5, None),
        cross("climate_a", "tech_regulation_a", Implies, 0.4, None),
        cross("meaning_b", "abortion_a", Contradicts, 0.5, None),
        cross("security_vs_liberty_a", "speech_b", PrioritizesOver, 0.6, Some(Sign::Negative)),
        cross("freedom_vs_equality_b", "welfare_a", PrioritizesOver, 0.5, None),
    ]
}

impl ForkTree {
    /// Whether this tree is exactly the canonical backbone.
    pub fn is_canonical(&self) -> bool {
        ForkTree::canonical().map_or(false, |canonical| canonical.fingerprint() == self.fingerprint())
    }
}
