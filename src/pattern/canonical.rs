//! Reference patterns over the canonical fork tree.
//!
//! Each pattern leans on a handful of forks; a lean of strength `s` toward
//! pole A writes `+s` on the A position and `-s` on the B position.

use crate::config::PatternSpec;
use crate::core::{Axis, ForkId, Pole, PositionId, Tier};
use std::collections::BTreeMap;

struct Profile {
    id: &'static str,
    description: &'static str,
    leans: &'static [(&'static str, Pole, f64)],
    tiers: &'static [(Axis, Tier)],
}

impl Profile {
    fn into_spec(self) -> PatternSpec {
        let mut expected = BTreeMap::new();
        for &(fork, pole, strength) in self.leans {
            let fork = ForkId::from(fork);
            expected.insert(PositionId::for_pole(&fork, pole), strength);
            expected.insert(PositionId::for_pole(&fork, pole.opposite()), -strength);
        }
        PatternSpec {
            id: self.id.to_string(),
            description: self.description.to_string(),
            expected,
            tier_expectations: self.tiers.iter().copied().collect(),
        }
    }
}

#[rustfmt::skip]
fn profiles() -> Vec<Profile> {
    use Axis::*;
    use Pole::{A, B};
    use Tier::*;
    vec![
        Profile {
            id: "progressive_left",
            description: "Equality first; expansive state, open borders, social progress",
            leans: &[("human_nature", A, 0.8), ("equality_vs_hierarchy", A, 1.0),
                     ("freedom_vs_equality", A, 0.9), ("state", A, 0.9), ("welfare", A, 0.9),
                     ("immigration", A, 0.8), ("tradition_vs_progress", A, 0.9),
                     ("abortion", A, 0.9), ("climate", A, 0.8), ("guns", A, 0.7)],
            tiers: &[(Governance, Meta), (Economics, Domain), (Social, Axiom)],
        },
        Profile {
            id: "libertarian",
            description: "Individual liberty over everything; free markets, minimal state",
            leans: &[("individualism", B, 1.0), ("freedom_vs_equality", B, 1.0),
                     ("security_vs_liberty", B, 0.9), ("markets", B, 1.0), ("state", B, 1.0),
                     ("trade", B, 0.8), ("speech", B, 0.9), ("guns", B, 0.8), ("crypto", B, 0.7)],
            tiers: &[(Governance, Axiom), (Economics, Domain), (CivilLiberties, Axiom)],
        },
        Profile {
            id: "national_conservative",
            description: "Fiscal conservatism to anti-establishment nationalism",
            leans: &[("meaning", B, 0.7), ("individualism", A, 0.6), ("nationalism", B, 1.0),
                     ("immigration", B, 1.0), ("trade", A, 0.8), ("china", B, 0.8),
                     ("tradition_vs_progress", B, 0.8), ("abortion", B, 0.7), ("guns", B, 0.8)],
            tiers: &[(ForeignPolicy, Domain), (Social, Axiom), (Economics, Domain)],
        },
        Profile {
            id: "rationalist_technocrat",
            description: "Evidence-based reasoning to AI risk and longtermism",
            leans: &[("meaning", A, 0.6), ("knowledge", A, 1.0), ("change", B, 0.6),
                     ("tech_regulation", A, 0.6), ("ai_risk", A, 1.0), ("climate", B, 0.5),
                     ("trade", B, 0.7)],
            tiers: &[(Epistemology, Meta), (Technology, Domain)],
        },
        Profile {
            id: "post_left",
            description: "Class analysis without identity politics; heterodox alliances",
            leans: &[("equality_vs_hierarchy", A, 0.8), ("freedom_vs_equality", A, 0.7),
                     ("welfare", A, 0.8), ("trade", A, 0.6), ("foreign_intervention", A, 0.9),
                     ("speech", B, 0.8), ("tradition_vs_progress", B, 0.3)],
            tiers: &[(Economics, Domain), (CivilLiberties, Policy), (ForeignPolicy, Domain)],
        },
        Profile {
            id: "crypto_progressive",
            description: "Progressive economics to tech optimism and crypto adoption",
            leans: &[("equality_vs_hierarchy", A, 0.7), ("welfare", A, 0.7),
                     ("tech_regulation", B, 0.7), ("crypto", B, 1.0), ("state", A, 0.3),
                     ("speech", B, 0.5)],
            tiers: &[(Economics, Domain), (Technology, Policy)],
        },
        Profile {
            id: "trad_integralist",
            description: "Social conservatism to anti-liberal religious tradition",
            leans: &[("meaning", B, 1.0), ("knowledge", B, 1.0), ("human_nature", B, 0.9),
                     ("individualism", A, 0.9), ("tradition_vs_progress", B, 1.0),
                     ("abortion", B, 1.0), ("welfare", A, 0.4), ("speech", A, 0.4)],
            tiers: &[(Metaphysics, Root), (Epistemology, Meta), (Social, Axiom)],
        },
    ]
}

/// Pattern definitions over the canonical tree, sorted by id.
pub fn canonical_patterns() -> Vec<PatternSpec> {
    let mut specs: Vec<PatternSpec> = profiles().into_iter().map(Profile::into_spec).collect();
    specs.sort_by(|a, b| a.id.cmp(&b.id));
    specs
}
