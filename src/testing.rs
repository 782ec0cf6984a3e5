//! Fixtures shared by unit tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::embeddings::Embedder;
use crate::error::Result;
use crate::graph::{EntityKind, GraphStore, RelationKind};

/// Keyword groups, one embedding axis each.
const AXES: [&[&str]; 7] = [
    &["team", "teams", "belong", "belongs", "member"],
    &["gene", "genes", "mutation", "mutations", "mutant"],
    &["confer", "confers", "grant", "grants"],
    &["power", "powers", "ability", "abilities"],
    &["possess", "possesses", "directly", "have", "has"],
    &["character", "characters"],
    &["via", "through"],
];

/// Deterministic embedder counting keyword hits per axis.
pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; AXES.len()];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            for (axis, words) in AXES.iter().enumerate() {
                if words.contains(&token) {
                    vector[axis] += 1.0;
                }
            }
        }
        Ok(vector)
    }
}

/// Small slice of the hero dataset. Names use the non-breaking hyphen U+2011.
pub fn hero_graph() -> Arc<GraphStore> {
    let mut g = GraphStore::new();
    for name in ["Wolverine", "Cyclops", "Spider\u{2011}Man", "Storm"] {
        g.add_entity(name, EntityKind::Character);
    }
    for name in ["X\u{2011}Men", "Avengers"] {
        g.add_entity(name, EntityKind::Team);
    }
    for name in ["Regenerative Mutation", "Optic\u{2011}Blast", "Radioactive Spider Mutation"] {
        g.add_entity(name, EntityKind::Gene);
    }
    for name in [
        "Accelerated Healing",
        "Enhanced Senses",
        "Optic Blasts",
        "Superhuman Agility",
        "Weather Control",
    ] {
        g.add_entity(name, EntityKind::Power);
    }

    let edges = [
        ("Wolverine", RelationKind::MemberOf, "X\u{2011}Men"),
        ("Cyclops", RelationKind::MemberOf, "X\u{2011}Men"),
        ("Storm", RelationKind::MemberOf, "X\u{2011}Men"),
        ("Spider\u{2011}Man", RelationKind::MemberOf, "Avengers"),
        ("Wolverine", RelationKind::HasMutation, "Regenerative Mutation"),
        ("Cyclops", RelationKind::HasMutation, "Optic\u{2011}Blast"),
        ("Spider\u{2011}Man", RelationKind::HasMutation, "Radioactive Spider Mutation"),
        ("Regenerative Mutation", RelationKind::Confers, "Accelerated Healing"),
        ("Regenerative Mutation", RelationKind::Confers, "Enhanced Senses"),
        ("Optic\u{2011}Blast", RelationKind::Confers, "Optic Blasts"),
        ("Radioactive Spider Mutation", RelationKind::Confers, "Superhuman Agility"),
        ("Wolverine", RelationKind::PossessesPower, "Accelerated Healing"),
        ("Cyclops", RelationKind::PossessesPower, "Optic Blasts"),
        ("Spider\u{2011}Man", RelationKind::PossessesPower, "Superhuman Agility"),
        ("Storm", RelationKind::PossessesPower, "Weather Control"),
    ];
    for (source, kind, target) in edges {
        g.add_relation(source, kind, target);
    }
    Arc::new(g)
}
