//! Knowledge graph module: typed multigraph, GraphML loading and plan traversal.
//!
//! Entities are keyed by their display name; relations are directed and labeled
//! with one of a closed set of relation kinds.

mod graphml;
mod store;
mod traversal;

pub use graphml::{load_graphml, parse_graphml};
pub use store::{Direction, GraphStats, GraphStore, Neighbor};
pub use traversal::GraphExecutor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of an entity (node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Power,
    Gene,
    Team,
    /// Node carries no recognizable kind.
    Unknown,
}

impl EntityKind {
    /// Parse a kind label case-insensitively. Unrecognized labels yield `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "character" => EntityKind::Character,
            "power" => EntityKind::Power,
            "gene" => EntityKind::Gene,
            "team" => EntityKind::Team,
            _ => EntityKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Character => "Character",
            EntityKind::Power => "Power",
            EntityKind::Gene => "Gene",
            EntityKind::Team => "Team",
            EntityKind::Unknown => "Unknown",
        }
    }

    /// Powers and teams are natural targets of their relations, so plans
    /// starting from them walk edges backwards.
    pub fn traverses_incoming(&self) -> bool {
        matches!(self, EntityKind::Power | EntityKind::Team)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation label vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    PossessesPower,
    HasMutation,
    Confers,
    MemberOf,
    /// Sentinel for edges without a usable label. No plan ever follows it.
    RelatedTo,
}

impl RelationKind {
    /// Map a raw label onto the vocabulary.
    ///
    /// Labels are trimmed, upper-cased, and spaces/hyphens become underscores,
    /// so `"member of"` and `"Member-Of"` both resolve to `MemberOf`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "POSSESSES_POWER" => Some(RelationKind::PossessesPower),
            "HAS_MUTATION" => Some(RelationKind::HasMutation),
            "CONFERS" => Some(RelationKind::Confers),
            "MEMBER_OF" => Some(RelationKind::MemberOf),
            "RELATED_TO" => Some(RelationKind::RelatedTo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::PossessesPower => "POSSESSES_POWER",
            RelationKind::HasMutation => "HAS_MUTATION",
            RelationKind::Confers => "CONFERS",
            RelationKind::MemberOf => "MEMBER_OF",
            RelationKind::RelatedTo => "RELATED_TO",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed node. Extra attributes are kept but never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A single directed edge (source --kind--> target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub kind: RelationKind,
    pub target: String,
}

const DASH_VARIANTS: &[char] = &[
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}', '\u{FE63}',
    '\u{FF0D}',
];

/// Lowercase a name and fold every typographic dash onto the ASCII hyphen.
pub fn normalize_name(text: &str) -> String {
    text.chars()
        .map(|c| if DASH_VARIANTS.contains(&c) { '-' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}
