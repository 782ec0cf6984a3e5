//! Question interpretation: entity recognition, intent classification and
//! traversal-plan construction.

mod engine;
mod intent;
mod interpreter;
mod recognizer;

pub use engine::{QueryEngine, QueryOutcome};
pub use intent::{Intent, IntentClassifier, INTENT_CATALOG};
pub use interpreter::QueryInterpreter;
pub use recognizer::{EntityRecognizer, PhraseMatcher, SpanRecognizer};

use serde::{Deserialize, Serialize};

use crate::graph::{EntityKind, RelationKind};

/// Structured traversal request built from a question.
///
/// `target_type` is advisory; the executor never filters on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalPlan {
    pub start_entity: String,
    pub start_type: EntityKind,
    pub relation_chain: Vec<RelationKind>,
    pub target_type: EntityKind,
    pub intent: Intent,
}

impl TraversalPlan {
    /// Build the plan for `intent` starting at `start_entity`.
    pub fn new(start_entity: String, start_type: EntityKind, intent: Intent) -> Self {
        Self {
            start_entity,
            start_type,
            relation_chain: intent.relation_chain().to_vec(),
            target_type: intent.target_type(),
            intent,
        }
    }

    /// Human-readable "start → target" summary, e.g. `Character → Power`.
    pub fn query_type(&self) -> String {
        format!("{} → {}", self.start_type, self.target_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_intent() {
        let plan = TraversalPlan::new(
            "Wolverine".to_string(),
            EntityKind::Character,
            Intent::MutationPower,
        );
        assert_eq!(
            plan.relation_chain,
            vec![RelationKind::HasMutation, RelationKind::Confers]
        );
        assert_eq!(plan.target_type, EntityKind::Power);
        assert_eq!(plan.query_type(), "Character → Power");
    }

    #[test]
    fn test_plan_serializes_with_labels() {
        let plan = TraversalPlan::new("X-Men".to_string(), EntityKind::Team, Intent::TeamCharacter);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["start_entity"], "X-Men");
        assert_eq!(json["start_type"], "Team");
        assert_eq!(json["relation_chain"][0], "MEMBER_OF");
        assert_eq!(json["target_type"], "Character");
        assert_eq!(json["intent"], "team_character");
    }
}
