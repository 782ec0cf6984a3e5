//! End-to-end question answering: interpret, then execute.

use std::sync::Arc;

use serde::Serialize;

use super::{EntityRecognizer, IntentClassifier, QueryInterpreter, TraversalPlan};
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::graph::{GraphExecutor, GraphStore};

/// Plan and results handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub plan: TraversalPlan,
    pub results: Vec<String>,
    pub query_type: String,
}

pub struct QueryEngine {
    interpreter: QueryInterpreter,
    executor: GraphExecutor,
}

impl QueryEngine {
    pub fn new(interpreter: QueryInterpreter) -> Self {
        let executor = GraphExecutor::new(Arc::clone(interpreter.graph()));
        Self {
            interpreter,
            executor,
        }
    }

    /// Wire up recognizer, classifier and executor over `graph`.
    ///
    /// `structured` enables the gazetteer pass of the recognizer.
    pub async fn build(
        graph: Arc<GraphStore>,
        embedder: Arc<dyn Embedder>,
        structured: bool,
    ) -> Result<Self> {
        let mut recognizer = EntityRecognizer::from_graph(&graph);
        if structured {
            recognizer = recognizer.with_gazetteer()?;
        }
        let classifier = IntentClassifier::new(embedder).await?;
        Ok(Self::new(QueryInterpreter::new(graph, recognizer, classifier)))
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        self.interpreter.graph()
    }

    pub async fn interpret(&self, question: &str) -> Result<TraversalPlan> {
        self.interpreter.interpret(question).await
    }

    pub fn execute(&self, plan: &TraversalPlan) -> Vec<String> {
        self.executor.execute(plan)
    }

    /// Interpret and execute a question.
    pub async fn answer(&self, question: &str) -> Result<QueryOutcome> {
        let start = std::time::Instant::now();
        let plan = self.interpret(question).await?;
        let results = self.execute(&plan);
        log::debug!(
            "Answered '{}' with {} results in {:?}",
            question,
            results.len(),
            start.elapsed()
        );
        Ok(QueryOutcome {
            query_type: plan.query_type(),
            plan,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KgqaError;
    use crate::graph::{EntityKind, RelationKind};
    use crate::query::Intent;
    use crate::embeddings::HashingEmbedder;
    use crate::graph::load_graphml;
    use crate::testing::{hero_graph, KeywordEmbedder};
    use std::path::Path;

    async fn engine() -> QueryEngine {
        QueryEngine::build(hero_graph(), Arc::new(KeywordEmbedder), true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_wolverine_direct_powers() {
        let outcome = engine().await.answer("What powers does Wolverine have?").await.unwrap();
        assert_eq!(outcome.plan.start_entity, "Wolverine");
        assert_eq!(outcome.plan.intent, Intent::DirectPower);
        assert_eq!(outcome.plan.relation_chain, vec![RelationKind::PossessesPower]);
        // Enhanced Senses is only reachable through the gene.
        assert_eq!(outcome.results, vec!["Accelerated Healing"]);
        assert_eq!(outcome.query_type, "Character → Power");
    }

    #[tokio::test]
    async fn test_powers_via_mutation() {
        let outcome = engine()
            .await
            .answer("Which powers come to Wolverine through his lineage?")
            .await
            .unwrap();
        assert_eq!(outcome.plan.intent, Intent::MutationPower);
        assert_eq!(outcome.results, vec!["Accelerated Healing", "Enhanced Senses"]);
    }

    #[tokio::test]
    async fn test_power_reverse_lookup() {
        let outcome = engine().await.answer("Who has Optic Blasts?").await.unwrap();
        assert_eq!(outcome.plan.start_type, EntityKind::Power);
        assert_eq!(outcome.results, vec!["Cyclops"]);
        assert_eq!(outcome.query_type, "Power → Character");
    }

    #[tokio::test]
    async fn test_team_members() {
        let outcome = engine().await.answer("Who is in the X-Men?").await.unwrap();
        assert_eq!(outcome.results, vec!["Wolverine", "Cyclops", "Storm"]);
    }

    #[tokio::test]
    async fn test_gene_powers() {
        let outcome = engine()
            .await
            .answer("What does the Optic-Blast gene give?")
            .await
            .unwrap();
        assert_eq!(outcome.plan.start_entity, "Optic\u{2011}Blast");
        assert_eq!(outcome.results, vec!["Optic Blasts"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_error() {
        let outcome = engine().await.answer("What is Storm's mutation?").await.unwrap();
        assert_eq!(outcome.plan.intent, Intent::CharacterGene);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_entity_error() {
        let err = engine().await.answer("asdkfjasldkf").await.unwrap_err();
        assert!(matches!(err, KgqaError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn test_hashing_embedder_on_bundled_dataset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/marvel_kg.graphml");
        let graph = Arc::new(load_graphml(&path).unwrap());
        let embedder = Arc::new(HashingEmbedder::new(384).unwrap());
        let engine = QueryEngine::build(graph, embedder, true).await.unwrap();

        let cases: [(&str, Intent, &[&str]); 8] = [
            ("Tell me about Jean Grey's powers", Intent::DirectPower, &["Telepathy", "Telekinesis"]),
            (
                "What powers does Wolverine have?",
                Intent::DirectPower,
                &["Accelerated Healing", "Enhanced Senses"],
            ),
            ("What are Cyclops's abilities?", Intent::DirectPower, &["Optic Blasts"]),
            ("List the powers of Scarlet Witch", Intent::DirectPower, &["Reality Manipulation"]),
            ("Which abilities does Storm possess?", Intent::DirectPower, &["Weather Control"]),
            ("What team is Magneto in?", Intent::Team, &["Brotherhood of Mutants"]),
            ("Which group does Hulk belong to?", Intent::Team, &["Avengers"]),
            (
                "Which powers does Hulk get through his lineage?",
                Intent::MutationPower,
                &["Superhuman Strength"],
            ),
        ];

        for (question, intent, expected) in cases {
            let outcome = engine.answer(question).await.unwrap();
            assert_eq!(outcome.plan.start_type, EntityKind::Character, "{}", question);
            assert_eq!(outcome.plan.intent, intent, "{}", question);
            assert_eq!(outcome.results, expected, "{}", question);
        }
    }

    #[tokio::test]
    async fn test_outcome_serializes() {
        let outcome = engine().await.answer("Who has Weather Control?").await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["results"][0], "Storm");
        assert_eq!(json["plan"]["relation_chain"][0], "POSSESSES_POWER");
    }
}
