//! Turns a question into a [`TraversalPlan`].

use std::sync::Arc;

use super::{EntityRecognizer, IntentClassifier, TraversalPlan};
use crate::error::{KgqaError, Result};
use crate::graph::GraphStore;

/// Orchestrates entity recognition and intent classification.
pub struct QueryInterpreter {
    graph: Arc<GraphStore>,
    recognizer: EntityRecognizer,
    classifier: IntentClassifier,
}

impl QueryInterpreter {
    pub fn new(
        graph: Arc<GraphStore>,
        recognizer: EntityRecognizer,
        classifier: IntentClassifier,
    ) -> Self {
        Self {
            graph,
            recognizer,
            classifier,
        }
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// Build a plan for `question`.
    ///
    /// Fails with [`KgqaError::EntityNotFound`] when the question names no
    /// known entity.
    pub async fn interpret(&self, question: &str) -> Result<TraversalPlan> {
        let start_entity = self
            .recognizer
            .extract(question)
            .ok_or_else(|| KgqaError::EntityNotFound(question.to_string()))?;

        let start_type = self.graph.node_type(&start_entity);
        let intent = self.classifier.classify(question, start_type).await?;
        log::debug!(
            "Interpreted '{}' as {} on {} ({})",
            question,
            intent,
            start_entity,
            start_type
        );

        Ok(TraversalPlan::new(start_entity, start_type, intent))
    }
}
