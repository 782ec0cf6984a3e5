//! Intent catalog and the type-directed / semantic intent classifier.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embeddings::{cosine_similarity, Embedder};
use crate::error::{KgqaError, Result};
use crate::graph::{EntityKind, RelationKind};

/// What a question asks for, which fixes the relation chain to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Powers a character possesses directly.
    DirectPower,
    /// Powers a character gets through its genes.
    MutationPower,
    /// Teams a character belongs to.
    Team,
    /// Powers a gene confers.
    GenePower,
    /// Genes a character has.
    CharacterGene,
    /// Characters possessing a power. Reached only by type dispatch.
    PowerCharacter,
    /// Members of a team. Reached only by type dispatch.
    TeamCharacter,
}

/// Intents eligible for semantic matching, in tie-break order.
pub const INTENT_CATALOG: [Intent; 5] = [
    Intent::DirectPower,
    Intent::MutationPower,
    Intent::Team,
    Intent::GenePower,
    Intent::CharacterGene,
];

const MUTATION_KEYWORDS: [&str; 3] = ["gene", "mutation", "mutant"];

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::DirectPower => "direct_power",
            Intent::MutationPower => "mutation_power",
            Intent::Team => "team",
            Intent::GenePower => "gene_power",
            Intent::CharacterGene => "character_gene",
            Intent::PowerCharacter => "power_character",
            Intent::TeamCharacter => "team_character",
        }
    }

    /// Template sentence scored against questions. `None` for intents that
    /// only type dispatch can produce.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Intent::DirectPower => Some("Retrieve powers a character directly possesses"),
            Intent::MutationPower => Some("Retrieve powers a character has via mutations"),
            Intent::Team => Some("Retrieve teams a character belongs to"),
            Intent::GenePower => Some("Retrieve powers a gene confers"),
            Intent::CharacterGene => Some("Retrieve genes a character has"),
            Intent::PowerCharacter | Intent::TeamCharacter => None,
        }
    }

    pub fn relation_chain(&self) -> &'static [RelationKind] {
        match self {
            Intent::DirectPower | Intent::PowerCharacter => &[RelationKind::PossessesPower],
            Intent::MutationPower => &[RelationKind::HasMutation, RelationKind::Confers],
            Intent::Team | Intent::TeamCharacter => &[RelationKind::MemberOf],
            Intent::GenePower => &[RelationKind::Confers],
            Intent::CharacterGene => &[RelationKind::HasMutation],
        }
    }

    /// Expected kind of the final results.
    pub fn target_type(&self) -> EntityKind {
        match self {
            Intent::DirectPower | Intent::MutationPower | Intent::GenePower => EntityKind::Power,
            Intent::Team => EntityKind::Team,
            Intent::CharacterGene => EntityKind::Gene,
            Intent::PowerCharacter | Intent::TeamCharacter => EntityKind::Character,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn mentions_mutation(question: &str) -> bool {
    let lower = question.to_lowercase();
    MUTATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Chooses an intent from the start entity's kind, falling back to semantic
/// similarity against the catalog templates.
///
/// Template embeddings are computed once in [`IntentClassifier::new`] and
/// only read afterwards.
pub struct IntentClassifier {
    embedder: Arc<dyn Embedder>,
    templates: Vec<(Intent, Vec<f32>)>,
}

impl IntentClassifier {
    pub async fn new(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let descriptions: Vec<String> = INTENT_CATALOG
            .iter()
            .filter_map(|intent| intent.description())
            .map(str::to_string)
            .collect();
        let vectors = embedder.embed_batch(&descriptions).await?;

        if vectors.len() != INTENT_CATALOG.len() {
            return Err(KgqaError::Embedding(format!(
                "Expected {} template embeddings, got {}",
                INTENT_CATALOG.len(),
                vectors.len()
            )));
        }
        let dimensions = vectors[0].len();
        if dimensions == 0 || vectors.iter().any(|v| v.len() != dimensions) {
            return Err(KgqaError::Embedding(
                "Template embeddings have inconsistent dimensions".to_string(),
            ));
        }

        log::info!(
            "Intent classifier ready: {} templates, {} dimensions",
            vectors.len(),
            dimensions
        );

        Ok(Self {
            embedder,
            templates: INTENT_CATALOG.iter().copied().zip(vectors).collect(),
        })
    }

    /// Classify a question about an entity of kind `kind`.
    pub async fn classify(&self, question: &str, kind: EntityKind) -> Result<Intent> {
        let intent = match kind {
            EntityKind::Gene => Intent::GenePower,
            EntityKind::Power => Intent::PowerCharacter,
            EntityKind::Team => Intent::TeamCharacter,
            EntityKind::Character if mentions_mutation(question) => Intent::CharacterGene,
            EntityKind::Character | EntityKind::Unknown => self.semantic_match(question).await?,
        };
        Ok(intent)
    }

    /// Pick the catalog intent whose template is most similar to the question.
    /// Ties go to the earlier catalog entry.
    pub async fn semantic_match(&self, question: &str) -> Result<Intent> {
        let query = self.embedder.embed(question).await?;
        let dimensions = self.templates[0].1.len();
        if query.len() != dimensions {
            return Err(KgqaError::Embedding(format!(
                "Unexpected embedding dimension: expected {}, got {}",
                dimensions,
                query.len()
            )));
        }

        let mut best = (self.templates[0].0, f32::NEG_INFINITY);
        for (intent, template) in &self.templates {
            let score = cosine_similarity(&query, template);
            log::debug!("Intent {} scored {:.4}", intent, score);
            if score > best.1 {
                best = (*intent, score);
            }
        }
        log::debug!("Semantic match selected {} ({:.4})", best.0, best.1);
        Ok(best.0)
    }
}
