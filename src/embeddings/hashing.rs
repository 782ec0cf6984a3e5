//! Offline embedder based on feature hashing of normalized words.

use async_trait::async_trait;

use super::Embedder;
use crate::error::{KgqaError, Result};

const STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "any", "are", "by", "can", "could", "did", "do", "does",
    "for", "her", "his", "how", "in", "is", "it", "its", "list", "me", "of", "on", "or", "please",
    "show", "tell", "that", "the", "their", "this", "to", "was", "were", "what", "which", "who",
    "whom", "whose", "with", "would",
];

/// Words folded onto a shared canonical form after stemming.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("possess", &["have", "has", "had", "own", "possessed"]),
    ("belong", &["member", "join", "joined", "belonged"]),
    ("mutation", &["gene", "genetic", "mutant", "mutate", "mutated"]),
    ("confer", &["grant", "give", "provide", "conferred"]),
    ("power", &["ability", "skill"]),
    ("team", &["group", "squad"]),
    ("character", &["hero", "villain"]),
    ("via", &["through"]),
];

/// Canonical terms dropped after folding. Every intent template says
/// "retrieve" and most name a "character", so keeping them rewards the
/// shortest template instead of the closest one.
const NEUTRAL_TERMS: &[&str] = &["retrieve", "character", "directly"];

/// Deterministic bag-of-words embedder.
///
/// Each content word is lowercased, stemmed and canonicalized, then hashed
/// (FNV-1a) into one of `dimensions` signed buckets. The result is
/// L2-normalized. No model download or network access is needed.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(KgqaError::Config(
                "Hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for term in terms(text) {
            let hash = fnv1a(term.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn stem(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("sses") || (word.len() > 4 && word.ends_with("oes")) {
        word[..word.len() - 2].to_string()
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn canonical(word: String) -> String {
    SYNONYMS
        .iter()
        .find(|(canon, variants)| *canon == word || variants.contains(&word.as_str()))
        .map(|(canon, _)| canon.to_string())
        .unwrap_or(word)
}

/// Content terms of `text` in order of appearance.
fn terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(|w| canonical(stem(w)))
        .filter(|term| !NEUTRAL_TERMS.contains(&term.as_str()))
        .collect()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}
