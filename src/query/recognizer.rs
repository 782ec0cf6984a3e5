//! Entity recognition in free-text questions.
//!
//! Two passes, first hit wins:
//! - a structured pass through a [`SpanRecognizer`] (when configured), whose
//!   proposals are accepted only if they name a known entity exactly;
//! - a substring pass over the vocabulary that ignores case and dash style.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{KgqaError, Result};
use crate::graph::{normalize_name, GraphStore};

/// Proposes entity mentions found in a text, in order of appearance.
pub trait SpanRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<String>;
}

/// Gazetteer matching a fixed list of phrases verbatim on word boundaries.
///
/// At each position the longest phrase that sits on word boundaries wins;
/// matches do not overlap.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    pattern: Option<Regex>,
    /// Longest first.
    phrases: Vec<String>,
}

impl PhraseMatcher {
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.trim().is_empty())
            .collect();
        if phrases.is_empty() {
            return Ok(Self {
                pattern: None,
                phrases,
            });
        }
        phrases.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        phrases.dedup();

        let alternation = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("(?:{})", alternation))
            .map_err(|e| KgqaError::InvalidInput(format!("Cannot build gazetteer: {}", e)))?;

        Ok(Self {
            pattern: Some(pattern),
            phrases,
        })
    }

    /// Longest phrase starting at byte `start` of `text` that does not cut
    /// into a word on either side.
    fn clean_match_at<'t>(&self, text: &'t str, start: usize) -> Option<&'t str> {
        let before = text[..start].chars().next_back();
        let rest = &text[start..];
        self.phrases
            .iter()
            .filter(|p| rest.starts_with(p.as_str()))
            .map(|p| &rest[..p.len()])
            .find(|candidate| {
                let after = rest[candidate.len()..].chars().next();
                let first = candidate.chars().next();
                let last = candidate.chars().next_back();
                !(is_word_char(before) && is_word_char(first))
                    && !(is_word_char(after) && is_word_char(last))
            })
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.map_or(false, char::is_alphanumeric)
}

impl SpanRecognizer for PhraseMatcher {
    fn recognize(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        let mut spans = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let Some(m) = pattern.find_at(text, pos) else {
                break;
            };
            if let Some(span) = self.clean_match_at(text, m.start()) {
                spans.push(span.to_string());
                pos = m.start() + span.len();
            } else {
                // retry from the next character boundary after the rejected start
                pos = m.start()
                    + text[m.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
            }
        }
        spans
    }
}

/// Locates which known entity a question is about.
///
/// Lookup tables are derived from the vocabulary at construction; rebuild the
/// recognizer when the graph changes.
pub struct EntityRecognizer {
    vocabulary: Vec<String>,
    normalized: Vec<String>,
    known: HashSet<String>,
    structured: Option<Box<dyn SpanRecognizer>>,
}

impl EntityRecognizer {
    /// Recognizer with only the substring pass. Vocabulary order decides
    /// which entity wins when several appear in a question.
    pub fn new(vocabulary: Vec<String>) -> Self {
        let normalized = vocabulary.iter().map(|name| normalize_name(name)).collect();
        let known = vocabulary.iter().cloned().collect();
        Self {
            vocabulary,
            normalized,
            known,
            structured: None,
        }
    }

    /// Recognizer over every entity of `graph`, in the graph's node order.
    pub fn from_graph(graph: &GraphStore) -> Self {
        Self::new(graph.entities().map(|e| e.name.clone()).collect())
    }

    /// Enable the structured pass with a custom recognizer.
    pub fn with_structured(mut self, recognizer: Box<dyn SpanRecognizer>) -> Self {
        self.structured = Some(recognizer);
        self
    }

    /// Enable the structured pass with a gazetteer built from the vocabulary.
    pub fn with_gazetteer(self) -> Result<Self> {
        let matcher = PhraseMatcher::new(&self.vocabulary)?;
        Ok(self.with_structured(Box::new(matcher)))
    }

    pub fn has_structured(&self) -> bool {
        self.structured.is_some()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Name of the entity the question refers to, if any.
    pub fn extract(&self, question: &str) -> Option<String> {
        if let Some(recognizer) = &self.structured {
            let found = recognizer
                .recognize(question)
                .into_iter()
                .find(|span| self.known.contains(span));
            if let Some(name) = found {
                log::debug!("Structured pass recognized '{}'", name);
                return Some(name);
            }
        }

        let question = normalize_name(question);
        let found = self
            .vocabulary
            .iter()
            .zip(&self.normalized)
            .find(|(_, norm)| !norm.is_empty() && question.contains(norm.as_str()))
            .map(|(name, _)| name.clone());
        if let Some(name) = &found {
            log::debug!("Substring pass recognized '{}'", name);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::hero_graph;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phrase_matcher_longest_match_wins() {
        let m = PhraseMatcher::new(["Spider", "Spider Woman", "Storm"]).unwrap();
        assert_eq!(m.recognize("Is Spider Woman stronger than Storm?"), names(&["Spider Woman", "Storm"]));
    }

    #[test]
    fn test_phrase_matcher_respects_word_boundaries() {
        let m = PhraseMatcher::new(["Storm", "Man"]).unwrap();
        assert!(m.recognize("Stormy weather for Batman").is_empty());
        assert_eq!(m.recognize("Man, Storm!"), names(&["Man", "Storm"]));
    }

    #[test]
    fn test_phrase_matcher_falls_back_to_shorter_phrase() {
        let m = PhraseMatcher::new(["Storm X", "Storm"]).unwrap();
        assert_eq!(m.recognize("Storm Xavier"), names(&["Storm"]));
        assert_eq!(m.recognize("Storm X, then Storm"), names(&["Storm X", "Storm"]));
    }

    #[test]
    fn test_phrase_matcher_is_case_sensitive() {
        let m = PhraseMatcher::new(["Storm"]).unwrap();
        assert!(m.recognize("what about storm").is_empty());
    }

    #[test]
    fn test_phrase_matcher_empty_vocabulary() {
        let m = PhraseMatcher::new(Vec::<String>::new()).unwrap();
        assert!(m.recognize("anything").is_empty());
    }

    #[test]
    fn test_phrase_matcher_escapes_metacharacters() {
        let m = PhraseMatcher::new(["Dr. (Strange)"]).unwrap();
        assert_eq!(m.recognize("Ask Dr. (Strange) now"), names(&["Dr. (Strange)"]));
        assert!(m.recognize("Ask Dr! Strange").is_empty());
    }

    #[test]
    fn test_substring_pass_case_insensitive() {
        let r = EntityRecognizer::from_graph(&hero_graph());
        assert_eq!(r.extract("what powers does WOLVERINE have"), Some("Wolverine".to_string()));
    }

    #[test]
    fn test_dash_invariance() {
        let r = EntityRecognizer::from_graph(&hero_graph());
        let expected = Some("Spider\u{2011}Man".to_string());
        assert_eq!(r.extract("What powers does Spider-Man have?"), expected);
        assert_eq!(r.extract("What powers does Spider\u{2011}Man have?"), expected);
        assert_eq!(r.extract("What powers does spider\u{2013}man have?"), expected);
        assert_eq!(r.extract("WHAT POWERS DOES SPIDER-MAN HAVE?"), expected);
    }

    #[test]
    fn test_first_vocabulary_entry_wins() {
        let r = EntityRecognizer::new(names(&["Storm", "Cyclops"]));
        assert_eq!(r.extract("Cyclops and Storm"), Some("Storm".to_string()));
    }

    #[test]
    fn test_no_entity_found() {
        let r = EntityRecognizer::from_graph(&hero_graph())
            .with_gazetteer()
            .unwrap();
        assert_eq!(r.extract("asdkfjasldkf"), None);
    }

    #[test]
    fn test_structured_pass_takes_precedence() {
        let r = EntityRecognizer::new(names(&["Storm", "Cyclops"]))
            .with_gazetteer()
            .unwrap();
        assert!(r.has_structured());
        // Substring order would pick Storm; the gazetteer sees Cyclops first.
        assert_eq!(r.extract("Cyclops and Storm"), Some("Cyclops".to_string()));
    }

    #[test]
    fn test_structured_spans_must_exist_in_graph() {
        struct Proposer;
        impl SpanRecognizer for Proposer {
            fn recognize(&self, _text: &str) -> Vec<String> {
                vec!["Galactus".to_string(), "Cyclops".to_string()]
            }
        }
        let r = EntityRecognizer::new(names(&["Storm", "Cyclops"]))
            .with_structured(Box::new(Proposer));
        assert_eq!(r.extract("Galactus vs Storm"), Some("Cyclops".to_string()));
    }

    #[test]
    fn test_structured_miss_falls_back_to_substring() {
        let r = EntityRecognizer::from_graph(&hero_graph())
            .with_gazetteer()
            .unwrap();
        // Gazetteer is exact; only the substring pass handles the ASCII hyphen.
        assert_eq!(r.extract("Who is spider-man?"), Some("Spider\u{2011}Man".to_string()));
    }

    #[test]
    fn test_empty_names_never_match() {
        let r = EntityRecognizer::new(names(&["", "Storm"]));
        assert_eq!(r.extract("nothing here"), None);
        assert_eq!(r.extract("Storm"), Some("Storm".to_string()));
    }
}
