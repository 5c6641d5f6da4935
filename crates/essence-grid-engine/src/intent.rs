//! Query intent refinement.
//!
//! Pre-processing for the hybrid search mode: corrects close-miss typos
//! against a small built-in vocabulary, pulls out extension tokens and
//! keeps the stop-word-free keyword list for metadata boosting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Domain vocabulary used for typo correction.
const VOCABULARY: &[&str] = &[
    "python", "script", "file", "document", "report", "search", "query", "data", "code", "text",
    "json", "image", "video", "audio", "table", "index", "config", "error", "log", "test",
    "financial", "invoice", "contract", "summary", "analysis", "backup", "archive", "database",
    "server", "network",
];

/// Tokens carrying no search signal.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "for", "of", "in", "on", "to", "find", "show", "me", "my", "with", "about",
    "and", "or", "is", "are",
];

/// Shortest token length eligible for typo correction; very short tokens
/// produce too many distance-1 neighbours.
const MIN_CORRECTION_LEN: usize = 4;

/// The refined view of a raw query string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIntent {
    /// The query with typos corrected, whitespace-normalized.
    pub refined_query: String,
    /// Stop-word-free tokens, post-correction.
    pub keywords: Vec<String>,
    /// Extension-shaped tokens (".py", ".pdf").
    pub extensions: Vec<String>,
    /// Applied corrections, rendered as `from -> to`.
    pub corrections: Vec<String>,
}

impl SearchIntent {
    /// Whether any typo was corrected.
    pub fn is_corrected(&self) -> bool {
        !self.corrections.is_empty()
    }
}

/// Typo-correcting, keyword-extracting query refiner.
#[derive(Debug, Default)]
pub struct IntentRefiner {
    _private: (),
}

impl IntentRefiner {
    /// New refiner over the built-in vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refine a raw query into a [`SearchIntent`].
    pub fn refine(&self, query: &str) -> SearchIntent {
        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

        let mut refined_tokens = Vec::new();
        let mut keywords = Vec::new();
        let mut extensions = Vec::new();
        let mut corrections = Vec::new();

        for raw in query.to_lowercase().split_whitespace() {
            if raw.starts_with('.') && raw.len() <= 6 {
                extensions.push(raw.to_string());
                refined_tokens.push(raw.to_string());
                continue;
            }

            let token = match self.correct(raw) {
                Some(fixed) => {
                    corrections.push(format!("{raw} -> {fixed}"));
                    fixed.to_string()
                }
                None => raw.to_string(),
            };

            if !stop_words.contains(token.as_str()) {
                keywords.push(token.clone());
            }
            refined_tokens.push(token);
        }

        SearchIntent {
            refined_query: refined_tokens.join(" "),
            keywords,
            extensions,
            corrections,
        }
    }

    /// The vocabulary word one edit away from `token`, if any.
    fn correct(&self, token: &str) -> Option<&'static str> {
        if token.len() < MIN_CORRECTION_LEN || VOCABULARY.contains(&token) {
            return None;
        }
        VOCABULARY
            .iter()
            .find(|word| edit_distance(token, word) == 1)
            .copied()
    }
}

/// Levenshtein distance, two-row formulation.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
