//! Scored messages and the keyword scorer.

use std::collections::BTreeMap;
use std::fmt;

/// Default keyword weights used when no table is configured.
pub const DEFAULT_KEYWORDS: [(&str, u32); 6] = [
    ("emergencia", 10),
    ("fallo critico", 9),
    ("urgente", 8),
    ("problema", 5),
    ("consulta", 2),
    ("duda", 1),
];

/// Build the default keyword table.
pub fn default_keywords() -> BTreeMap<String, u32> {
    DEFAULT_KEYWORDS
        .iter()
        .map(|(keyword, weight)| (keyword.to_string(), *weight))
        .collect()
}

/// An incoming text message with its precomputed priority.
///
/// Messages are only built through a [`Scorer`], so the priority always
/// matches the text under the scorer's keyword table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    text: String,
    priority: u32,
}

impl Message {
    /// Message text as entered.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Priority computed at construction.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Number of whitespace separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Text length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Maps message text to a priority by summing keyword weights.
///
/// Matching is a case-insensitive substring test and each keyword counts
/// once no matter how often it occurs.
#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: Vec<(String, u32)>,
}

impl Scorer {
    /// Create a scorer over the given keyword table.
    ///
    /// Keys that only differ by case collapse into one keyword; the first
    /// one in table order keeps its weight.
    pub fn new(keywords: BTreeMap<String, u32>) -> Self {
        let mut merged: BTreeMap<String, u32> = BTreeMap::new();
        for (keyword, weight) in keywords {
            merged.entry(keyword.to_lowercase()).or_insert(weight);
        }
        Self {
            keywords: merged.into_iter().collect(),
        }
    }

    /// Score a piece of text. Saturates at `u32::MAX`.
    pub fn score(&self, text: &str) -> u32 {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword.as_str()))
            .fold(0u32, |total, (_, weight)| total.saturating_add(*weight))
    }

    /// Keywords found in the text, with their weights.
    pub fn matched_keywords(&self, text: &str) -> Vec<(&str, u32)> {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(keyword, weight)| (keyword.as_str(), *weight))
            .collect()
    }

    /// Build a scored message.
    pub fn message(&self, text: impl Into<String>) -> Message {
        let text = text.into();
        let priority = self.score(&text);
        Message { text, priority }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(default_keywords())
    }
}
