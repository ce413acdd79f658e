//! Query tokenizer
//!
//! Splits text into unicode words, lower-cases them, drops stopwords and
//! numbers, and applies a light suffix stemmer. The same stemmer is applied to
//! signature and vocabulary terms, so both sides meet in the same form.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "by", "for", "with",
        "from", "into", "about", "as", "is", "are", "was", "were", "be", "been", "being", "am",
        "do", "does", "did", "i", "me", "my", "we", "our", "you", "your", "it", "its", "they",
        "them", "their", "this", "that", "these", "those", "what", "what's", "whats", "which",
        "who", "whom", "how", "why", "when", "where", "can", "could", "would", "should", "will",
        "shall", "may", "might", "must", "please", "there", "here", "some", "any", "so", "if",
        "then", "than", "too", "very", "just", "also", "let", "let's", "lets", "give", "tell",
        "get", "want", "need", "like", "us", "have", "has", "had", "up", "out", "over", "per",
        "all", "each", "more", "most", "much", "many", "not", "no",
    ]
    .into_iter()
    .collect()
});

/// Tokenized query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedQuery {
    /// Lower-cased words in order, nothing removed
    pub words: Vec<String>,
    /// Stemmed content tokens in order
    pub tokens: Vec<String>,
}

impl TokenizedQuery {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether the stemmed phrase occurs as consecutive tokens
    pub fn contains_phrase(&self, phrase: &[String]) -> bool {
        contains_sequence(&self.tokens, phrase)
    }
}

pub(crate) fn contains_sequence(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|w| w == phrase)
}

/// Whether a word is a stopword
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Light suffix stemmer
///
/// Strips plural, `-ing`, `-ed` and `-ly` endings, then a trailing `e`, so
/// that "compare", "compared" and "comparing" share one stem.
pub fn stem(word: &str) -> String {
    let w = word.to_lowercase();
    let len = w.chars().count();
    if len <= 3 || !w.is_ascii() {
        return w;
    }

    let mut s: &str = &w;
    let mut replaced: Option<String> = None;

    if s.ends_with("ies") && len > 4 {
        replaced = Some(format!("{}y", &s[..s.len() - 3]));
    } else if s.ends_with("sses")
        || s.ends_with("xes")
        || s.ends_with("ches")
        || s.ends_with("shes")
    {
        s = &s[..s.len() - 2];
    } else if s.ends_with('s') && !s.ends_with("ss") && !s.ends_with("us") && !s.ends_with("is") {
        s = &s[..s.len() - 1];
    } else if s.ends_with("ing") && len > 5 {
        s = &s[..s.len() - 3];
    } else if s.ends_with("ed") && len > 4 {
        s = &s[..s.len() - 2];
    } else if s.ends_with("ly") && len > 5 {
        s = &s[..s.len() - 2];
    }

    let mut out = replaced.unwrap_or_else(|| s.to_string());
    if out.len() > 4 && out.ends_with('e') {
        out.pop();
    }
    out
}

/// Stem every word of a term or phrase
pub fn stem_phrase(phrase: &str) -> Vec<String> {
    phrase
        .unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| !is_stopword(w))
        .map(|w| stem(&w))
        .collect()
}

/// Query tokenizer
#[derive(Debug, Clone, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> TokenizedQuery {
        let words: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();

        let tokens = words
            .iter()
            .filter(|w| !is_stopword(w))
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ','))
            .map(|w| stem(w))
            .collect();

        TokenizedQuery { words, tokens }
    }
}
