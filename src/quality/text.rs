//! Word-level helpers shared by the quality metrics.

use std::collections::HashSet;

/// Whitespace-separated word count, the way a reader would count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercased words with surrounding punctuation removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .trim_matches('\'')
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

pub fn word_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Number of listed phrases occurring anywhere in `text`, case-insensitively.
pub fn count_phrases(text: &str, phrases: &[String]) -> usize {
    let lowercase = text.to_lowercase();
    phrases
        .iter()
        .filter(|phrase| !phrase.is_empty() && lowercase.contains(&phrase.to_lowercase()))
        .count()
}

/// Whether `phrase` occurs as a run of whole words inside `tokens`.
pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let needle = tokenize(phrase);
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Jaccard index of two word sets; empty sets are never similar.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
