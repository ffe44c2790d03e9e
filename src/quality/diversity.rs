use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::quality::text::tokenize;
use crate::quality::{phrases, MetricScore, ScoreBounds, Tally};
use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDiversityConfig {
    pub stopwords: Vec<String>,
    /// Only words longer than this are considered.
    pub min_word_len: usize,
    /// A word appearing in more than this share of titles is repetitive.
    pub title_share: f64,
    pub repeated_word_penalty: f64,
    pub max_posts_per_forum: usize,
    pub forum_penalty: f64,
}

impl Default for ContentDiversityConfig {
    fn default() -> Self {
        Self {
            stopwords: phrases(&[
                "about", "after", "again", "anyone", "being", "could", "every", "other",
                "should", "their", "there", "these", "thing", "things", "think", "those",
                "using", "what's", "where", "which", "while", "would", "you're", "your",
            ]),
            min_word_len: 4,
            title_share: 0.6,
            repeated_word_penalty: 0.5,
            max_posts_per_forum: 2,
            forum_penalty: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentDiversityScorer {
    config: ContentDiversityConfig,
}

impl ContentDiversityScorer {
    pub fn new(config: ContentDiversityConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, posts: &[Post], bounds: &ScoreBounds) -> MetricScore {
        let mut tally = Tally::default();

        let repeated = self.repeated_title_words(posts);
        if !repeated.is_empty() {
            tally.penalize(
                self.config.repeated_word_penalty * repeated.len() as f64,
                format!("Repeated words in titles: {}", repeated.join(", ")),
            );
        }

        let mut per_forum: BTreeMap<&str, usize> = BTreeMap::new();
        for post in posts {
            *per_forum.entry(post.forum.as_str()).or_insert(0) += 1;
        }
        for (forum, count) in per_forum {
            if count > self.config.max_posts_per_forum {
                tally.penalize(
                    self.config.forum_penalty,
                    format!("Too many posts in {} ({} posts)", forum, count),
                );
            }
        }

        tally.finish(bounds)
    }

    /// Words present in more than `title_share` of all titles, alphabetically.
    pub fn repeated_title_words(&self, posts: &[Post]) -> Vec<String> {
        if posts.len() < 2 {
            return Vec::new();
        }

        let stopwords: BTreeSet<String> = self
            .config
            .stopwords
            .iter()
            .map(|word| word.to_lowercase())
            .collect();

        let mut title_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for post in posts {
            let words: BTreeSet<String> = tokenize(&post.title)
                .into_iter()
                .filter(|word| word.chars().count() > self.config.min_word_len)
                .filter(|word| !stopwords.contains(word))
                .collect();
            for word in words {
                *title_frequency.entry(word).or_insert(0) += 1;
            }
        }

        let limit = posts.len() as f64 * self.config.title_share;
        title_frequency
            .into_iter()
            .filter(|(_, count)| *count as f64 > limit)
            .map(|(word, _)| word)
            .collect()
    }
}
