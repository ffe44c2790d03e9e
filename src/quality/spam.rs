use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::quality::text::{contains_phrase, count_phrases, jaccard, tokenize, word_set};
use crate::quality::{default_promotional_phrases, phrases, MetricScore, ScoreBounds, Tally};
use crate::{format_float, format_percent, Comment, Post};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiSpamConfig {
    pub promotional_phrases: Vec<String>,
    /// Total promotional hits across all comments tolerated before penalizing.
    pub promotional_hit_limit: usize,
    pub promotional_penalty: f64,
    pub openers: Vec<String>,
    /// How many leading words of a comment count as its opener.
    pub opener_window_words: usize,
    pub opener_max_uses: usize,
    pub opener_penalty: f64,
    pub similarity_threshold: f64,
    /// Subtracted once per comment pair above the threshold.
    pub similarity_penalty: f64,
    pub disclaimers: Vec<String>,
    pub disclaimer_share: f64,
    pub disclaimer_penalty: f64,
    pub min_type_token_ratio: f64,
    pub vocabulary_penalty: f64,
}

impl Default for AntiSpamConfig {
    fn default() -> Self {
        Self {
            promotional_phrases: default_promotional_phrases(),
            promotional_hit_limit: 2,
            promotional_penalty: 2.0,
            openers: phrases(&[
                "honestly",
                "tbh",
                "ngl",
                "great question",
                "i've been using",
                "as someone who",
                "same here",
                "this is so true",
                "i totally agree",
                "game changer for me",
            ]),
            opener_window_words: 15,
            opener_max_uses: 2,
            opener_penalty: 1.0,
            similarity_threshold: 0.7,
            similarity_penalty: 1.0,
            disclaimers: phrases(&[
                "not perfect",
                "took some getting used to",
                "has its quirks",
                "learning curve",
                "not for everyone",
            ]),
            disclaimer_share: 0.4,
            disclaimer_penalty: 1.0,
            min_type_token_ratio: 0.5,
            vocabulary_penalty: 1.0,
        }
    }
}

/// Period-wide checks for patterns that make a set of comments look coordinated.
///
/// Only phrase patterns are inspected: a product mention is judged the same
/// whether it sits in the first comment of a thread or a later one.
#[derive(Debug, Clone)]
pub struct AntiSpamScorer {
    config: AntiSpamConfig,
}

impl AntiSpamScorer {
    pub fn new(config: AntiSpamConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, posts: &[Post], bounds: &ScoreBounds) -> MetricScore {
        let mut tally = Tally::default();
        let comments: Vec<&Comment> = posts.iter().flat_map(|post| post.comments.iter()).collect();
        if comments.is_empty() {
            return tally.finish(bounds);
        }

        self.check_promotional_density(&comments, &mut tally);
        self.check_openers(&comments, &mut tally);
        self.check_similarity(&comments, &mut tally);
        self.check_disclaimers(&comments, &mut tally);
        self.check_vocabulary(&comments, &mut tally);

        tally.finish(bounds)
    }

    fn check_promotional_density(&self, comments: &[&Comment], tally: &mut Tally) {
        let hits: usize = comments
            .iter()
            .map(|comment| count_phrases(&comment.text, &self.config.promotional_phrases))
            .sum();
        if hits > self.config.promotional_hit_limit {
            tally.penalize(
                self.config.promotional_penalty,
                format!("Promotional phrasing appears {} times across comments", hits),
            );
        }
    }

    fn check_openers(&self, comments: &[&Comment], tally: &mut Tally) {
        let leads: Vec<Vec<String>> = comments
            .iter()
            .map(|comment| {
                let mut tokens = tokenize(&comment.text);
                tokens.truncate(self.config.opener_window_words);
                tokens
            })
            .collect();

        for opener in &self.config.openers {
            let uses = leads.iter().filter(|lead| contains_phrase(lead, opener)).count();
            if uses > self.config.opener_max_uses {
                tally.penalize(
                    self.config.opener_penalty,
                    format!("Opener \"{}\" used in {} comments", opener, uses),
                );
            }
        }
    }

    // All pairs; fine at calendar scale.
    fn check_similarity(&self, comments: &[&Comment], tally: &mut Tally) {
        let sets: Vec<HashSet<String>> = comments.iter().map(|comment| word_set(&comment.text)).collect();

        for i in 0..comments.len() {
            for j in (i + 1)..comments.len() {
                let similarity = jaccard(&sets[i], &sets[j]);
                if similarity > self.config.similarity_threshold {
                    tally.penalize(
                        self.config.similarity_penalty,
                        format!(
                            "Comments {} and {} are very similar ({})",
                            comments[i].id,
                            comments[j].id,
                            format_float(similarity, 2)
                        ),
                    );
                }
            }
        }
    }

    fn check_disclaimers(&self, comments: &[&Comment], tally: &mut Tally) {
        let with_disclaimer = comments
            .iter()
            .filter(|comment| count_phrases(&comment.text, &self.config.disclaimers) > 0)
            .count();
        let share = with_disclaimer as f64 / comments.len() as f64;
        if share > self.config.disclaimer_share {
            tally.penalize(
                self.config.disclaimer_penalty,
                format!("Disclaimers appear in {} of comments", format_percent(share)),
            );
        }
    }

    fn check_vocabulary(&self, comments: &[&Comment], tally: &mut Tally) {
        let tokens: Vec<String> = comments.iter().flat_map(|comment| tokenize(&comment.text)).collect();
        if tokens.is_empty() {
            return;
        }
        let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let ratio = distinct.len() as f64 / tokens.len() as f64;
        if ratio < self.config.min_type_token_ratio {
            tally.penalize(
                self.config.vocabulary_penalty,
                format!("Comment vocabulary is repetitive (type/token ratio {})", format_float(ratio, 2)),
            );
        }
    }
}
