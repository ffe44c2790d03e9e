use serde::{Deserialize, Serialize};

use crate::quality::text::{count_phrases, word_count};
use crate::quality::{default_promotional_phrases, phrases, MetricScore, ScoreBounds, Tally};
use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NaturalnessConfig {
    pub min_post_words: usize,
    pub max_post_words: usize,
    pub max_comment_words: usize,
    pub post_length_penalty: f64,
    pub comment_length_penalty: f64,
    pub promotional_phrases: Vec<String>,
    /// Subtracted once per promotional phrase found.
    pub promotional_penalty: f64,
    pub ai_disclosure_phrases: Vec<String>,
    pub ai_disclosure_penalty: f64,
}

impl Default for NaturalnessConfig {
    fn default() -> Self {
        Self {
            min_post_words: 5,
            max_post_words: 100,
            max_comment_words: 80,
            post_length_penalty: 0.5,
            comment_length_penalty: 0.3,
            promotional_phrases: default_promotional_phrases(),
            promotional_penalty: 0.5,
            ai_disclosure_phrases: phrases(&[
                "as an ai",
                "as a language model",
                "ai language model",
                "i'm an ai",
                "i am an ai",
            ]),
            ai_disclosure_penalty: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NaturalnessScorer {
    config: NaturalnessConfig,
}

impl NaturalnessScorer {
    pub fn new(config: NaturalnessConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, posts: &[Post], bounds: &ScoreBounds) -> MetricScore {
        let mut tally = Tally::default();

        for post in posts {
            let words = word_count(&post.body);
            if words < self.config.min_post_words {
                tally.penalize(
                    self.config.post_length_penalty,
                    format!("Post {} is very short ({} words)", post.id, words),
                );
            } else if words > self.config.max_post_words {
                tally.penalize(
                    self.config.post_length_penalty,
                    format!("Post {} is very long ({} words)", post.id, words),
                );
            }

            let text = format!("{}\n{}", post.title, post.body);
            self.check_phrases(&mut tally, "Post", &post.id, &text);

            for comment in &post.comments {
                let words = word_count(&comment.text);
                if words > self.config.max_comment_words {
                    tally.penalize(
                        self.config.comment_length_penalty,
                        format!("Comment {} is too long ({} words)", comment.id, words),
                    );
                }
                self.check_phrases(&mut tally, "Comment", &comment.id, &comment.text);
            }
        }

        tally.finish(bounds)
    }

    fn check_phrases(&self, tally: &mut Tally, kind: &str, id: &str, text: &str) {
        let promotional = count_phrases(text, &self.config.promotional_phrases);
        if promotional > 0 {
            tally.penalize(
                self.config.promotional_penalty * promotional as f64,
                format!("{} {} contains promotional language", kind, id),
            );
        }

        let disclosures = count_phrases(text, &self.config.ai_disclosure_phrases);
        if disclosures > 0 {
            tally.penalize(
                self.config.ai_disclosure_penalty * disclosures as f64,
                format!("{} {} reads as AI-written", kind, id),
            );
        }
    }
}
