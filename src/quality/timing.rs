use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::quality::{MetricScore, ScoreBounds, Tally};
use crate::Post;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Replies faster than this many minutes count as instant.
    pub instant_minutes: u32,
    pub instant_share: f64,
    pub instant_penalty: f64,
    pub uniform_penalty: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            instant_minutes: 10,
            instant_share: 0.5,
            instant_penalty: 2.0,
            uniform_penalty: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimingScorer {
    config: TimingConfig,
}

impl TimingScorer {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, posts: &[Post], bounds: &ScoreBounds) -> MetricScore {
        let mut tally = Tally::default();

        for post in posts {
            let delays: Vec<u32> = post.comments.iter().map(|comment| comment.delay_minutes).collect();
            if delays.is_empty() {
                continue;
            }

            let instant = delays
                .iter()
                .filter(|delay| **delay < self.config.instant_minutes)
                .count();
            if instant as f64 > delays.len() as f64 * self.config.instant_share {
                tally.penalize(
                    self.config.instant_penalty,
                    format!("Post {}: too many quick replies", post.id),
                );
            }

            let distinct: HashSet<u32> = delays.iter().copied().collect();
            if delays.len() > 1 && distinct.len() == 1 {
                tally.penalize(
                    self.config.uniform_penalty,
                    format!("Post {}: all replies have the same delay", post.id),
                );
            }
        }

        tally.finish(bounds)
    }
}
