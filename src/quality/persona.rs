use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::quality::{MetricScore, ScoreBounds, Tally};
use crate::{format_percent, Persona, Post};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaVarietyConfig {
    pub heavy_share: f64,
    pub heavy_penalty: f64,
    pub overused_share: f64,
    pub overused_penalty: f64,
    /// Subtracted once per roster persona that never appears.
    pub unused_penalty: f64,
}

impl Default for PersonaVarietyConfig {
    fn default() -> Self {
        Self {
            heavy_share: 0.4,
            heavy_penalty: 1.0,
            overused_share: 0.5,
            overused_penalty: 3.0,
            unused_penalty: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PersonaVarietyScorer {
    config: PersonaVarietyConfig,
}

impl PersonaVarietyScorer {
    pub fn new(config: PersonaVarietyConfig) -> Self {
        Self { config }
    }

    pub fn usage(posts: &[Post]) -> BTreeMap<&str, usize> {
        let mut usage: BTreeMap<&str, usize> = BTreeMap::new();
        for username in posts.iter().flat_map(|post| post.participants()) {
            *usage.entry(username).or_insert(0) += 1;
        }
        usage
    }

    pub fn score(&self, posts: &[Post], personas: &[Persona], bounds: &ScoreBounds) -> MetricScore {
        let mut tally = Tally::default();
        let usage = Self::usage(posts);
        let total: usize = usage.values().sum();

        if total > 0 {
            for (username, count) in &usage {
                let share = *count as f64 / total as f64;
                if share > self.config.overused_share {
                    tally.penalize(
                        self.config.overused_penalty,
                        format!("Persona {} is overused ({})", username, format_percent(share)),
                    );
                } else if share > self.config.heavy_share {
                    tally.penalize(
                        self.config.heavy_penalty,
                        format!("Persona {} is heavily used ({})", username, format_percent(share)),
                    );
                }
            }
        }

        let unused: Vec<&str> = personas
            .iter()
            .map(|persona| persona.username.as_str())
            .filter(|username| !usage.contains_key(username))
            .collect();
        if !unused.is_empty() {
            tally.penalize(
                self.config.unused_penalty * unused.len() as f64,
                format!("Personas not used: {}", unused.join(", ")),
            );
        }

        tally.finish(bounds)
    }
}
