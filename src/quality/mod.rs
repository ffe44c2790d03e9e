pub mod diversity;
pub mod naturalness;
pub mod persona;
pub mod scorer;
pub mod spam;
pub mod text;
pub mod timing;

use serde::{Deserialize, Serialize};

use crate::config::check_probability;
use crate::error::{CalendarError, Result};

pub use diversity::{ContentDiversityConfig, ContentDiversityScorer};
pub use naturalness::{NaturalnessConfig, NaturalnessScorer};
pub use persona::{PersonaVarietyConfig, PersonaVarietyScorer};
pub use scorer::QualityScorer;
pub use spam::{AntiSpamConfig, AntiSpamScorer};
pub use timing::{TimingConfig, TimingScorer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(alias = "overall_score")]
    pub overall: f64,
    pub naturalness: f64,
    pub persona_variety: f64,
    pub timing_realism: f64,
    pub content_diversity: f64,
    #[serde(alias = "anti_spam_score")]
    pub anti_spam: f64,
    pub warnings: Vec<String>,
}

/// One sub-scorer's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricScore {
    pub score: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            floor: 1.0,
            ceiling: 10.0,
        }
    }
}

impl ScoreBounds {
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.floor;
        }
        value.max(self.floor).min(self.ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub naturalness: f64,
    pub persona_variety: f64,
    pub timing_realism: f64,
    pub content_diversity: f64,
    pub anti_spam: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            naturalness: 0.30,
            persona_variety: 0.15,
            timing_realism: 0.15,
            content_diversity: 0.20,
            anti_spam: 0.20,
        }
    }
}

impl MetricWeights {
    pub fn total(&self) -> f64 {
        self.naturalness
            + self.persona_variety
            + self.timing_realism
            + self.content_diversity
            + self.anti_spam
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub bounds: ScoreBounds,
    pub weights: MetricWeights,
    pub naturalness: NaturalnessConfig,
    pub persona_variety: PersonaVarietyConfig,
    pub timing: TimingConfig,
    pub content_diversity: ContentDiversityConfig,
    pub anti_spam: AntiSpamConfig,
}

impl QualityConfig {
    pub fn validate(&self) -> Result<()> {
        let bounds = &self.bounds;
        if bounds.floor.is_nan() || bounds.ceiling.is_nan() || bounds.floor >= bounds.ceiling {
            return Err(CalendarError::Config(format!(
                "quality.bounds: floor {} must be below ceiling {}",
                bounds.floor, bounds.ceiling
            )));
        }

        let weights = &self.weights;
        let all = [
            weights.naturalness,
            weights.persona_variety,
            weights.timing_realism,
            weights.content_diversity,
            weights.anti_spam,
        ];
        if all.iter().any(|weight| weight.is_nan() || *weight < 0.0) {
            return Err(CalendarError::Config(
                "quality.weights must be non-negative".to_string(),
            ));
        }
        if (weights.total() - 1.0).abs() > 1e-6 {
            return Err(CalendarError::Config(format!(
                "quality.weights must sum to 1.0, got {}",
                weights.total()
            )));
        }

        check_probability("quality.persona_variety.heavy_share", self.persona_variety.heavy_share)?;
        check_probability(
            "quality.persona_variety.overused_share",
            self.persona_variety.overused_share,
        )?;
        check_probability("quality.timing.instant_share", self.timing.instant_share)?;
        check_probability(
            "quality.content_diversity.title_share",
            self.content_diversity.title_share,
        )?;
        check_probability(
            "quality.anti_spam.similarity_threshold",
            self.anti_spam.similarity_threshold,
        )?;
        check_probability("quality.anti_spam.disclaimer_share", self.anti_spam.disclaimer_share)?;
        check_probability(
            "quality.anti_spam.min_type_token_ratio",
            self.anti_spam.min_type_token_ratio,
        )?;
        Ok(())
    }
}

/// Accumulates penalties and warnings for one metric.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    penalty: f64,
    warnings: Vec<String>,
}

impl Tally {
    pub(crate) fn penalize(&mut self, amount: f64, warning: String) {
        self.penalty += amount;
        self.warnings.push(warning);
    }

    pub(crate) fn finish(self, bounds: &ScoreBounds) -> MetricScore {
        MetricScore {
            score: bounds.clamp(round1(bounds.ceiling - self.penalty)),
            warnings: self.warnings,
        }
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn phrases(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(crate) fn default_promotional_phrases() -> Vec<String> {
    phrases(&[
        "revolutionary",
        "game-changer",
        "amazing",
        "incredible",
        "transform",
        "must-have",
        "best solution",
        "perfect for",
        "highly recommend",
        "you should definitely",
        "try this",
        "check out",
        "visit",
        "sign up",
    ])
}
