use crate::quality::{
    round1, AntiSpamScorer, ContentDiversityScorer, MetricWeights, NaturalnessScorer,
    PersonaVarietyScorer, QualityConfig, QualityReport, ScoreBounds, TimingScorer,
};
use crate::{Persona, Post};

/// Runs the five authenticity metrics over a materialized calendar.
///
/// Scoring is a pure function of its inputs: the same posts and roster always
/// produce the same report, warnings included and in the same order.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    bounds: ScoreBounds,
    weights: MetricWeights,
    naturalness: NaturalnessScorer,
    persona_variety: PersonaVarietyScorer,
    timing: TimingScorer,
    content_diversity: ContentDiversityScorer,
    anti_spam: AntiSpamScorer,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            bounds: config.bounds,
            weights: config.weights,
            naturalness: NaturalnessScorer::new(config.naturalness),
            persona_variety: PersonaVarietyScorer::new(config.persona_variety),
            timing: TimingScorer::new(config.timing),
            content_diversity: ContentDiversityScorer::new(config.content_diversity),
            anti_spam: AntiSpamScorer::new(config.anti_spam),
        }
    }

    pub fn score(&self, posts: &[Post], personas: &[Persona]) -> QualityReport {
        let naturalness = self.naturalness.score(posts, &self.bounds);
        let persona_variety = self.persona_variety.score(posts, personas, &self.bounds);
        let timing = self.timing.score(posts, &self.bounds);
        let content_diversity = self.content_diversity.score(posts, &self.bounds);
        let anti_spam = self.anti_spam.score(posts, &self.bounds);

        let weighted = naturalness.score * self.weights.naturalness
            + persona_variety.score * self.weights.persona_variety
            + timing.score * self.weights.timing_realism
            + content_diversity.score * self.weights.content_diversity
            + anti_spam.score * self.weights.anti_spam;
        let overall = self.bounds.clamp(round1(weighted));

        let warnings = [
            &naturalness,
            &persona_variety,
            &timing,
            &content_diversity,
            &anti_spam,
        ]
        .into_iter()
        .flat_map(|metric| metric.warnings.iter().cloned())
        .collect();

        QualityReport {
            overall,
            naturalness: naturalness.score,
            persona_variety: persona_variety.score,
            timing_realism: timing.score,
            content_diversity: content_diversity.score,
            anti_spam: anti_spam.score,
            warnings,
        }
    }
}
