use chrono::{Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::config::CalendarConfig;
use crate::error::{CalendarError, Result};
use crate::generator::ContentGenerator;
use crate::planner::AssignmentPlanner;
use crate::quality::QualityScorer;
use crate::thread::{ThreadContext, ThreadSynthesizer};
use crate::{ensure_unique_usernames, Period, Persona};

/// Everything the caller supplies for one calendar run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarRequest {
    #[serde(alias = "company_info")]
    pub company_context: String,
    pub personas: Vec<Persona>,
    #[serde(alias = "subreddits")]
    pub forums: Vec<String>,
    #[serde(alias = "keywords")]
    pub topics: Vec<String>,
    #[serde(alias = "posts_per_week")]
    pub posts_per_period: usize,
    #[serde(default = "default_period_index", alias = "week_number")]
    pub period_index: u32,
}

fn default_period_index() -> u32 {
    1
}

impl CalendarRequest {
    pub fn validate(&self) -> Result<()> {
        if self.company_context.trim().is_empty() {
            return Err(CalendarError::InvalidInput(
                "company context is required".to_string(),
            ));
        }
        if self.personas.len() < 2 {
            return Err(CalendarError::InvalidInput(
                "at least 2 personas are required".to_string(),
            ));
        }
        ensure_unique_usernames(&self.personas)?;
        if self.forums.is_empty() {
            return Err(CalendarError::InvalidInput(
                "at least one forum is required".to_string(),
            ));
        }
        if self.topics.is_empty() {
            return Err(CalendarError::InvalidInput(
                "at least one topic is required".to_string(),
            ));
        }
        if self.posts_per_period == 0 {
            return Err(CalendarError::InvalidInput(
                "posts per period must be at least 1".to_string(),
            ));
        }
        if self.period_index == 0 {
            return Err(CalendarError::InvalidInput(
                "period index must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Orchestrates one calendar run: plan, synthesize every thread, score.
pub struct CalendarBuilder<'a, G: ContentGenerator + ?Sized> {
    generator: &'a G,
    config: &'a CalendarConfig,
}

impl<'a, G: ContentGenerator + ?Sized> CalendarBuilder<'a, G> {
    pub fn new(generator: &'a G, config: &'a CalendarConfig) -> Self {
        Self { generator, config }
    }

    /// Builds the period whose window is counted from `today`.
    ///
    /// Any comment generation failure aborts the run; no partial period is
    /// returned.
    pub async fn build<R: Rng + ?Sized>(
        &self,
        request: &CalendarRequest,
        previous: Option<&Period>,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Period> {
        request.validate()?;
        self.config.validate()?;

        let (start_date, end_date) = Period::window(request.period_index, today)?;
        let previous_topics = previous.map(Period::used_topics).unwrap_or_else(BTreeSet::new);

        let planner = AssignmentPlanner::new(self.config.planner.clone());
        let assignments = planner.plan(
            &request.forums,
            &request.topics,
            request.posts_per_period,
            &previous_topics,
            rng,
        )?;

        let synthesizer = ThreadSynthesizer::new(self.generator, &self.config.thread);
        let context = ThreadContext {
            personas: &request.personas,
            company_context: &request.company_context,
            period_index: request.period_index,
            period_start: start_date,
        };

        let mut posts = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            posts.push(synthesizer.synthesize(assignment, &context, rng).await?);
        }

        let quality = QualityScorer::new(self.config.quality.clone()).score(&posts, &request.personas);
        info!(
            period = request.period_index,
            posts = posts.len(),
            overall = quality.overall,
            warnings = quality.warnings.len(),
            "calendar generated"
        );

        Ok(Period {
            period_index: request.period_index,
            start_date,
            end_date,
            posts,
            quality,
        })
    }
}

/// Generates the requested period starting from the local current date.
pub async fn generate_calendar<G, R>(
    generator: &G,
    config: &CalendarConfig,
    request: &CalendarRequest,
    previous: Option<&Period>,
    rng: &mut R,
) -> Result<Period>
where
    G: ContentGenerator + ?Sized,
    R: Rng + ?Sized,
{
    let today = Local::now().date_naive();
    CalendarBuilder::new(generator, config)
        .build(request, previous, today, rng)
        .await
}
