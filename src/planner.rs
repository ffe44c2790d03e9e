use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::error::{CalendarError, Result};
use crate::Assignment;

/// Decides which topic goes to which forum for each post slot of a period.
#[derive(Debug, Clone)]
pub struct AssignmentPlanner {
    config: PlannerConfig,
}

impl AssignmentPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Produces exactly `count` assignments.
    ///
    /// Topics in `previous_topics` are disfavored: each one is independently
    /// dropped from the pool with `topic_prune_probability`, unless that would
    /// leave fewer topics than slots. Forums are picked uniformly among those
    /// still under `forum_cap`; once every forum is at the cap, all forums are
    /// candidates again.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        forums: &[String],
        topics: &[String],
        count: usize,
        previous_topics: &BTreeSet<String>,
        rng: &mut R,
    ) -> Result<Vec<Assignment>> {
        if forums.is_empty() {
            return Err(CalendarError::InvalidInput(
                "at least one forum is required".to_string(),
            ));
        }
        if topics.is_empty() {
            return Err(CalendarError::InvalidInput(
                "at least one topic is required".to_string(),
            ));
        }
        if count == 0 {
            return Err(CalendarError::InvalidInput(
                "post count must be at least 1".to_string(),
            ));
        }

        let mut topic_pool = self.topic_pool(topics, count, previous_topics, rng);
        topic_pool.shuffle(rng);

        let mut forum_usage: Vec<(&str, usize)> =
            dedup(forums).into_iter().map(|forum| (forum, 0)).collect();
        forum_usage.shuffle(rng);

        let mut assignments = Vec::with_capacity(count);
        for slot in 0..count {
            let topic = topic_pool[slot % topic_pool.len()].clone();

            let mut candidates: Vec<usize> = forum_usage
                .iter()
                .enumerate()
                .filter(|(_, (_, used))| *used < self.config.forum_cap)
                .map(|(idx, _)| idx)
                .collect();
            if candidates.is_empty() {
                candidates = (0..forum_usage.len()).collect();
            }
            let Some(&picked) = candidates.choose(rng) else {
                return Err(CalendarError::InvalidInput(
                    "no forum available for assignment".to_string(),
                ));
            };
            forum_usage[picked].1 += 1;
            let forum = forum_usage[picked].0.to_string();

            debug!(slot, forum = %forum, topic = %topic, "planned post slot");
            assignments.push(Assignment {
                forum,
                topics: vec![topic],
                ordinal: slot + 1,
            });
        }

        Ok(assignments)
    }

    fn topic_pool<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        count: usize,
        previous_topics: &BTreeSet<String>,
        rng: &mut R,
    ) -> Vec<String> {
        let all: Vec<String> = dedup(topics).into_iter().map(str::to_string).collect();
        if previous_topics.is_empty() {
            return all;
        }

        let pruned: Vec<String> = all
            .iter()
            .filter(|topic| {
                !previous_topics.contains(*topic)
                    || rng.gen::<f64>() >= self.config.topic_prune_probability
            })
            .cloned()
            .collect();

        if pruned.len() < count {
            warn!(
                remaining = pruned.len(),
                needed = count,
                "topic pruning would starve the period, using the full topic list"
            );
            return all;
        }
        pruned
    }
}

fn dedup(values: &[String]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .map(String::as_str)
        .filter(|value| seen.insert(*value))
        .collect()
}
