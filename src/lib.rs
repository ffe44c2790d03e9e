pub mod calendar;
pub mod config;
pub mod error;
pub mod generator;
pub mod planner;
pub mod quality;
pub mod thread;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub use crate::calendar::{generate_calendar, CalendarBuilder, CalendarRequest};
pub use crate::config::CalendarConfig;
pub use crate::error::{CalendarError, GenerationError, Result};
pub use crate::generator::{CommentPrompt, ContentGenerator, PostDraft, PostPrompt};
pub use crate::planner::AssignmentPlanner;
pub use crate::quality::{QualityReport, QualityScorer};
pub use crate::thread::ThreadSynthesizer;

/// Length of one scheduling window in days.
pub const PERIOD_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub username: String,
    #[serde(alias = "info")]
    pub profile: String,
}

impl Persona {
    pub fn new(username: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            profile: profile.into(),
        }
    }
}

/// One planned post slot: where it goes and what it talks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub forum: String,
    pub topics: Vec<String>,
    pub ordinal: usize,
}

impl Assignment {
    pub fn primary_topic(&self) -> &str {
        self.topics.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "comment_id")]
    pub id: String,
    pub post_id: String,
    #[serde(alias = "parent_comment_id")]
    pub parent_id: Option<String>,
    #[serde(alias = "comment_text")]
    pub text: String,
    #[serde(alias = "username")]
    pub author: String,
    #[serde(alias = "timestamp", deserialize_with = "timestamp::deserialize")]
    pub posted_at: NaiveDateTime,
    pub delay_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(alias = "post_id")]
    pub id: String,
    #[serde(alias = "subreddit")]
    pub forum: String,
    pub title: String,
    pub body: String,
    #[serde(alias = "author_username")]
    pub author: String,
    #[serde(alias = "timestamp", deserialize_with = "timestamp::deserialize")]
    pub posted_at: NaiveDateTime,
    #[serde(alias = "keyword_ids")]
    pub topic_ids: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(
        id: String,
        forum: String,
        title: String,
        body: String,
        author: String,
        posted_at: NaiveDateTime,
        topic_ids: Vec<String>,
    ) -> Self {
        Self {
            id,
            forum,
            title,
            body,
            author,
            posted_at,
            topic_ids,
            comments: Vec::new(),
        }
    }

    /// Timestamp of the most recent event in the thread.
    pub fn last_event_at(&self) -> NaiveDateTime {
        self.comments
            .last()
            .map(|comment| comment.posted_at)
            .unwrap_or(self.posted_at)
    }

    /// Appends a comment, rejecting anything that would break thread ordering.
    pub fn push_comment(&mut self, comment: Comment) -> Result<()> {
        if comment.post_id != self.id {
            return Err(CalendarError::InvalidThread(format!(
                "comment {} belongs to post {}, not {}",
                comment.id, comment.post_id, self.id
            )));
        }
        if self.comments.iter().any(|existing| existing.id == comment.id) {
            return Err(CalendarError::InvalidThread(format!(
                "duplicate comment id {}",
                comment.id
            )));
        }
        if let Some(parent_id) = comment.parent_id.as_deref() {
            if !self.comments.iter().any(|existing| existing.id == parent_id) {
                return Err(CalendarError::InvalidThread(format!(
                    "comment {} replies to unknown comment {}",
                    comment.id, parent_id
                )));
            }
        }

        let previous = self.last_event_at();
        if comment.posted_at < previous {
            return Err(CalendarError::InvalidThread(format!(
                "comment {} is timestamped before the previous event",
                comment.id
            )));
        }
        let gap = (comment.posted_at - previous).num_minutes();
        if gap != i64::from(comment.delay_minutes) {
            return Err(CalendarError::InvalidThread(format!(
                "comment {} has delay {} but follows the previous event by {} minutes",
                comment.id, comment.delay_minutes, gap
            )));
        }

        self.comments.push(comment);
        Ok(())
    }

    /// Usernames of everyone who posted or commented, post author first.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.author.as_str())
            .chain(self.comments.iter().map(|comment| comment.author.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(alias = "week")]
    pub period_index: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub posts: Vec<Post>,
    #[serde(default, alias = "metrics")]
    pub quality: QualityReport,
}

impl Period {
    /// Date window for the given 1-based period index, counted from `today`.
    pub fn window(period_index: u32, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        if period_index == 0 {
            return Err(CalendarError::InvalidInput(
                "period index must be at least 1".to_string(),
            ));
        }
        let offset = PERIOD_DAYS * u64::from(period_index - 1);
        let start = today
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| CalendarError::InvalidInput("period start out of range".to_string()))?;
        let end = start
            .checked_add_days(Days::new(PERIOD_DAYS - 1))
            .ok_or_else(|| CalendarError::InvalidInput("period end out of range".to_string()))?;
        Ok((start, end))
    }

    pub fn used_topics(&self) -> BTreeSet<String> {
        self.posts
            .iter()
            .flat_map(|post| post.topic_ids.iter().cloned())
            .collect()
    }

    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|post| post.comments.len()).sum()
    }
}

pub(crate) fn ensure_unique_usernames(personas: &[Persona]) -> Result<()> {
    let mut seen = HashSet::new();
    for persona in personas {
        if persona.username.trim().is_empty() {
            return Err(CalendarError::InvalidInput(
                "persona username must not be empty".to_string(),
            ));
        }
        if !seen.insert(persona.username.as_str()) {
            return Err(CalendarError::InvalidInput(format!(
                "duplicate persona username: {}",
                persona.username
            )));
        }
    }
    Ok(())
}

/// Accepts ISO timestamps as well as the minute-precision `YYYY-MM-DD HH:MM`
/// form used by older calendar exports.
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer};

    const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        raw.parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(raw, MINUTE_FORMAT))
            .map_err(|err| de::Error::custom(format!("invalid timestamp {:?}: {}", raw, err)))
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
