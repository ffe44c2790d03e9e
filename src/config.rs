use rand::Rng;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{CalendarError, Result};
use crate::quality::QualityConfig;

/// Inclusive integer range used for hours, counts and delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: u32,
    pub max: u32,
}

impl Span {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(CalendarError::Config(format!(
                "{name}: min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Chance that a topic used in the previous period is dropped from the pool.
    pub topic_prune_probability: f64,
    pub forum_cap: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            topic_prune_probability: 0.7,
            forum_cap: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    pub day_offsets: Vec<u32>,
    pub posting_hours: Span,
    pub commenters: Span,
    pub first_delay_minutes: Span,
    pub reply_delay_minutes: Span,
    pub product_mention_probability: f64,
    pub reply_probability: f64,
    /// Chance that a reply becomes the parent for later replies.
    pub nest_probability: f64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            day_offsets: vec![0, 2, 4, 6, 1, 3, 5],
            posting_hours: Span::new(9, 18),
            commenters: Span::new(2, 4),
            first_delay_minutes: Span::new(15, 90),
            reply_delay_minutes: Span::new(10, 120),
            product_mention_probability: 0.6,
            reply_probability: 0.7,
            nest_probability: 0.5,
        }
    }
}

impl ThreadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.day_offsets.is_empty() {
            return Err(CalendarError::Config(
                "thread.day_offsets must not be empty".to_string(),
            ));
        }
        if let Some(offset) = self.day_offsets.iter().find(|offset| **offset >= 7) {
            return Err(CalendarError::Config(format!(
                "thread.day_offsets: {offset} falls outside the 7-day window"
            )));
        }
        self.posting_hours.check("thread.posting_hours")?;
        if self.posting_hours.max > 23 {
            return Err(CalendarError::Config(
                "thread.posting_hours.max must be at most 23".to_string(),
            ));
        }
        self.commenters.check("thread.commenters")?;
        if self.commenters.min == 0 {
            return Err(CalendarError::Config(
                "thread.commenters.min must be at least 1".to_string(),
            ));
        }
        self.first_delay_minutes.check("thread.first_delay_minutes")?;
        self.reply_delay_minutes.check("thread.reply_delay_minutes")?;
        check_probability("thread.product_mention_probability", self.product_mention_probability)?;
        check_probability("thread.reply_probability", self.reply_probability)?;
        check_probability("thread.nest_probability", self.nest_probability)?;

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub planner: PlannerConfig,
    pub thread: ThreadConfig,
    pub quality: QualityConfig,
}

impl CalendarConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| CalendarError::Config(format!("failed to read config: {}", err)))?;
                Self::from_toml(&contents)?
            } else {
                CalendarConfig::default()
            }
        } else {
            CalendarConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|err| CalendarError::Config(format!("failed to parse config: {}", err)))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| CalendarError::Config(format!("failed to create config dir: {}", err)))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| CalendarError::Config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload)
            .map_err(|err| CalendarError::Config(format!("failed to write config: {}", err)))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_probability("planner.topic_prune_probability", self.planner.topic_prune_probability)?;
        if self.planner.forum_cap == 0 {
            return Err(CalendarError::Config(
                "planner.forum_cap must be at least 1".to_string(),
            ));
        }

        self.thread.validate()?;
        self.quality.validate()
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("PLANNER_TOPIC_PRUNE_PROBABILITY") {
            if let Ok(value) = value.parse::<f64>() {
                self.planner.topic_prune_probability = value;
            }
        }
        if let Ok(value) = env::var("PLANNER_FORUM_CAP") {
            if let Ok(value) = value.parse::<usize>() {
                self.planner.forum_cap = value;
            }
        }
        if let Ok(value) = env::var("THREAD_PRODUCT_MENTION_PROBABILITY") {
            if let Ok(value) = value.parse::<f64>() {
                self.thread.product_mention_probability = value;
            }
        }
        if let Ok(value) = env::var("THREAD_REPLY_PROBABILITY") {
            if let Ok(value) = value.parse::<f64>() {
                self.thread.reply_probability = value;
            }
        }
    }
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CalendarError::Config(format!(
            "{name} must be within 0..=1, got {value}"
        )));
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    env::var("CALENDAR_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/calendar.toml")))
}
