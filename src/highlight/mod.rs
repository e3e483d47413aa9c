// Highlight module - candidate clips and the selection budget
//
// Candidates come from the offline scan (padded swing sequences or uniform
// fallback segments). The selector picks the best subset that fits a
// count/duration budget and hands it back in chronological order.

mod selector;

pub use selector::HighlightSelector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::HighlightConfig;
use crate::error::HighlightError;

/// Scored excerpt of a source video
///
/// Never mutated after creation; only selected or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightClip {
    pub id: Uuid,
    pub source_ref: String,
    pub start_time: f64,
    pub end_time: f64,
    pub quality_score: f32,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl HighlightClip {
    /// Create a clip; `end_time` is clamped so duration is never negative
    pub fn new(
        source_ref: impl Into<String>,
        start_time: f64,
        end_time: f64,
        quality_score: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_ref: source_ref.into(),
            start_time,
            end_time: end_time.max(start_time),
            quality_score,
            course: None,
            date: None,
        }
    }

    pub fn with_course(mut self, course: Option<String>) -> Self {
        self.course = course;
        self
    }

    pub fn with_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.date = date;
        self
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// Host hint for how long the reel should feel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationIntent {
    Short,
    #[default]
    Standard,
    Long,
}

impl DurationIntent {
    pub fn max_clips(self) -> usize {
        match self {
            DurationIntent::Short => 6,
            DurationIntent::Standard => 12,
            DurationIntent::Long => 18,
        }
    }
}

/// Count and duration limits for one selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionBudget {
    pub max_clips: usize,
    /// Seconds
    pub max_total_duration: f64,
}

impl SelectionBudget {
    pub fn new(max_clips: usize, max_total_duration: f64) -> Self {
        Self {
            max_clips,
            max_total_duration,
        }
    }

    pub fn from_config(config: &HighlightConfig) -> Self {
        Self::new(config.max_clips, config.max_total_duration_s)
    }

    /// Narrow or widen the clip count per the host's intent
    pub fn with_intent(self, intent: DurationIntent) -> Self {
        Self {
            max_clips: intent.max_clips(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), HighlightError> {
        if self.max_clips == 0 {
            return Err(HighlightError::InvalidBudget {
                reason: "max_clips must be at least 1".to_string(),
            });
        }
        if !self.max_total_duration.is_finite() || self.max_total_duration <= 0.0 {
            return Err(HighlightError::InvalidBudget {
                reason: format!(
                    "max_total_duration must be positive, got {}",
                    self.max_total_duration
                ),
            });
        }
        Ok(())
    }
}

impl Default for SelectionBudget {
    fn default() -> Self {
        Self::from_config(&HighlightConfig::default())
    }
}

/// Course filter applied before selection
///
/// An empty filter admits every clip, including clips with no course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseFilter {
    pub courses: Vec<String>,
}

impl CourseFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn only<I, S>(courses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            courses: courses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, clip: &HighlightClip) -> bool {
        if self.courses.is_empty() {
            return true;
        }
        match &clip.course {
            Some(course) => self
                .courses
                .iter()
                .any(|wanted| wanted.trim().eq_ignore_ascii_case(course.trim())),
            None => false,
        }
    }

    pub fn apply(&self, clips: Vec<HighlightClip>) -> Vec<HighlightClip> {
        clips.into_iter().filter(|clip| self.matches(clip)).collect()
    }
}
