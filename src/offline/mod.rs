// Offline module - swing sequence extraction from recorded video
//
// Each recording is scanned by one sequential worker; several recordings
// may be scanned in parallel because they share no mutable state.
//
// Module organization:
// - extractor: label stream → swing sequences → padded highlight clips
// - pool: parallel scan over many recordings with shared cancellation

mod extractor;
mod pool;

pub use extractor::{RecordingScan, SequenceExtractor};
pub use pool::{scan_sources, ScanReport, SkippedSource};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounded interval judged to contain one swing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingSequence {
    pub start_time: f64,
    pub end_time: f64,
    pub quality_score: f32,
}

impl SwingSequence {
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// A recording to scan, plus the metadata its clips inherit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecording {
    pub source_ref: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl SourceRecording {
    pub fn new(source_ref: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            course: None,
            date: None,
        }
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Cooperative cancellation shared by scan workers
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
