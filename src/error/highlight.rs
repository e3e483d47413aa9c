// Highlight pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Highlight error code constants
///
/// Error code range: 2001-2007
pub struct HighlightErrorCodes {}

impl HighlightErrorCodes {
    /// Source could not be opened or measured
    pub const SOURCE_UNAVAILABLE: i32 = 2001;

    /// Sampling labels from a source failed part-way
    pub const DECODE_FAILED: i32 = 2002;

    /// Scan was cancelled cooperatively
    pub const CANCELLED: i32 = 2003;

    /// No candidate fit the selection budget
    pub const NOTHING_SELECTED: i32 = 2004;

    /// External exporter rejected the render plan
    pub const EXPORT_FAILED: i32 = 2005;

    /// Composer was handed no clips
    pub const EMPTY_TIMELINE: i32 = 2006;

    /// Budget values are unusable
    pub const INVALID_BUDGET: i32 = 2007;
}

/// Log a highlight error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_highlight_error(err: &HighlightError, context: &str) {
    error!(
        "Highlight error in {}: code={}, component=HighlightPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Offline scanning, selection, composition and export errors
///
/// Error code range: 2001-2007
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightError {
    /// Source could not be opened or measured
    SourceUnavailable { source_ref: String, reason: String },

    /// Label sampling failed for a source
    DecodeFailed { source_ref: String, reason: String },

    /// Scan cancelled; partial results were discarded
    Cancelled,

    /// Budget admitted none of the candidates
    NothingSelected { candidates: usize },

    /// Exporter failed to render the plan
    ExportFailed { reason: String },

    /// Composer received an empty clip list
    EmptyTimeline,

    /// Budget is unusable (zero count or non-positive duration)
    InvalidBudget { reason: String },
}

impl ErrorCode for HighlightError {
    fn code(&self) -> i32 {
        match self {
            HighlightError::SourceUnavailable { .. } => HighlightErrorCodes::SOURCE_UNAVAILABLE,
            HighlightError::DecodeFailed { .. } => HighlightErrorCodes::DECODE_FAILED,
            HighlightError::Cancelled => HighlightErrorCodes::CANCELLED,
            HighlightError::NothingSelected { .. } => HighlightErrorCodes::NOTHING_SELECTED,
            HighlightError::ExportFailed { .. } => HighlightErrorCodes::EXPORT_FAILED,
            HighlightError::EmptyTimeline => HighlightErrorCodes::EMPTY_TIMELINE,
            HighlightError::InvalidBudget { .. } => HighlightErrorCodes::INVALID_BUDGET,
        }
    }

    fn message(&self) -> String {
        match self {
            HighlightError::SourceUnavailable { source_ref, reason } => {
                format!("Source {} unavailable: {}", source_ref, reason)
            }
            HighlightError::DecodeFailed { source_ref, reason } => {
                format!("Failed to sample labels from {}: {}", source_ref, reason)
            }
            HighlightError::Cancelled => "Scan cancelled".to_string(),
            HighlightError::NothingSelected { candidates } => {
                format!(
                    "Nothing selected: none of {} candidates fit the budget",
                    candidates
                )
            }
            HighlightError::ExportFailed { reason } => format!("Export failed: {}", reason),
            HighlightError::EmptyTimeline => "Cannot compose an empty timeline".to_string(),
            HighlightError::InvalidBudget { reason } => format!("Invalid budget: {}", reason),
        }
    }
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HighlightError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for HighlightError {}
