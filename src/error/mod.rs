// Error types for the swing highlight core
//
// This module defines error families for the live pose pipeline and the
// offline highlight pipeline, each carrying a stable numeric code so hosts
// can branch on failures without string matching.

mod highlight;
mod pose;

pub use highlight::{log_highlight_error, HighlightError, HighlightErrorCodes};
pub use pose::{log_pose_error, PoseError, PoseErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the host boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
