// Pose pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Pose error code constants
///
/// Single source of truth for the numeric codes reported to the host.
///
/// Error code range: 1001-1006
pub struct PoseErrorCodes {}

impl PoseErrorCodes {
    /// No classifier is loaded; frames degrade to `Other`
    pub const CLASSIFIER_UNAVAILABLE: i32 = 1001;

    /// Frame produced no usable keypoints
    pub const SENSOR_GAP: i32 = 1002;

    /// Live lane is not running
    pub const LANE_STOPPED: i32 = 1003;

    /// Live lane was started twice
    pub const LANE_ALREADY_RUNNING: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;

    /// Recorder port failed to start or stop a clip
    pub const RECORDER_FAILED: i32 = 1006;
}

/// Log a pose error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_pose_error(err: &PoseError, context: &str) {
    error!(
        "Pose error in {}: code={}, component=LiveLane, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Live pose pipeline errors
///
/// Sensor gaps and a missing classifier are recoverable and normally handled
/// inside the lane; they exist as variants so telemetry can report them.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseError {
    /// No classifier loaded
    ClassifierUnavailable,

    /// Detector returned no keypoints for a frame
    SensorGap { timestamp: f64 },

    /// Lane is not running
    LaneStopped,

    /// Lane is already running
    LaneAlreadyRunning,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Recorder start/stop failed
    RecorderFailed { reason: String },
}

impl ErrorCode for PoseError {
    fn code(&self) -> i32 {
        match self {
            PoseError::ClassifierUnavailable => PoseErrorCodes::CLASSIFIER_UNAVAILABLE,
            PoseError::SensorGap { .. } => PoseErrorCodes::SENSOR_GAP,
            PoseError::LaneStopped => PoseErrorCodes::LANE_STOPPED,
            PoseError::LaneAlreadyRunning => PoseErrorCodes::LANE_ALREADY_RUNNING,
            PoseError::LockPoisoned { .. } => PoseErrorCodes::LOCK_POISONED,
            PoseError::RecorderFailed { .. } => PoseErrorCodes::RECORDER_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            PoseError::ClassifierUnavailable => {
                "Pose classifier not loaded; frames are labelled Other".to_string()
            }
            PoseError::SensorGap { timestamp } => {
                format!("No usable keypoints at {:.3}s", timestamp)
            }
            PoseError::LaneStopped => "Live lane not running. Call start() first.".to_string(),
            PoseError::LaneAlreadyRunning => {
                "Live lane already running. Call stop() first.".to_string()
            }
            PoseError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            PoseError::RecorderFailed { reason } => format!("Recorder failed: {}", reason),
        }
    }
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoseError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PoseError {}
