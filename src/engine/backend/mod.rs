//! Ports through which the core reaches capture, decode, recording and export.
//!
//! None of these are implemented here for real devices; hosts supply them.
//! `desktop_stub` carries scripted implementations for tests and the fixture
//! harness.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::ClassifiedFrame;
pub use crate::compose::TrackGeometry;
use crate::compose::RenderPlan;
use crate::error::{HighlightError, PoseError};
use crate::pose::PoseKeypoints;

/// One captured camera frame handed to the live lane
#[derive(Debug, Clone, Default)]
pub struct CameraFrame {
    /// Capture time in seconds on the session clock
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CameraFrame {
    /// Frame with no pixel payload, for detectors that ignore it
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }
}

/// Keypoint detector
///
/// Returns `None` when the frame holds no usable pose (sensor gap).
pub trait PoseDetector: Send + Sync {
    fn detect(&self, frame: &CameraFrame) -> Option<PoseKeypoints>;
}

/// Recorded video, scanned offline
///
/// Implementations decode and classify frames themselves; the core only
/// sees the resulting label stream.
pub trait VideoSource: Send + Sync {
    /// Total duration in seconds
    fn duration(&self, source_ref: &str) -> Result<f64, HighlightError>;

    /// Classified frames sampled every `interval` seconds, in time order
    fn sample_labels_at(
        &self,
        source_ref: &str,
        interval: f64,
    ) -> Result<Vec<ClassifiedFrame>, HighlightError>;

    /// Classified frames in `[start, end)`
    ///
    /// Used to score fallback clips. The default re-samples the whole source
    /// and filters; implementations that can seek should override it.
    fn sample_labels_between(
        &self,
        source_ref: &str,
        start: f64,
        end: f64,
        interval: f64,
    ) -> Result<Vec<ClassifiedFrame>, HighlightError> {
        let frames = self.sample_labels_at(source_ref, interval)?;
        Ok(frames
            .into_iter()
            .filter(|f| f.timestamp >= start && f.timestamp < end)
            .collect())
    }

    /// Natural size and orientation of the video track
    fn track_geometry(&self, source_ref: &str) -> Result<TrackGeometry, HighlightError>;
}

/// Handle to a clip being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipHandle(pub Uuid);

impl ClipHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Live capture side effects driven by trigger commands
pub trait Recorder: Send + Sync {
    fn start(&self) -> Result<ClipHandle, PoseError>;
    fn stop(&self, handle: ClipHandle) -> Result<(), PoseError>;
}

/// Renders a finished plan to an output file
pub trait Exporter: Send + Sync {
    /// # Returns
    /// Output reference (path or URI) chosen by the exporter
    fn render(&self, plan: &RenderPlan) -> Result<String, HighlightError>;
}

/// Monotonic clock in seconds, shared with capture timestamps
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Default time source: seconds since construction
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

mod desktop_stub;
pub use desktop_stub::{
    ManualTimeSource, MemoryExporter, MemoryRecorder, RecorderEvent, ScriptedPoseDetector,
    ScriptedVideo, ScriptedVideoSource,
};
