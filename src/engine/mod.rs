//! Engine module housing the host-facing core.
//!
//! This module exposes the capture/decode/record/export ports (`backend`)
//! and the `EngineHandle` orchestration layer (`core`).

pub mod backend;
pub mod core;

pub use backend::{
    CameraFrame, ClipHandle, Exporter, PoseDetector, Recorder, SystemTimeSource, TimeSource,
    TrackGeometry, VideoSource,
};
pub use self::core::{EngineHandle, HighlightOutcome, HighlightRequest};
