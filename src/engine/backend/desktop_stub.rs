use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::analysis::{ClassifiedFrame, PoseLabel};
use crate::compose::RenderPlan;
use crate::error::{HighlightError, PoseError};
use crate::pose::PoseKeypoints;

use super::{
    CameraFrame, ClipHandle, Exporter, PoseDetector, Recorder, TimeSource, TrackGeometry,
    VideoSource,
};

/// Detector replaying a fixed script of poses, one per call.
///
/// Once the script is exhausted it keeps returning the `repeat` pose (or a
/// sensor gap when none is set). An optional delay simulates slow inference.
pub struct ScriptedPoseDetector {
    script: Mutex<VecDeque<Option<PoseKeypoints>>>,
    repeat: Option<PoseKeypoints>,
    delay: Option<Duration>,
}

impl ScriptedPoseDetector {
    pub fn new(script: Vec<Option<PoseKeypoints>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            delay: None,
        }
    }

    /// Detector that returns the same pose for every frame
    pub fn repeating(pose: PoseKeypoints) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(pose),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl PoseDetector for ScriptedPoseDetector {
    fn detect(&self, _frame: &CameraFrame) -> Option<PoseKeypoints> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let scripted = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => return None,
        };

        match scripted {
            Some(pose) => pose,
            None => self.repeat.clone(),
        }
    }
}

/// One scripted recording
#[derive(Debug, Clone)]
pub struct ScriptedVideo {
    pub duration: f64,
    pub frames: Vec<ClassifiedFrame>,
    pub geometry: TrackGeometry,
    /// When set, label sampling fails with this reason
    pub failure: Option<String>,
}

impl ScriptedVideo {
    /// Labels sampled every `interval` seconds from t=0, confidence 0.9
    pub fn from_labels(labels: &[PoseLabel], interval: f64, duration: f64) -> Self {
        let frames = labels
            .iter()
            .enumerate()
            .map(|(i, label)| ClassifiedFrame::new(i as f64 * interval, *label, 0.9))
            .collect();
        Self::from_frames(frames, duration)
    }

    pub fn from_frames(frames: Vec<ClassifiedFrame>, duration: f64) -> Self {
        Self {
            duration,
            frames,
            geometry: TrackGeometry::upright(1920.0, 1080.0),
            failure: None,
        }
    }

    pub fn with_geometry(mut self, geometry: TrackGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

/// In-memory video source keyed by source reference
#[derive(Default)]
pub struct ScriptedVideoSource {
    videos: HashMap<String, ScriptedVideo>,
    sample_calls: AtomicUsize,
}

impl ScriptedVideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, source_ref: impl Into<String>, video: ScriptedVideo) -> Self {
        self.videos.insert(source_ref.into(), video);
        self
    }

    /// Number of label sampling passes served so far
    pub fn sample_calls(&self) -> usize {
        self.sample_calls.load(Ordering::SeqCst)
    }

    fn video(&self, source_ref: &str) -> Result<&ScriptedVideo, HighlightError> {
        self.videos
            .get(source_ref)
            .ok_or_else(|| HighlightError::SourceUnavailable {
                source_ref: source_ref.to_string(),
                reason: "no such scripted video".to_string(),
            })
    }
}

impl VideoSource for ScriptedVideoSource {
    fn duration(&self, source_ref: &str) -> Result<f64, HighlightError> {
        Ok(self.video(source_ref)?.duration)
    }

    fn sample_labels_at(
        &self,
        source_ref: &str,
        _interval: f64,
    ) -> Result<Vec<ClassifiedFrame>, HighlightError> {
        let video = self.video(source_ref)?;
        self.sample_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &video.failure {
            return Err(HighlightError::DecodeFailed {
                source_ref: source_ref.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(video.frames.clone())
    }

    fn track_geometry(&self, source_ref: &str) -> Result<TrackGeometry, HighlightError> {
        Ok(self.video(source_ref)?.geometry)
    }
}

/// Recorder lifecycle event captured by [MemoryRecorder]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderEvent {
    Started(ClipHandle),
    Stopped(ClipHandle),
}

/// Recorder that only remembers what it was asked to do
#[derive(Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<RecorderEvent>>,
    fail_start: AtomicBool,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `start` calls fail
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<RecorderEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: RecorderEvent) -> Result<(), PoseError> {
        self.events
            .lock()
            .map_err(|_| PoseError::LockPoisoned {
                component: "MemoryRecorder".to_string(),
            })?
            .push(event);
        Ok(())
    }
}

impl Recorder for MemoryRecorder {
    fn start(&self) -> Result<ClipHandle, PoseError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(PoseError::RecorderFailed {
                reason: "scripted start failure".to_string(),
            });
        }
        let handle = ClipHandle::new();
        self.push(RecorderEvent::Started(handle))?;
        Ok(handle)
    }

    fn stop(&self, handle: ClipHandle) -> Result<(), PoseError> {
        self.push(RecorderEvent::Stopped(handle))
    }
}

/// Exporter that keeps every plan it receives
#[derive(Default)]
pub struct MemoryExporter {
    plans: Mutex<Vec<RenderPlan>>,
    failure: Option<String>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    pub fn plans(&self) -> Vec<RenderPlan> {
        self.plans
            .lock()
            .map(|plans| plans.clone())
            .unwrap_or_default()
    }
}

impl Exporter for MemoryExporter {
    fn render(&self, plan: &RenderPlan) -> Result<String, HighlightError> {
        if let Some(reason) = &self.failure {
            return Err(HighlightError::ExportFailed {
                reason: reason.clone(),
            });
        }

        let mut plans = self.plans.lock().map_err(|_| HighlightError::ExportFailed {
            reason: "exporter state poisoned".to_string(),
        })?;
        plans.push(plan.clone());
        Ok(format!("memory://highlight-{}", plans.len()))
    }
}

/// Hand-driven clock for deterministic lane tests.
pub struct ManualTimeSource {
    bits: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, now: f64) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        let now = self.now() + seconds;
        self.set(now);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_detector_replays_then_repeats() {
        let detector = ScriptedPoseDetector::new(vec![None, Some(PoseKeypoints::new())]);
        assert!(detector.detect(&CameraFrame::at(0.0)).is_none());
        assert!(detector.detect(&CameraFrame::at(0.1)).is_some());
        assert!(detector.detect(&CameraFrame::at(0.2)).is_none());
    }

    #[test]
    fn scripted_source_filters_between() {
        let video = ScriptedVideo::from_labels(&[PoseLabel::Other; 10], 0.5, 5.0);
        let source = ScriptedVideoSource::new().with_video("a", video);

        let frames = source.sample_labels_between("a", 1.0, 2.0, 0.5).unwrap();
        let times: Vec<f64> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(times, vec![1.0, 1.5]);
        assert_eq!(source.sample_calls(), 1);
    }

    #[test]
    fn scripted_source_reports_missing_and_failing() {
        let source = ScriptedVideoSource::new()
            .with_video("bad", ScriptedVideo::from_labels(&[], 0.2, 4.0).failing("corrupt"));

        assert!(matches!(
            source.duration("missing"),
            Err(HighlightError::SourceUnavailable { .. })
        ));
        assert!(matches!(
            source.sample_labels_at("bad", 0.2),
            Err(HighlightError::DecodeFailed { .. })
        ));
    }

    #[test]
    fn memory_recorder_tracks_lifecycle() {
        let recorder = MemoryRecorder::new();
        let handle = recorder.start().unwrap();
        recorder.stop(handle).unwrap();
        assert_eq!(
            recorder.events(),
            vec![RecorderEvent::Started(handle), RecorderEvent::Stopped(handle)]
        );

        recorder.set_fail_start(true);
        assert!(recorder.start().is_err());
    }

    #[test]
    fn manual_time_source_advances() {
        let time = ManualTimeSource::new(1.5);
        time.advance(0.25);
        assert_eq!(time.now(), 1.75);
    }
}
