// LiveLane - serialized inference lane for live capture
//
// The capture thread offers frames through a one-slot lock-free ring. While
// a frame is queued or being processed the lane is busy and further offers
// are dropped rather than buffered, so the lane never builds a backlog.
//
// Frame flow:
// 1. Capture thread calls offer(); busy flag set, frame pushed to FRAME_SLOT
// 2. Worker pops the frame, runs detect → extract → classify → trigger
// 3. Worker publishes TriggerCommands on the broadcast channel, clears busy
// 4. Between frames the worker polls the post-end timer against TimeSource
//
// The worker is the only writer of LiveTrigger. Activation requests travel
// through a separate control ring so they are applied on the same thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rtrb::{Consumer, PopError, Producer, PushError, RingBuffer};
use tokio::sync::broadcast;

use crate::analysis::{ClassifiedFrame, ClassifierSlot};
use crate::config::AppConfig;
use crate::engine::backend::{CameraFrame, PoseDetector, TimeSource};
use crate::error::{log_pose_error, PoseError};
use crate::pose::{FeatureExtractor, PoseKeypoints};
use crate::telemetry::{self, DiagnosticError};
use crate::trigger::{LiveTrigger, TriggerCommand};

/// Frames in flight at most; a second frame is dropped
const FRAME_SLOT_CAPACITY: usize = 1;
const CONTROL_CAPACITY: usize = 16;
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
enum LaneControl {
    SetActive { active: bool, timestamp: f64 },
}

/// Synchronous detect → extract → classify → trigger pipeline
///
/// The lane worker owns one of these; tests and the fixture harness drive it
/// directly without a thread.
pub struct LanePipeline {
    detector: Arc<dyn PoseDetector>,
    extractor: FeatureExtractor,
    classifier: ClassifierSlot,
    trigger: LiveTrigger,
}

impl LanePipeline {
    pub fn new(
        config: &AppConfig,
        detector: Arc<dyn PoseDetector>,
        classifier: ClassifierSlot,
    ) -> Self {
        Self {
            detector,
            extractor: FeatureExtractor::from_config(&config.features),
            classifier,
            trigger: LiveTrigger::new(config.trigger.clone()),
        }
    }

    pub fn trigger(&self) -> &LiveTrigger {
        &self.trigger
    }

    /// Detect, extract and classify one frame
    ///
    /// A sensor gap classifies the all-zero vector, which any classifier
    /// must accept.
    pub fn classify_frame(&self, frame: &CameraFrame) -> ClassifiedFrame {
        let keypoints = match self.detector.detect(frame) {
            Some(keypoints) => keypoints,
            None => {
                let gap = PoseError::SensorGap {
                    timestamp: frame.timestamp,
                };
                tracing::trace!("[LiveLane] {}", gap);
                telemetry::hub().record_error(DiagnosticError::SensorGap, gap.to_string());
                PoseKeypoints::new()
            }
        };

        let features = self.extractor.extract(&keypoints);
        let (label, confidence) = self.classifier.classify(&features);
        ClassifiedFrame::new(frame.timestamp, label, confidence)
    }

    /// Run one frame through the whole pipeline
    pub fn process(&mut self, frame: &CameraFrame) -> Vec<TriggerCommand> {
        let classified = self.classify_frame(frame);
        telemetry::hub().record_classification(&classified);
        self.trigger.on_label(classified.timestamp, classified.label)
    }

    pub fn set_active(&mut self, active: bool, timestamp: f64) -> Vec<TriggerCommand> {
        self.trigger.set_active(active, timestamp)
    }

    pub fn poll_timer(&mut self, now: f64) -> Vec<TriggerCommand> {
        self.trigger.poll_timer(now)
    }
}

struct LaneWorker {
    frame_rx: Consumer<CameraFrame>,
    control_rx: Consumer<LaneControl>,
    pipeline: LanePipeline,
    time: Arc<dyn TimeSource>,
    commands_tx: broadcast::Sender<TriggerCommand>,
    busy: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
}

impl LaneWorker {
    fn publish(&self, commands: Vec<TriggerCommand>) {
        for command in commands {
            match command {
                TriggerCommand::PhaseChanged {
                    from,
                    to,
                    timestamp,
                } => telemetry::hub().record_phase_change(from, to, timestamp),
                TriggerCommand::StartClip { timestamp } => {
                    tracing::info!("[LiveLane] Start clip at {:.3}s", timestamp)
                }
                TriggerCommand::StopClip { timestamp } => {
                    tracing::info!("[LiveLane] Stop clip at {:.3}s", timestamp)
                }
            }
            // No subscribers is not an error; commands are fire-and-forget
            let _ = self.commands_tx.send(command);
        }
    }

    fn drain_control(&mut self) {
        while let Ok(control) = self.control_rx.pop() {
            let commands = match control {
                LaneControl::SetActive { active, timestamp } => {
                    self.pipeline.set_active(active, timestamp)
                }
            };
            self.publish(commands);
        }
    }

    fn run(mut self) {
        tracing::info!("[LiveLane] Starting inference loop");

        loop {
            self.drain_control();

            match self.frame_rx.pop() {
                Ok(frame) => {
                    let started = Instant::now();
                    let commands = self.pipeline.process(&frame);
                    telemetry::hub()
                        .record_inference_latency(started.elapsed().as_secs_f32() * 1000.0);
                    self.publish(commands);

                    self.busy.store(false, Ordering::Release);
                    self.processed.fetch_add(1, Ordering::Release);
                }
                Err(PopError::Empty) => {
                    if !self.running.load(Ordering::SeqCst) {
                        // Pick up a deactivation queued just before shutdown
                        self.drain_control();
                        tracing::info!("[LiveLane] Shutdown flag set and slot empty, exiting");
                        break;
                    }

                    let commands = self.pipeline.poll_timer(self.time.now());
                    self.publish(commands);

                    // Small sleep to avoid busy loop when empty
                    thread::sleep(IDLE_SLEEP);
                }
            }
        }
    }
}

/// Handle to the running live inference lane
pub struct LiveLane {
    frame_tx: Mutex<Producer<CameraFrame>>,
    control_tx: Mutex<Producer<LaneControl>>,
    time: Arc<dyn TimeSource>,
    busy: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    dropped: AtomicU64,
    handle: Option<JoinHandle<()>>,
}

impl LiveLane {
    /// Spawn the worker thread
    ///
    /// # Arguments
    /// * `config` - Feature and trigger parameters
    /// * `detector` - Keypoint detector port
    /// * `classifier` - Shared classifier slot; may be empty
    /// * `time` - Clock used to fire the post-end timer between frames
    /// * `commands_tx` - Channel receiving every TriggerCommand
    pub fn spawn(
        config: &AppConfig,
        detector: Arc<dyn PoseDetector>,
        classifier: ClassifierSlot,
        time: Arc<dyn TimeSource>,
        commands_tx: broadcast::Sender<TriggerCommand>,
    ) -> Self {
        let (frame_tx, frame_rx) = RingBuffer::new(FRAME_SLOT_CAPACITY);
        let (control_tx, control_rx) = RingBuffer::new(CONTROL_CAPACITY);
        let busy = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));
        let processed = Arc::new(AtomicU64::new(0));

        let worker = LaneWorker {
            frame_rx,
            control_rx,
            pipeline: LanePipeline::new(config, detector, classifier),
            time: Arc::clone(&time),
            commands_tx,
            busy: Arc::clone(&busy),
            running: Arc::clone(&running),
            processed: Arc::clone(&processed),
        };

        let handle = thread::spawn(move || worker.run());

        Self {
            frame_tx: Mutex::new(frame_tx),
            control_tx: Mutex::new(control_tx),
            time,
            busy,
            running,
            processed,
            dropped: AtomicU64::new(0),
            handle: Some(handle),
        }
    }

    /// Offer a captured frame to the lane
    ///
    /// # Returns
    /// `true` if the frame was accepted, `false` if it was dropped because
    /// the previous frame is still in flight or the lane is stopped.
    pub fn offer(&self, frame: CameraFrame) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }

        let timestamp = frame.timestamp;
        if self.busy.swap(true, Ordering::AcqRel) {
            self.record_drop(timestamp);
            return false;
        }

        let pushed = match self.frame_tx.lock() {
            Ok(mut tx) => tx.push(frame).is_ok(),
            Err(_) => false,
        };

        if !pushed {
            self.busy.store(false, Ordering::Release);
            self.record_drop(timestamp);
        }
        pushed
    }

    /// Activate or deactivate the trigger session
    ///
    /// Applied on the lane thread; timestamped with the lane's time source.
    pub fn set_active(&self, active: bool) -> Result<(), PoseError> {
        self.send_control(LaneControl::SetActive {
            active,
            timestamp: self.time.now(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Whether a frame is currently queued or being processed
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Deactivate the session and join the worker
    ///
    /// A clip still recording is stopped before the worker exits.
    pub fn stop(&mut self) -> Result<(), PoseError> {
        let handle = self.handle.take().ok_or(PoseError::LaneStopped)?;

        if let Err(err) = self.send_control(LaneControl::SetActive {
            active: false,
            timestamp: self.time.now(),
        }) {
            log_pose_error(&err, "LiveLane::stop");
        }
        self.running.store(false, Ordering::SeqCst);

        if handle.join().is_err() {
            tracing::error!("[LiveLane] Worker thread panicked");
        }
        tracing::info!(
            "[LiveLane] Stopped after {} frames ({} dropped)",
            self.processed_frames(),
            self.dropped_frames()
        );
        Ok(())
    }

    fn send_control(&self, mut control: LaneControl) -> Result<(), PoseError> {
        let mut tx = self
            .control_tx
            .lock()
            .map_err(|_| PoseError::LockPoisoned {
                component: "LiveLane control".to_string(),
            })?;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Err(PoseError::LaneStopped);
            }
            match tx.push(control) {
                Ok(()) => return Ok(()),
                Err(PushError::Full(rejected)) => {
                    control = rejected;
                    thread::sleep(IDLE_SLEEP);
                }
            }
        }
    }

    fn record_drop(&self, timestamp: f64) {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            "[LiveLane] Dropping frame at {:.3}s, lane busy ({} dropped)",
            timestamp,
            total
        );
        telemetry::hub().record_frame_dropped(total);
        if total == 1 {
            telemetry::hub().record_error(
                DiagnosticError::StreamBackpressure,
                "live lane dropped its first frame",
            );
        }
    }
}

impl Drop for LiveLane {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
#[path = "lane_tests.rs"]
mod tests;
