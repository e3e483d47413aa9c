//! EngineHandle: host-facing orchestration for live sessions and highlights.
//!
//! The live side owns one `LiveLane` at a time and wires its trigger commands
//! through the broadcast manager to the recorder bridge. The offline side
//! (`core_highlight.rs`) runs scan → select → compose → export on demand and
//! shares no mutable state with the live side.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::broadcast;

use crate::analysis::{ClassifierSlot, LiveLane, PoseClassifier};
use crate::config::AppConfig;
use crate::engine::backend::{
    CameraFrame, PoseDetector, Recorder, SystemTimeSource, TimeSource,
};
use crate::error::{log_pose_error, PoseError};
use crate::managers::{BroadcastChannelManager, ClipEvent, RecorderManager};
use crate::trigger::TriggerCommand;

#[path = "core_highlight.rs"]
mod core_highlight;

pub use core_highlight::{HighlightOutcome, HighlightRequest};

/// EngineHandle orchestrates the live lane, the recorder bridge and the
/// offline highlight pipeline.
pub struct EngineHandle {
    config: Arc<RwLock<AppConfig>>,
    classifier: ClassifierSlot,
    pub(crate) broadcasts: BroadcastChannelManager,
    recorder: RecorderManager,
    lane: Mutex<Option<LiveLane>>,
    time_source: Arc<dyn TimeSource>,
}

impl EngineHandle {
    /// Create an EngineHandle with the config file (or defaults) and the
    /// system clock; frames must be stamped with [`EngineHandle::now`]
    pub fn new(recorder: Arc<dyn Recorder>) -> Self {
        Self::from_config(AppConfig::load(), recorder, Arc::new(SystemTimeSource::new()))
    }

    pub fn from_config(
        config: AppConfig,
        recorder: Arc<dyn Recorder>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            classifier: ClassifierSlot::empty(),
            broadcasts: BroadcastChannelManager::new(),
            recorder: RecorderManager::new(recorder),
            lane: Mutex::new(None),
            time_source,
        }
    }

    /// Session clock in seconds
    ///
    /// The post-end timer is polled against this clock, so hosts should
    /// stamp every `CameraFrame` with it.
    pub fn now(&self) -> f64 {
        self.time_source.now()
    }

    /// Current configuration
    pub fn config(&self) -> AppConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration; a running session keeps its old values
    pub fn update_config(&self, config: AppConfig) -> Result<(), PoseError> {
        let mut guard = self.config.write().map_err(|_| PoseError::LockPoisoned {
            component: "EngineHandle config".to_string(),
        })?;
        *guard = config;
        Ok(())
    }

    // ========================================================================
    // CLASSIFIER
    // ========================================================================

    /// Install a classifier; takes effect on the next frame, even mid-session
    pub fn load_classifier(&self, classifier: Arc<dyn PoseClassifier>) {
        self.classifier.load(classifier);
    }

    pub fn unload_classifier(&self) {
        self.classifier.unload();
    }

    pub fn is_classifier_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    // ========================================================================
    // LIVE SESSION
    // ========================================================================

    fn lock_lane(&self) -> Result<MutexGuard<'_, Option<LiveLane>>, PoseError> {
        self.lane.lock().map_err(|_| PoseError::LockPoisoned {
            component: "EngineHandle lane".to_string(),
        })
    }

    /// Start a live session
    ///
    /// Spawns the inference lane, attaches the recorder bridge and activates
    /// the trigger.
    ///
    /// # Errors
    /// - `LaneAlreadyRunning` if a session is active
    /// - `LockPoisoned` on lock failure
    pub fn start_session(&self, detector: Arc<dyn PoseDetector>) -> Result<(), PoseError> {
        let mut lane = self.lock_lane()?;
        if lane.is_some() {
            return Err(PoseError::LaneAlreadyRunning);
        }

        let commands_tx = self.broadcasts.init_trigger_commands();
        let events_tx = self.broadcasts.init_clip_events();
        self.recorder
            .start(commands_tx.subscribe(), Some(events_tx))
            .map_err(|err| {
                log_pose_error(&err, "start_session");
                err
            })?;

        let config = self.config();
        let session = LiveLane::spawn(
            &config,
            detector,
            self.classifier.clone(),
            Arc::clone(&self.time_source),
            commands_tx,
        );
        session.set_active(true)?;
        *lane = Some(session);

        tracing::info!("[EngineHandle] Live session started");
        Ok(())
    }

    /// Stop the live session
    ///
    /// A clip still recording is stopped, then the recorder bridge drains
    /// and exits.
    pub fn stop_session(&self) -> Result<(), PoseError> {
        let mut session = self.lock_lane()?.take().ok_or(PoseError::LaneStopped)?;

        session.stop()?;
        drop(session);
        self.broadcasts.close_trigger_commands();
        self.recorder.wait()?;

        tracing::info!("[EngineHandle] Live session stopped");
        Ok(())
    }

    /// Hand a captured frame to the live lane
    ///
    /// # Returns
    /// `false` if there is no session or the frame was dropped
    pub fn offer_frame(&self, frame: CameraFrame) -> bool {
        match self.lock_lane() {
            Ok(lane) => lane.as_ref().is_some_and(|lane| lane.offer(frame)),
            Err(_) => false,
        }
    }

    /// Pause or resume triggering without tearing the session down
    pub fn set_active(&self, active: bool) -> Result<(), PoseError> {
        self.lock_lane()?
            .as_ref()
            .ok_or(PoseError::LaneStopped)?
            .set_active(active)
    }

    pub fn is_session_running(&self) -> bool {
        self.lock_lane()
            .map(|lane| lane.as_ref().is_some_and(LiveLane::is_running))
            .unwrap_or(false)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Frames the current session has classified
    pub fn processed_frames(&self) -> u64 {
        self.lock_lane()
            .map(|lane| lane.as_ref().map_or(0, LiveLane::processed_frames))
            .unwrap_or(0)
    }

    /// Frames dropped by the current session
    pub fn dropped_frames(&self) -> u64 {
        self.lock_lane()
            .map(|lane| lane.as_ref().map_or(0, LiveLane::dropped_frames))
            .unwrap_or(0)
    }

    // ========================================================================
    // STREAM SUBSCRIPTIONS
    // ========================================================================

    /// Trigger commands of the current session, or None before the first
    /// session starts
    pub fn subscribe_trigger_commands(&self) -> Option<broadcast::Receiver<TriggerCommand>> {
        self.broadcasts.subscribe_trigger_commands()
    }

    pub fn subscribe_clip_events(&self) -> Option<broadcast::Receiver<ClipEvent>> {
        self.broadcasts.subscribe_clip_events()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if self.is_session_running() {
            if let Err(err) = self.stop_session() {
                log_pose_error(&err, "EngineHandle::drop");
            }
        }
    }
}
