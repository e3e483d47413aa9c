// RecorderManager: Bridges trigger commands to the Recorder port
//
// Single Responsibility: Recorder start/stop and the active clip handle
//
// Runs on its own thread with a current-thread tokio runtime so the live
// lane never waits on recorder I/O. The bridge ends when every sender of
// the command channel is gone; a clip still open at that point is stopped.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tokio::runtime::Builder;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::engine::backend::{ClipHandle, Recorder};
use crate::error::{log_pose_error, ErrorCode, PoseError};
use crate::telemetry::{self, DiagnosticError};
use crate::trigger::TriggerCommand;

/// What the recorder bridge did with a trigger command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClipEvent {
    Started { handle: ClipHandle, timestamp: f64 },
    Stopped { handle: ClipHandle, timestamp: f64 },
    Failed { code: i32, message: String },
}

/// Shared state the bridge thread works on
#[derive(Clone)]
struct Bridge {
    recorder: Arc<dyn Recorder>,
    active: Arc<Mutex<Option<ClipHandle>>>,
    events_tx: Option<broadcast::Sender<ClipEvent>>,
}

impl Bridge {
    fn emit(&self, event: ClipEvent) {
        if let Some(tx) = &self.events_tx {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }

    fn fail(&self, err: PoseError, context: &str) {
        log_pose_error(&err, context);
        telemetry::hub().record_error(DiagnosticError::RecorderFailed, context);
        self.emit(ClipEvent::Failed {
            code: err.code(),
            message: err.message(),
        });
    }

    fn take_active(&self) -> Option<ClipHandle> {
        self.active
            .lock()
            .map(|mut active| active.take())
            .unwrap_or(None)
    }

    fn apply(&self, command: TriggerCommand) {
        match command {
            TriggerCommand::StartClip { timestamp } => self.start_clip(timestamp),
            TriggerCommand::StopClip { timestamp } => self.stop_clip(timestamp),
            TriggerCommand::PhaseChanged { from, to, .. } => {
                tracing::trace!("[RecorderManager] Phase {:?} -> {:?}", from, to);
            }
        }
    }

    fn start_clip(&self, timestamp: f64) {
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.fail(
                    PoseError::LockPoisoned {
                        component: "RecorderManager".to_string(),
                    },
                    "RecorderManager::start_clip",
                );
                return;
            }
        };

        if let Some(handle) = *active {
            tracing::warn!(
                "[RecorderManager] Start at {:.2}s ignored, clip {} still open",
                timestamp,
                handle.0
            );
            return;
        }

        match self.recorder.start() {
            Ok(handle) => {
                *active = Some(handle);
                drop(active);
                tracing::info!("[RecorderManager] Recording clip {} at {:.2}s", handle.0, timestamp);
                self.emit(ClipEvent::Started { handle, timestamp });
            }
            Err(err) => {
                drop(active);
                self.fail(err, "RecorderManager::start_clip");
            }
        }
    }

    fn stop_clip(&self, timestamp: f64) {
        let Some(handle) = self.take_active() else {
            tracing::debug!("[RecorderManager] Stop at {:.2}s with no open clip", timestamp);
            return;
        };

        match self.recorder.stop(handle) {
            Ok(()) => {
                tracing::info!("[RecorderManager] Stopped clip {} at {:.2}s", handle.0, timestamp);
                self.emit(ClipEvent::Stopped { handle, timestamp });
            }
            Err(err) => self.fail(err, "RecorderManager::stop_clip"),
        }
    }

    async fn run(self, commands: broadcast::Receiver<TriggerCommand>) {
        let mut stream = BroadcastStream::new(commands);
        let mut last_timestamp = 0.0;

        while let Some(item) = stream.next().await {
            match item {
                Ok(command) => {
                    last_timestamp = match command {
                        TriggerCommand::StartClip { timestamp }
                        | TriggerCommand::StopClip { timestamp }
                        | TriggerCommand::PhaseChanged { timestamp, .. } => timestamp,
                    };
                    self.apply(command);
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("[RecorderManager] Lagged, {} commands skipped", skipped);
                }
            }
        }

        if self.active.lock().map(|a| a.is_some()).unwrap_or(false) {
            tracing::warn!("[RecorderManager] Command channel closed with a clip open");
            self.stop_clip(last_timestamp);
        }
        tracing::debug!("[RecorderManager] Bridge finished");
    }
}

/// Manages the recorder bridge lifecycle
///
/// # Example
/// ```ignore
/// let manager = RecorderManager::new(recorder);
/// manager.start(broadcasts.subscribe_trigger_commands()?, None)?;
/// // ... live session ...
/// broadcasts.close_trigger_commands();
/// manager.wait()?;
/// ```
pub struct RecorderManager {
    bridge: Bridge,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RecorderManager {
    pub fn new(recorder: Arc<dyn Recorder>) -> Self {
        Self {
            bridge: Bridge {
                recorder,
                active: Arc::new(Mutex::new(None)),
                events_tx: None,
            },
            worker: Mutex::new(None),
        }
    }

    /// Start forwarding commands to the recorder
    ///
    /// # Arguments
    /// * `commands` - Trigger command subscription
    /// * `events_tx` - Optional channel receiving a ClipEvent per action
    ///
    /// # Errors
    /// - `LaneAlreadyRunning` if a previous bridge is still attached
    /// - `LockPoisoned` on lock failure
    pub fn start(
        &self,
        commands: broadcast::Receiver<TriggerCommand>,
        events_tx: Option<broadcast::Sender<ClipEvent>>,
    ) -> Result<(), PoseError> {
        let mut worker = self.worker.lock().map_err(|_| PoseError::LockPoisoned {
            component: "RecorderManager".to_string(),
        })?;

        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(PoseError::LaneAlreadyRunning);
        }

        let bridge = Bridge {
            events_tx,
            ..self.bridge.clone()
        };

        *worker = Some(thread::spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(err) => {
                    bridge.fail(
                        PoseError::RecorderFailed {
                            reason: format!("no runtime for recorder bridge: {}", err),
                        },
                        "RecorderManager::start",
                    );
                    return;
                }
            };
            rt.block_on(bridge.run(commands));
        }));

        Ok(())
    }

    /// Wait for the bridge to finish after its command channel closed
    ///
    /// Safe to call when no bridge is running.
    pub fn wait(&self) -> Result<(), PoseError> {
        let handle = self
            .worker
            .lock()
            .map_err(|_| PoseError::LockPoisoned {
                component: "RecorderManager".to_string(),
            })?
            .take();

        match handle {
            Some(handle) => handle.join().map_err(|_| PoseError::RecorderFailed {
                reason: "recorder bridge panicked".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Handle of the clip currently recording
    pub fn active_clip(&self) -> Option<ClipHandle> {
        self.bridge.active.lock().map(|a| *a).unwrap_or(None)
    }

    pub fn is_recording(&self) -> bool {
        self.active_clip().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::{MemoryRecorder, RecorderEvent};

    fn manager() -> (Arc<MemoryRecorder>, RecorderManager) {
        let recorder = Arc::new(MemoryRecorder::new());
        let manager = RecorderManager::new(recorder.clone());
        (recorder, manager)
    }

    #[test]
    fn test_start_and_stop_follow_commands() {
        let (recorder, manager) = manager();
        let (tx, rx) = broadcast::channel(16);
        let (events_tx, mut events_rx) = broadcast::channel(16);

        manager.start(rx, Some(events_tx)).unwrap();
        tx.send(TriggerCommand::StartClip { timestamp: 6.0 }).unwrap();
        tx.send(TriggerCommand::StopClip { timestamp: 11.0 }).unwrap();
        drop(tx);
        manager.wait().unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        let (RecorderEvent::Started(started), RecorderEvent::Stopped(stopped)) =
            (events[0], events[1])
        else {
            panic!("unexpected recorder events: {:?}", events);
        };
        assert_eq!(started, stopped);
        assert!(!manager.is_recording());

        assert_eq!(
            events_rx.try_recv().unwrap(),
            ClipEvent::Started {
                handle: started,
                timestamp: 6.0
            }
        );
        assert_eq!(
            events_rx.try_recv().unwrap(),
            ClipEvent::Stopped {
                handle: started,
                timestamp: 11.0
            }
        );
    }

    #[test]
    fn test_duplicate_start_is_ignored() {
        let (recorder, manager) = manager();
        let (tx, rx) = broadcast::channel(16);

        manager.start(rx, None).unwrap();
        tx.send(TriggerCommand::StartClip { timestamp: 6.0 }).unwrap();
        tx.send(TriggerCommand::StartClip { timestamp: 7.0 }).unwrap();
        tx.send(TriggerCommand::StopClip { timestamp: 9.0 }).unwrap();
        tx.send(TriggerCommand::StopClip { timestamp: 9.5 }).unwrap();
        drop(tx);
        manager.wait().unwrap();

        assert_eq!(recorder.events().len(), 2);
    }

    #[test]
    fn test_start_failure_is_reported() {
        let (recorder, manager) = manager();
        recorder.set_fail_start(true);
        let (tx, rx) = broadcast::channel(16);
        let (events_tx, mut events_rx) = broadcast::channel(16);

        manager.start(rx, Some(events_tx)).unwrap();
        tx.send(TriggerCommand::StartClip { timestamp: 6.0 }).unwrap();
        drop(tx);
        manager.wait().unwrap();

        assert!(recorder.events().is_empty());
        assert!(matches!(
            events_rx.try_recv().unwrap(),
            ClipEvent::Failed { code: 1006, .. }
        ));
    }

    #[test]
    fn test_closed_channel_stops_open_clip() {
        let (recorder, manager) = manager();
        let (tx, rx) = broadcast::channel(16);

        manager.start(rx, None).unwrap();
        tx.send(TriggerCommand::StartClip { timestamp: 6.0 }).unwrap();
        drop(tx);
        manager.wait().unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], RecorderEvent::Stopped(_)));
    }

    #[test]
    fn test_second_bridge_rejected_while_running() {
        let (_recorder, manager) = manager();
        let (tx, rx) = broadcast::channel::<TriggerCommand>(16);

        manager.start(rx, None).unwrap();
        assert_eq!(
            manager.start(tx.subscribe(), None),
            Err(PoseError::LaneAlreadyRunning)
        );

        drop(tx);
        manager.wait().unwrap();
        assert_eq!(manager.wait(), Ok(()));
    }
}
