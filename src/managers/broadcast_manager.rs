// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::managers::ClipEvent;
use crate::trigger::TriggerCommand;

/// Buffer for trigger commands; a swing produces at most a handful
const TRIGGER_COMMAND_BUFFER: usize = 64;

/// Buffer for recorder lifecycle events
const CLIP_EVENT_BUFFER: usize = 32;

type Slot<T> = Arc<Mutex<Option<broadcast::Sender<T>>>>;

/// Manages all tokio broadcast channels
///
/// Single Responsibility: Broadcast channel lifecycle and subscription
///
/// # Channel Types
/// - Trigger commands: start/stop/phase output of the live lane
/// - Clip events: what the recorder bridge actually did with those commands
pub struct BroadcastChannelManager {
    trigger_commands: Slot<TriggerCommand>,
    clip_events: Slot<ClipEvent>,
}

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<broadcast::Sender<T>>> {
    // The guarded value is a plain Option, so a poisoned lock is still usable
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with all channels uninitialized
    ///
    /// Channels must be explicitly initialized via init_* methods before use.
    pub fn new() -> Self {
        Self {
            trigger_commands: Arc::new(Mutex::new(None)),
            clip_events: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // TRIGGER COMMAND CHANNEL
    // ========================================================================

    /// Initialize the trigger command channel
    ///
    /// Replaces any previous sender, so subscribers of an older session stop
    /// receiving once that session's lane is gone.
    ///
    /// # Returns
    /// Sender handed to the live lane
    pub fn init_trigger_commands(&self) -> broadcast::Sender<TriggerCommand> {
        let (tx, _) = broadcast::channel(TRIGGER_COMMAND_BUFFER);
        *lock(&self.trigger_commands) = Some(tx.clone());
        tx
    }

    /// Subscribe to trigger commands
    ///
    /// # Returns
    /// Receiver, or None if init_trigger_commands() has not been called
    pub fn subscribe_trigger_commands(&self) -> Option<broadcast::Receiver<TriggerCommand>> {
        lock(&self.trigger_commands)
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Drop the stored sender so subscribers see the stream end
    pub fn close_trigger_commands(&self) {
        lock(&self.trigger_commands).take();
    }

    // ========================================================================
    // CLIP EVENT CHANNEL
    // ========================================================================

    pub fn init_clip_events(&self) -> broadcast::Sender<ClipEvent> {
        let (tx, _) = broadcast::channel(CLIP_EVENT_BUFFER);
        *lock(&self.clip_events) = Some(tx.clone());
        tx
    }

    pub fn subscribe_clip_events(&self) -> Option<broadcast::Receiver<ClipEvent>> {
        lock(&self.clip_events).as_ref().map(|tx| tx.subscribe())
    }

    pub fn get_clip_event_sender(&self) -> Option<broadcast::Sender<ClipEvent>> {
        lock(&self.clip_events).clone()
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_command_channel_lifecycle() {
        let manager = BroadcastChannelManager::new();

        // Initially no subscription possible
        assert!(manager.subscribe_trigger_commands().is_none());

        let _tx = manager.init_trigger_commands();
        assert!(manager.subscribe_trigger_commands().is_some());

        manager.close_trigger_commands();
        assert!(manager.subscribe_trigger_commands().is_none());
    }

    #[test]
    fn test_trigger_command_multiple_subscribers() {
        let manager = BroadcastChannelManager::new();
        let tx = manager.init_trigger_commands();

        let mut rx1 = manager.subscribe_trigger_commands().unwrap();
        let mut rx2 = manager.subscribe_trigger_commands().unwrap();

        tx.send(TriggerCommand::StartClip { timestamp: 6.0 }).unwrap();

        assert_eq!(
            rx1.try_recv().unwrap(),
            TriggerCommand::StartClip { timestamp: 6.0 }
        );
        assert_eq!(
            rx2.try_recv().unwrap(),
            TriggerCommand::StartClip { timestamp: 6.0 }
        );
    }

    #[test]
    fn test_reinit_ends_old_subscribers() {
        let manager = BroadcastChannelManager::new();
        let first = manager.init_trigger_commands();
        let mut old_rx = manager.subscribe_trigger_commands().unwrap();

        drop(first);
        let _second = manager.init_trigger_commands();

        assert_eq!(
            old_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Closed)
        );
    }

    #[test]
    fn test_clip_event_channel_lifecycle() {
        let manager = BroadcastChannelManager::new();

        assert!(manager.subscribe_clip_events().is_none());
        assert!(manager.get_clip_event_sender().is_none());

        let _tx = manager.init_clip_events();
        assert!(manager.subscribe_clip_events().is_some());
        assert!(manager.get_clip_event_sender().is_some());
    }

    #[test]
    fn test_default_implementation() {
        let manager = BroadcastChannelManager::default();

        assert!(manager.subscribe_trigger_commands().is_none());
        assert!(manager.subscribe_clip_events().is_none());
    }
}
