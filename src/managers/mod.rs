// Managers Module
//
// Focused manager classes around the live session, each handling one concern:
// - BroadcastChannelManager: Tokio broadcast channel management
// - RecorderManager: Trigger command → Recorder port bridge

pub mod broadcast_manager;
pub mod recorder_manager;

pub use broadcast_manager::BroadcastChannelManager;
pub use recorder_manager::{ClipEvent, RecorderManager};
