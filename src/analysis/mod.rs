// Analysis module - pose classification and the live inference lane
//
// This module holds everything between raw keypoints and trigger input:
// the classifier port, the per-frame classification record, the clip
// quality scorer and the serialized live lane.
//
// Architecture:
// - LiveLane: worker thread fed by a one-slot lock-free ring
// - Pipeline: PoseDetector → FeatureExtractor → ClassifierSlot → LiveTrigger
// - Output: TriggerCommand sent via tokio broadcast channel to the host

pub mod classifier;
pub mod lane;
pub mod scorer;

pub use classifier::{ClassifierSlot, HeuristicClassifier, PoseClassifier};
pub use lane::{LanePipeline, LiveLane};
pub use scorer::ClipQualityScorer;

use serde::{Deserialize, Serialize};

/// Per-frame pose class produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PoseLabel {
    /// Address position, golfer set up over the ball
    Ready,
    /// Finish position after the swing
    EndSwing,
    /// Anything else, including frames with no usable pose
    #[default]
    Other,
}

/// One classified frame, shared by the live and offline pipelines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFrame {
    /// Seconds on the source clock
    pub timestamp: f64,
    pub label: PoseLabel,
    /// Classifier confidence (0.0-1.0)
    pub confidence: f32,
}

impl ClassifiedFrame {
    pub fn new(timestamp: f64, label: PoseLabel, confidence: f32) -> Self {
        Self {
            timestamp,
            label,
            confidence,
        }
    }
}
