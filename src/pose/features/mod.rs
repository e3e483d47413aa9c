// FeatureExtractor - pose feature extraction for swing classification
//
// This module turns one frame's keypoints into the fixed-length vector the
// pose classifier consumes.
//
// Module organization:
// - types: FeatureVector and index constants
// - geometry: confidence gating and the torso reference frame
// - derived: angle, flex and hand features
// - mod.rs: Coordinator (FeatureExtractor)
//
// Failure policy: sensor gaps never fail. Missing joints contribute zeros and
// a frame with no torso anchors yields all-zero coordinate features.

mod derived;
mod geometry;
mod types;

pub use geometry::{TorsoFrame, DEFAULT_PELVIS, MIN_TORSO_SCALE};
pub use types::*;

use geometry::GatedPose;

use crate::config::FeatureConfig;
use crate::pose::{Joint, PoseKeypoints};

/// FeatureExtractor coordinates the pose feature pipeline
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    confidence_floor: f32,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `confidence_floor` - Joints below this confidence are treated as absent
    pub fn new(confidence_floor: f32) -> Self {
        Self { confidence_floor }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.confidence_floor)
    }

    pub fn confidence_floor(&self) -> f32 {
        self.confidence_floor
    }

    /// Extract the 37-float feature vector from a frame's keypoints
    ///
    /// 1. Gate joints by confidence
    /// 2. Build the torso frame (pelvis origin, torso-length scale)
    /// 3. Emit 14 normalized joint coordinates in canonical order
    /// 4. Append 7 angle/flex features and 2 hand features
    ///
    /// Identical input always yields an identical vector; output is finite.
    pub fn extract(&self, keypoints: &PoseKeypoints) -> FeatureVector {
        let pose = GatedPose::new(keypoints, self.confidence_floor);
        let torso = TorsoFrame::from_pose(&pose);

        let mut values = [0.0_f32; FEATURE_LEN];

        if torso.anchored {
            for joint in Joint::ALL {
                if let Some(point) = pose.point(joint) {
                    let normalized = torso.normalize(point);
                    values[joint.index() * 2] = normalized.x;
                    values[joint.index() * 2 + 1] = normalized.y;
                }
            }
        }

        let angles = derived::angle_features(&pose, &torso);
        values[DERIVED_OFFSET..HAND_OFFSET].copy_from_slice(&angles);

        let hands = derived::hand_features(&pose, &torso);
        values[HAND_OFFSET..FEATURE_LEN].copy_from_slice(&hands);

        FeatureVector::from_values(values)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}
