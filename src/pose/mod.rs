// Pose module - body landmarks and feature extraction
//
// A frame's keypoints arrive from an external detector as a map of joint
// identity to a normalized 2D point plus detection confidence. This module
// defines those types and the extractor that turns them into the fixed
// 37-float vector consumed by the pose classifier.

pub mod features;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use features::{FeatureExtractor, FeatureVector, FEATURE_LEN};

/// Body landmark identity
///
/// The declaration order is the canonical order used by the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    /// Number of tracked joints
    pub const COUNT: usize = 14;

    /// All joints in canonical feature order
    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::Neck,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Position of this joint in the canonical order
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 2D point in normalized image coordinates (0-1, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A detected joint position with its confidence (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub point: Point2,
    pub confidence: f32,
}

impl JointSample {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            point: Point2::new(x, y),
            confidence,
        }
    }
}

/// Keypoints detected in a single frame
///
/// Produced fresh per frame by the detector and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseKeypoints {
    joints: HashMap<Joint, JointSample>,
}

impl PoseKeypoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used by detectors and tests
    pub fn with(mut self, joint: Joint, sample: JointSample) -> Self {
        self.joints.insert(joint, sample);
        self
    }

    pub fn insert(&mut self, joint: Joint, sample: JointSample) {
        self.joints.insert(joint, sample);
    }

    pub fn get(&self, joint: Joint) -> Option<&JointSample> {
        self.joints.get(&joint)
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Mean confidence over all 14 joints (absent joints count as zero)
    pub fn mean_confidence(&self) -> f32 {
        let total: f32 = self.joints.values().map(|s| s.confidence.clamp(0.0, 1.0)).sum();
        total / Joint::COUNT as f32
    }
}

impl FromIterator<(Joint, JointSample)> for PoseKeypoints {
    fn from_iter<I: IntoIterator<Item = (Joint, JointSample)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}
