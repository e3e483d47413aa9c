//! Canonical keypoint sets for tests and the replay harness.
//!
//! Coordinates are normalized image space with y growing downward.

use crate::pose::{Joint, JointSample, PoseKeypoints};

fn upper_body() -> PoseKeypoints {
    PoseKeypoints::new()
        .with(Joint::Nose, JointSample::new(0.50, 0.22, 0.9))
        .with(Joint::Neck, JointSample::new(0.50, 0.30, 0.9))
        .with(Joint::LeftShoulder, JointSample::new(0.40, 0.30, 0.9))
        .with(Joint::RightShoulder, JointSample::new(0.60, 0.30, 0.9))
        .with(Joint::LeftHip, JointSample::new(0.45, 0.70, 0.9))
        .with(Joint::RightHip, JointSample::new(0.55, 0.70, 0.9))
        .with(Joint::LeftKnee, JointSample::new(0.44, 0.85, 0.9))
        .with(Joint::RightKnee, JointSample::new(0.56, 0.85, 0.9))
}

/// Golfer at address: hands together, well below the shoulders
pub fn address_pose() -> PoseKeypoints {
    upper_body()
        .with(Joint::LeftElbow, JointSample::new(0.46, 0.45, 0.9))
        .with(Joint::RightElbow, JointSample::new(0.54, 0.45, 0.9))
        .with(Joint::LeftWrist, JointSample::new(0.49, 0.60, 0.9))
        .with(Joint::RightWrist, JointSample::new(0.51, 0.60, 0.9))
}

/// Golfer holding the finish: hands raised above the shoulders
pub fn finish_pose() -> PoseKeypoints {
    upper_body()
        .with(Joint::LeftElbow, JointSample::new(0.52, 0.22, 0.9))
        .with(Joint::RightElbow, JointSample::new(0.60, 0.24, 0.9))
        .with(Joint::LeftWrist, JointSample::new(0.55, 0.15, 0.9))
        .with(Joint::RightWrist, JointSample::new(0.57, 0.15, 0.9))
}

/// Mid-backswing: hands apart at shoulder height
pub fn backswing_pose() -> PoseKeypoints {
    upper_body()
        .with(Joint::LeftWrist, JointSample::new(0.30, 0.32, 0.9))
        .with(Joint::RightWrist, JointSample::new(0.70, 0.34, 0.9))
}
