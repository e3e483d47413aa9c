// Geometry module - torso reference frame
//
// Every normalized coordinate is expressed relative to the pelvis center and
// divided by the torso length (shoulder midpoint to pelvis), so the vector is
// invariant to where the golfer stands in frame and how far from the camera.

use crate::pose::{Joint, Point2, PoseKeypoints};

/// Torso length floor preventing division blow-up
pub const MIN_TORSO_SCALE: f32 = 1e-6;

/// Pelvis used when both hips are absent
pub const DEFAULT_PELVIS: Point2 = Point2::new(0.5, 0.5);

/// Confidence-filtered view of a frame's keypoints
pub struct GatedPose<'a> {
    keypoints: &'a PoseKeypoints,
    floor: f32,
}

impl<'a> GatedPose<'a> {
    pub fn new(keypoints: &'a PoseKeypoints, floor: f32) -> Self {
        Self { keypoints, floor }
    }

    /// Joint position if its confidence reaches the floor and it is finite
    pub fn point(&self, joint: Joint) -> Option<Point2> {
        self.keypoints
            .get(joint)
            .filter(|s| s.confidence >= self.floor)
            .map(|s| s.point)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Mean of whichever of the two joints are present
    pub fn mean_of(&self, a: Joint, b: Joint) -> Option<Point2> {
        match (self.point(a), self.point(b)) {
            (Some(pa), Some(pb)) => Some(pa.midpoint(pb)),
            (Some(p), None) | (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }
}

/// Origin and scale of the normalized pose frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoFrame {
    pub pelvis: Point2,
    pub shoulder_mid: Option<Point2>,
    pub scale: f32,
    /// False when both hips and both shoulders were below the floor
    pub anchored: bool,
}

impl TorsoFrame {
    pub fn from_pose(pose: &GatedPose<'_>) -> Self {
        let hips = pose.mean_of(Joint::LeftHip, Joint::RightHip);
        let shoulders = pose.mean_of(Joint::LeftShoulder, Joint::RightShoulder);
        let pelvis = hips.unwrap_or(DEFAULT_PELVIS);
        let shoulder_mid = shoulders.or_else(|| pose.point(Joint::Neck));

        let scale = shoulder_mid
            .map(|mid| mid.distance(pelvis))
            .unwrap_or(1.0)
            .max(MIN_TORSO_SCALE);

        Self {
            pelvis,
            shoulder_mid,
            scale,
            anchored: hips.is_some() || shoulders.is_some(),
        }
    }

    /// Map a raw point into the pelvis-relative, scale-normalized frame
    pub fn normalize(&self, point: Point2) -> Point2 {
        Point2::new(
            (point.x - self.pelvis.x) / self.scale,
            (point.y - self.pelvis.y) / self.scale,
        )
    }

    /// Scale a raw vertical or planar distance into torso units
    pub fn scaled(&self, value: f32) -> f32 {
        value / self.scale
    }
}
