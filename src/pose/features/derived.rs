// Derived module - angle and hand features
//
// Seven angle/flex features followed by two hand features. Flex proxies and
// hand features are vertical or planar distances divided by the torso scale
// so they live in the same units as the normalized coordinates. A feature
// whose joints are absent contributes zero.

use super::geometry::{GatedPose, TorsoFrame};
use crate::pose::{Joint, Point2};

/// Angle/flex features in vector order
pub fn angle_features(pose: &GatedPose<'_>, torso: &TorsoFrame) -> [f32; 7] {
    [
        line_angle(pose.point(Joint::LeftShoulder), pose.point(Joint::RightShoulder)),
        line_angle(pose.point(Joint::LeftHip), pose.point(Joint::RightHip)),
        trunk_pitch(pose, torso),
        vertical_offset(pose, torso, Joint::LeftElbow, Joint::LeftShoulder),
        vertical_offset(pose, torso, Joint::RightElbow, Joint::RightShoulder),
        vertical_offset(pose, torso, Joint::LeftKnee, Joint::LeftHip),
        vertical_offset(pose, torso, Joint::RightKnee, Joint::RightHip),
    ]
}

/// Hand features in vector order
pub fn hand_features(pose: &GatedPose<'_>, torso: &TorsoFrame) -> [f32; 2] {
    let wrists = pose.mean_of(Joint::LeftWrist, Joint::RightWrist);
    let shoulders = pose.mean_of(Joint::LeftShoulder, Joint::RightShoulder);

    // Positive when the hands are above the shoulders (image y grows down)
    let wrist_height = match (wrists, shoulders) {
        (Some(w), Some(s)) => torso.scaled(s.y - w.y),
        _ => 0.0,
    };

    let separation = match (pose.point(Joint::LeftWrist), pose.point(Joint::RightWrist)) {
        (Some(l), Some(r)) => torso.scaled(l.distance(r)),
        _ => 0.0,
    };

    [wrist_height, separation]
}

/// atan2 of the vector from `from` to `to`, zero if either end is absent
fn line_angle(from: Option<Point2>, to: Option<Point2>) -> f32 {
    match (from, to) {
        (Some(a), Some(b)) => (b.y - a.y).atan2(b.x - a.x),
        _ => 0.0,
    }
}

/// Lean of the pelvis-to-neck vector away from vertical (radians)
fn trunk_pitch(pose: &GatedPose<'_>, torso: &TorsoFrame) -> f32 {
    if !torso.anchored {
        return 0.0;
    }
    let top = match pose.point(Joint::Neck).or(torso.shoulder_mid) {
        Some(p) => p,
        None => return 0.0,
    };
    let dx = top.x - torso.pelvis.x;
    let dy = top.y - torso.pelvis.y;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    // Upright torso points up the image, i.e. negative dy
    dx.atan2(-dy)
}

fn vertical_offset(pose: &GatedPose<'_>, torso: &TorsoFrame, joint: Joint, anchor: Joint) -> f32 {
    match (pose.point(joint), pose.point(anchor)) {
        (Some(j), Some(a)) => torso.scaled(j.y - a.y),
        _ => 0.0,
    }
}
