// ClipQualityScorer - ranks a clip by its classified frames
//
// score = 0.4 * mean confidence
//       + 0.3 if any Ready frame is confident
//       + 0.3 if any EndSwing frame is confident
//
// clamped to 0.0-1.0. An empty sample scores 0.

use crate::analysis::{ClassifiedFrame, PoseLabel};

const CONFIDENCE_WEIGHT: f32 = 0.4;
const READY_WEIGHT: f32 = 0.3;
const END_SWING_WEIGHT: f32 = 0.3;

/// Frames must exceed this confidence to count as evidence of a phase
pub const PHASE_EVIDENCE_CONFIDENCE: f32 = 0.7;

/// Stateless clip scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipQualityScorer;

impl ClipQualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a frame-classification sample of a clip
    ///
    /// # Arguments
    /// * `frames` - Classified frames falling inside the clip
    ///
    /// # Returns
    /// Quality score in 0.0-1.0
    pub fn score(&self, frames: &[ClassifiedFrame]) -> f32 {
        if frames.is_empty() {
            return 0.0;
        }

        let mean_confidence =
            frames.iter().map(|f| f.confidence).sum::<f32>() / frames.len() as f32;

        let has_confident = |label: PoseLabel| {
            frames
                .iter()
                .any(|f| f.label == label && f.confidence > PHASE_EVIDENCE_CONFIDENCE)
        };

        let mut score = CONFIDENCE_WEIGHT * mean_confidence;
        if has_confident(PoseLabel::Ready) {
            score += READY_WEIGHT;
        }
        if has_confident(PoseLabel::EndSwing) {
            score += END_SWING_WEIGHT;
        }

        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
