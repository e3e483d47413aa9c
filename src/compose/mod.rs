// Compose module - selected clips → render plan
//
// Pure planning: no decoding or encoding happens here. The plan is handed to
// an external exporter and discarded afterwards.
//
// Module organization:
// - transform: affine matrices, rotation detection, fit-and-center
// - timeline: cursor layout, per-segment transforms, overlay spans

mod timeline;
mod transform;

pub use timeline::{
    ClipMedia, OverlayKind, OverlaySpan, RenderPlan, TimelineComposer, TimelineSegment,
};
pub use transform::{normalize, orient, AffineTransform, Rotation, Size};

use serde::{Deserialize, Serialize};

/// Natural pixel size and orientation of a source video track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub natural_size: Size,
    pub transform: AffineTransform,
}

impl TrackGeometry {
    pub fn new(natural_size: Size, transform: AffineTransform) -> Self {
        Self {
            natural_size,
            transform,
        }
    }

    pub fn upright(width: f64, height: f64) -> Self {
        Self::new(Size::new(width, height), AffineTransform::IDENTITY)
    }

    /// Size the track displays at once its orientation is applied
    pub fn oriented_size(&self) -> Size {
        self.transform.oriented_size(self.natural_size)
    }
}
