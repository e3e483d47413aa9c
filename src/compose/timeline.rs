// TimelineComposer - lays selected clips end to end on one output timeline
//
// The first clip fixes the render size. Every segment gets a transform that
// orients its source and fits it into that canvas, and starts exactly where
// the previous one ended. Overlays are time spans over the output timeline,
// never separate clips.

use serde::{Deserialize, Serialize};

use crate::compose::{normalize, AffineTransform, Size, TrackGeometry};
use crate::config::ComposeConfig;
use crate::engine::backend::VideoSource;
use crate::error::{log_highlight_error, HighlightError};
use crate::highlight::HighlightClip;
use crate::telemetry::{self, DiagnosticError};

/// A selected clip together with its source track geometry
#[derive(Debug, Clone, PartialEq)]
pub struct ClipMedia {
    pub clip: HighlightClip,
    pub geometry: TrackGeometry,
}

impl ClipMedia {
    pub fn new(clip: HighlightClip, geometry: TrackGeometry) -> Self {
        Self { clip, geometry }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub clip: HighlightClip,
    /// Source pixels → render canvas
    pub transform: AffineTransform,
    /// Output time at which this segment begins
    pub placement_start: f64,
    pub duration: f64,
}

impl TimelineSegment {
    pub fn placement_end(&self) -> f64 {
        self.placement_start + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    SegmentLabel,
    CornerMark,
}

/// Annotation shown over `[start, end)` of the output timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpan {
    pub kind: OverlayKind,
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub segment_index: usize,
}

/// Everything an exporter needs to produce the output video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub render_size: Size,
    pub frame_rate: u32,
    pub segments: Vec<TimelineSegment>,
    pub overlays: Vec<OverlaySpan>,
    pub total_duration: f64,
}

impl RenderPlan {
    /// Segment playing at output time `t`
    pub fn segment_at(&self, t: f64) -> Option<&TimelineSegment> {
        self.segments
            .iter()
            .find(|s| t >= s.placement_start && t < s.placement_end())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineComposer {
    config: ComposeConfig,
}

impl TimelineComposer {
    pub fn new(config: ComposeConfig) -> Self {
        Self { config }
    }

    /// Build a render plan for clips in their final order
    ///
    /// Zero-length clips are left out and do not move the cursor.
    ///
    /// # Returns
    /// The plan, `EmptyTimeline` for no clips, or `DecodeFailed` when the
    /// first clip has no usable pixel size
    pub fn plan(&self, clips: &[ClipMedia]) -> Result<RenderPlan, HighlightError> {
        let first = clips.first().ok_or(HighlightError::EmptyTimeline)?;
        let render_size = first.geometry.oriented_size();
        if render_size.is_empty() {
            return Err(HighlightError::DecodeFailed {
                source_ref: first.clip.source_ref.clone(),
                reason: "track reports no pixel size".to_string(),
            });
        }

        let mut segments = Vec::with_capacity(clips.len());
        let mut cursor = 0.0;

        for media in clips {
            let duration = media.clip.duration();
            if duration <= 0.0 {
                tracing::debug!(
                    "[Composer] Skipping zero-length clip from {}",
                    media.clip.source_ref
                );
                continue;
            }

            segments.push(TimelineSegment {
                clip: media.clip.clone(),
                transform: normalize(
                    &media.geometry.transform,
                    media.geometry.natural_size,
                    render_size,
                ),
                placement_start: cursor,
                duration,
            });
            cursor += duration;
        }

        if segments.is_empty() {
            return Err(HighlightError::EmptyTimeline);
        }

        let overlays = self.overlays(&segments);

        tracing::info!(
            "[Composer] {} segments, {:.2}s at {}x{}",
            segments.len(),
            cursor,
            render_size.width,
            render_size.height
        );

        Ok(RenderPlan {
            render_size,
            frame_rate: self.config.frame_rate,
            segments,
            overlays,
            total_duration: cursor,
        })
    }

    /// Look up each clip's track geometry, then plan
    ///
    /// A clip whose geometry cannot be read is skipped; the rest still
    /// compose.
    pub fn plan_from_source(
        &self,
        clips: &[HighlightClip],
        source: &dyn VideoSource,
    ) -> Result<RenderPlan, HighlightError> {
        let media: Vec<ClipMedia> = clips
            .iter()
            .filter_map(|clip| match source.track_geometry(&clip.source_ref) {
                Ok(geometry) => Some(ClipMedia::new(clip.clone(), geometry)),
                Err(err) => {
                    log_highlight_error(&err, "TimelineComposer::plan_from_source");
                    telemetry::hub().record_error(DiagnosticError::SourceSkipped, &clip.source_ref);
                    None
                }
            })
            .collect();

        self.plan(&media)
    }

    fn overlays(&self, segments: &[TimelineSegment]) -> Vec<OverlaySpan> {
        let mut overlays = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let (start, end) = (segment.placement_start, segment.placement_end());

            if self.config.show_segment_labels {
                let text = match &segment.clip.course {
                    Some(course) => format!("Swing {} - {}", index + 1, course),
                    None => format!("Swing {}", index + 1),
                };
                overlays.push(OverlaySpan {
                    kind: OverlayKind::SegmentLabel,
                    text,
                    start,
                    end,
                    segment_index: index,
                });
            }

            if let Some(mark) = &self.config.corner_mark {
                overlays.push(OverlaySpan {
                    kind: OverlayKind::CornerMark,
                    text: mark.clone(),
                    start,
                    end,
                    segment_index: index,
                });
            }
        }

        overlays
    }
}
