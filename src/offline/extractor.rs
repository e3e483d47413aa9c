// SequenceExtractor - offline swing detection over a full label stream
//
// Scan rules, applied in frame order:
// - Ready after a non-Ready frame opens a new pending sequence, discarding
//   any unfinished one
// - EndSwing marks the pending sequence as having reached the finish
// - Other after a finish closes the sequence at that frame
// - A sequence still open at the end of the stream closes at
//   min(start + max_open_sequence_s, duration)
//
// Closed sequences are padded into highlight clips. A recording with no
// sequences is cut into uniform fallback clips, each scored from its own
// label sample.

use serde::{Deserialize, Serialize};

use crate::analysis::{ClassifiedFrame, ClipQualityScorer, PoseLabel};
use crate::config::OfflineConfig;
use crate::engine::backend::VideoSource;
use crate::error::{log_highlight_error, HighlightError};
use crate::highlight::HighlightClip;
use crate::offline::{CancellationFlag, SourceRecording, SwingSequence};
use crate::telemetry;

const CLOSED_QUALITY: f32 = 0.8;
const CLOSED_WITHOUT_READY_QUALITY: f32 = 0.5;
const OPEN_WITH_FINISH_QUALITY: f32 = 0.7;
const OPEN_READY_ONLY_QUALITY: f32 = 0.4;

#[derive(Debug, Clone, Copy)]
struct PendingSequence {
    start: f64,
    has_ready: bool,
    has_end_swing: bool,
}

/// Result of scanning one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingScan {
    pub source_ref: String,
    pub duration: f64,
    /// Unpadded sequences found in the label stream
    pub sequences: Vec<SwingSequence>,
    /// Padded sequence clips, or fallback clips when no sequence was found
    pub clips: Vec<HighlightClip>,
    pub used_fallback: bool,
}

/// Offline sequence extractor
#[derive(Debug, Clone, Default)]
pub struct SequenceExtractor {
    config: OfflineConfig,
    scorer: ClipQualityScorer,
}

impl SequenceExtractor {
    pub fn new(config: OfflineConfig) -> Self {
        Self {
            config,
            scorer: ClipQualityScorer::new(),
        }
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Find swing sequences in an ordered label stream
    ///
    /// Cancellation is checked before every frame; a cancelled scan returns
    /// `Cancelled` and no partial sequences.
    ///
    /// # Arguments
    /// * `frames` - Classified frames in time order
    /// * `total_duration` - Recording length, caps sequences left open
    pub fn detect_sequences(
        &self,
        frames: &[ClassifiedFrame],
        total_duration: f64,
        cancel: &CancellationFlag,
    ) -> Result<Vec<SwingSequence>, HighlightError> {
        let mut sequences = Vec::new();
        let mut pending: Option<PendingSequence> = None;
        let mut last_label: Option<PoseLabel> = None;

        for frame in frames {
            if cancel.is_cancelled() {
                return Err(HighlightError::Cancelled);
            }

            match frame.label {
                PoseLabel::Ready => {
                    if last_label != Some(PoseLabel::Ready) {
                        if let Some(discarded) = pending {
                            tracing::debug!(
                                "[OfflineScan] Discarding unfinished sequence at {:.2}s",
                                discarded.start
                            );
                        }
                        pending = Some(PendingSequence {
                            start: frame.timestamp,
                            has_ready: true,
                            has_end_swing: false,
                        });
                    }
                }
                PoseLabel::EndSwing => {
                    if let Some(open) = pending.as_mut() {
                        open.has_end_swing = true;
                    }
                }
                PoseLabel::Other => {
                    if let Some(finished) = pending.filter(|p| p.has_end_swing) {
                        let quality = if finished.has_ready {
                            CLOSED_QUALITY
                        } else {
                            CLOSED_WITHOUT_READY_QUALITY
                        };
                        sequences.push(SwingSequence {
                            start_time: finished.start,
                            end_time: frame.timestamp,
                            quality_score: quality,
                        });
                        pending = None;
                    }
                }
            }

            last_label = Some(frame.label);
        }

        if let Some(open) = pending.filter(|p| p.has_ready) {
            let end = (open.start + self.config.max_open_sequence_s)
                .min(total_duration)
                .max(open.start);
            let quality = if open.has_end_swing {
                OPEN_WITH_FINISH_QUALITY
            } else {
                OPEN_READY_ONLY_QUALITY
            };
            sequences.push(SwingSequence {
                start_time: open.start,
                end_time: end,
                quality_score: quality,
            });
        }

        Ok(sequences)
    }

    /// Clip bounds for a sequence after lead/tail padding
    pub fn pad(&self, sequence: &SwingSequence, total_duration: f64) -> (f64, f64) {
        let start = (sequence.start_time - self.config.lead_padding_s).max(0.0);
        let end = (sequence.end_time + self.config.tail_padding_s).min(total_duration);
        (start, end.max(start))
    }

    /// Uniform back-to-back windows used when no sequence was found
    ///
    /// Empty for recordings at or below `fallback_min_video_s`. A trailing
    /// window shorter than `fallback_min_tail_s` is dropped.
    pub fn fallback_windows(&self, total_duration: f64) -> Vec<(f64, f64)> {
        let clip = self.config.fallback_clip_s;
        if !total_duration.is_finite()
            || total_duration <= self.config.fallback_min_video_s
            || !clip.is_finite()
            || clip <= 0.0
            || clip < self.config.fallback_min_tail_s
        {
            return Vec::new();
        }

        let count = (total_duration / clip).ceil() as usize;
        (0..count)
            .map(|index| {
                let start = index as f64 * clip;
                (start, (start + clip).min(total_duration))
            })
            .filter(|(start, end)| end - start >= self.config.fallback_min_tail_s)
            .collect()
    }

    /// Recording length, rejected unless finite and non-negative
    fn checked_duration(
        &self,
        source: &dyn VideoSource,
        source_ref: &str,
    ) -> Result<f64, HighlightError> {
        let total = source.duration(source_ref)?;
        if total.is_finite() && total >= 0.0 {
            Ok(total)
        } else {
            Err(HighlightError::DecodeFailed {
                source_ref: source_ref.to_string(),
                reason: format!("invalid duration {}", total),
            })
        }
    }

    /// Sample a recording and return its unpadded sequences
    pub fn extract_sequences(
        &self,
        source: &dyn VideoSource,
        source_ref: &str,
        cancel: &CancellationFlag,
    ) -> Result<Vec<SwingSequence>, HighlightError> {
        let total = self.checked_duration(source, source_ref)?;
        let frames = source.sample_labels_at(source_ref, self.config.sample_interval_s)?;
        self.detect_sequences(&frames, total, cancel)
    }

    /// Scan one recording into highlight candidates
    ///
    /// Fallback clips whose label sample fails are skipped individually.
    pub fn scan_recording(
        &self,
        source: &dyn VideoSource,
        recording: &SourceRecording,
        cancel: &CancellationFlag,
    ) -> Result<RecordingScan, HighlightError> {
        let source_ref = recording.source_ref.as_str();
        let total = self.checked_duration(source, source_ref)?;
        let frames = source.sample_labels_at(source_ref, self.config.sample_interval_s)?;
        let sequences = self.detect_sequences(&frames, total, cancel)?;

        let make_clip = |start: f64, end: f64, quality: f32| {
            HighlightClip::new(source_ref, start, end, quality)
                .with_course(recording.course.clone())
                .with_date(recording.date)
        };

        let mut clips = Vec::new();
        for sequence in &sequences {
            telemetry::hub().record_sequence(source_ref, sequence);
            let (start, end) = self.pad(sequence, total);
            clips.push(make_clip(start, end, sequence.quality_score));
        }

        let used_fallback = sequences.is_empty() && total > self.config.fallback_min_video_s;
        if used_fallback {
            for (start, end) in self.fallback_windows(total) {
                if cancel.is_cancelled() {
                    return Err(HighlightError::Cancelled);
                }
                match source.sample_labels_between(
                    source_ref,
                    start,
                    end,
                    self.config.sample_interval_s,
                ) {
                    Ok(sample) => clips.push(make_clip(start, end, self.scorer.score(&sample))),
                    Err(err) => log_highlight_error(&err, "SequenceExtractor::fallback"),
                }
            }
        }

        tracing::info!(
            "[OfflineScan] {}: {:.2}s, {} sequences, {} clips{}",
            source_ref,
            total,
            sequences.len(),
            clips.len(),
            if used_fallback { " (fallback)" } else { "" }
        );

        Ok(RecordingScan {
            source_ref: source_ref.to_string(),
            duration: total,
            sequences,
            clips,
            used_fallback,
        })
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
