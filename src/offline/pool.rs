// Parallel offline scan - one sequential worker per recording
//
// Workers share only the cancellation flag and the read-only video source.
// A recording that fails to open or decode is skipped and reported; its
// siblings are unaffected. Cancellation discards every partial result.

use std::thread;

use serde::{Deserialize, Serialize};

use crate::engine::backend::VideoSource;
use crate::error::{log_highlight_error, ErrorCode, HighlightError};
use crate::highlight::HighlightClip;
use crate::offline::{CancellationFlag, RecordingScan, SequenceExtractor, SourceRecording};
use crate::telemetry::{self, DiagnosticError};

/// Recording left out of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source_ref: String,
    pub code: i32,
    pub message: String,
}

/// Combined outcome of scanning several recordings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Candidates from every successful recording, in input order
    pub clips: Vec<HighlightClip>,
    pub sequences_found: usize,
    /// Recordings that contributed fallback clips
    pub fallback_sources: Vec<String>,
    pub skipped: Vec<SkippedSource>,
}

impl ScanReport {
    fn absorb(&mut self, scan: RecordingScan) {
        self.sequences_found += scan.sequences.len();
        if scan.used_fallback {
            self.fallback_sources.push(scan.source_ref);
        }
        self.clips.extend(scan.clips);
    }

    fn skip(&mut self, source_ref: &str, err: &HighlightError) {
        log_highlight_error(err, "scan_sources");
        telemetry::hub().record_error(DiagnosticError::SourceSkipped, source_ref);
        self.skipped.push(SkippedSource {
            source_ref: source_ref.to_string(),
            code: err.code(),
            message: err.message(),
        });
    }
}

/// Scan recordings in parallel
///
/// # Arguments
/// * `extractor` - Shared extractor configuration
/// * `source` - Video source port, shared read-only by all workers
/// * `recordings` - Recordings to scan
/// * `cancel` - Checked by every worker between samples
///
/// # Returns
/// The combined report, or `Cancelled` if the flag was raised at any point
pub fn scan_sources(
    extractor: &SequenceExtractor,
    source: &dyn VideoSource,
    recordings: &[SourceRecording],
    cancel: &CancellationFlag,
) -> Result<ScanReport, HighlightError> {
    tracing::info!("[OfflineScan] Scanning {} recordings", recordings.len());

    let results: Vec<Result<RecordingScan, HighlightError>> = thread::scope(|scope| {
        let workers: Vec<_> = recordings
            .iter()
            .map(|recording| {
                scope.spawn(move || extractor.scan_recording(source, recording, cancel))
            })
            .collect();

        workers
            .into_iter()
            .zip(recordings)
            .map(|(worker, recording)| {
                worker.join().unwrap_or_else(|_| {
                    Err(HighlightError::DecodeFailed {
                        source_ref: recording.source_ref.clone(),
                        reason: "scan worker panicked".to_string(),
                    })
                })
            })
            .collect()
    });

    if cancel.is_cancelled() {
        tracing::info!("[OfflineScan] Cancelled, discarding partial results");
        return Err(HighlightError::Cancelled);
    }

    let mut report = ScanReport::default();
    for (recording, result) in recordings.iter().zip(results) {
        match result {
            Ok(scan) => report.absorb(scan),
            Err(err) => report.skip(&recording.source_ref, &err),
        }
    }

    tracing::info!(
        "[OfflineScan] {} clips from {} recordings ({} skipped)",
        report.clips.len(),
        recordings.len() - report.skipped.len(),
        report.skipped.len()
    );
    Ok(report)
}
