//! Core telemetry event types describing the live lane and offline scans.

use serde::{Deserialize, Serialize};

use crate::analysis::PoseLabel;
use crate::trigger::PhaseState;

/// Diagnostic error codes surfaced via telemetry metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    ClassifierUnavailable,
    SensorGap,
    SourceSkipped,
    RecorderFailed,
    ExportFailed,
    StreamBackpressure,
}

/// Metric events covering classification, phase changes, drops and scans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Classification {
        label: PoseLabel,
        confidence: f32,
    },
    /// Rolling per-frame inference time in the live lane
    Latency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    PhaseChange {
        from: PhaseState,
        to: PhaseState,
        timestamp: f64,
    },
    FrameDropped {
        total: u64,
    },
    SequenceDetected {
        source_ref: String,
        start: f64,
        end: f64,
        quality: f32,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}
