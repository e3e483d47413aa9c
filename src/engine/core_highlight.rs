use serde::{Deserialize, Serialize};

use crate::compose::{RenderPlan, TimelineComposer};
use crate::engine::backend::{Exporter, VideoSource};
use crate::error::{log_highlight_error, HighlightError};
use crate::highlight::{CourseFilter, HighlightSelector, SelectionBudget};
use crate::offline::{scan_sources, CancellationFlag, ScanReport, SequenceExtractor, SourceRecording};
use crate::telemetry::{self, DiagnosticError};

use super::EngineHandle;

/// Which recordings to turn into a reel, and how much of them to keep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighlightRequest {
    pub recordings: Vec<SourceRecording>,
    #[serde(default)]
    pub filter: CourseFilter,
    /// Defaults to the configured budget
    #[serde(default)]
    pub budget: Option<SelectionBudget>,
}

impl HighlightRequest {
    pub fn new(recordings: Vec<SourceRecording>) -> Self {
        Self {
            recordings,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: CourseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_budget(mut self, budget: SelectionBudget) -> Self {
        self.budget = Some(budget);
        self
    }
}

/// A rendered highlight reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightOutcome {
    /// Whatever the exporter returned (path or URI)
    pub output_ref: String,
    pub plan: RenderPlan,
    pub scan: ScanReport,
}

impl EngineHandle {
    // ========================================================================
    // OFFLINE HIGHLIGHT PIPELINE
    // ========================================================================

    /// Scan recordings for swing clips with the configured extractor
    pub fn scan_recordings(
        &self,
        source: &dyn VideoSource,
        recordings: &[SourceRecording],
        cancel: &CancellationFlag,
    ) -> Result<ScanReport, HighlightError> {
        let extractor = SequenceExtractor::new(self.config().offline);
        scan_sources(&extractor, source, recordings, cancel)
    }

    /// Build and export a highlight reel
    ///
    /// Runs scan → course filter → select → compose → export. Sources that
    /// fail to scan or whose geometry cannot be read are skipped.
    ///
    /// # Errors
    /// - `Cancelled` if `cancel` was raised during the scan
    /// - `InvalidBudget` / `NothingSelected` from selection
    /// - `EmptyTimeline` if no selected clip could be composed
    /// - Whatever the exporter returns; export is never retried
    pub fn build_highlight(
        &self,
        request: &HighlightRequest,
        source: &dyn VideoSource,
        exporter: &dyn Exporter,
        cancel: &CancellationFlag,
    ) -> Result<HighlightOutcome, HighlightError> {
        let config = self.config();
        let budget = request
            .budget
            .unwrap_or_else(|| SelectionBudget::from_config(&config.highlight));
        budget.validate()?;

        let scan = self.scan_recordings(source, &request.recordings, cancel)?;
        let candidates = request.filter.apply(scan.clips.clone());
        tracing::info!(
            "[EngineHandle] {} of {} candidates pass the course filter",
            candidates.len(),
            scan.clips.len()
        );

        let selected = HighlightSelector::new().select(&candidates, &budget)?;
        let plan = TimelineComposer::new(config.compose).plan_from_source(&selected, source)?;

        let output_ref = exporter.render(&plan).map_err(|err| {
            log_highlight_error(&err, "build_highlight");
            telemetry::hub().record_error(DiagnosticError::ExportFailed, err.to_string());
            err
        })?;

        tracing::info!(
            "[EngineHandle] Exported {} segments ({:.1}s) to {}",
            plan.segments.len(),
            plan.total_duration,
            output_ref
        );

        Ok(HighlightOutcome {
            output_ref,
            plan,
            scan,
        })
    }
}
