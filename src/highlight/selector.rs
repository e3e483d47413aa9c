// HighlightSelector - greedy budgeted clip selection
//
// 1. Rank candidates by quality score, best first
// 2. Accept in rank order while the count and duration budget allow;
//    a clip that would overflow is skipped, later clips may still fit
// 3. Re-sort the accepted set chronologically for export

use std::cmp::Ordering;

use crate::error::HighlightError;
use crate::highlight::{HighlightClip, SelectionBudget};

#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightSelector;

impl HighlightSelector {
    pub fn new() -> Self {
        Self
    }

    /// Select the best clips that fit `budget`
    ///
    /// # Returns
    /// Selected clips in chronological order (by date, undated first, then
    /// start time), or `NothingSelected` when no candidate fits.
    pub fn select(
        &self,
        candidates: &[HighlightClip],
        budget: &SelectionBudget,
    ) -> Result<Vec<HighlightClip>, HighlightError> {
        budget.validate()?;

        let mut ranked: Vec<&HighlightClip> = candidates.iter().collect();
        ranked.sort_by(|a, b| by_quality(a, b));

        let mut selected: Vec<HighlightClip> = Vec::new();
        let mut running_duration = 0.0_f64;

        for clip in ranked {
            if selected.len() >= budget.max_clips {
                break;
            }
            let duration = clip.duration();
            if running_duration + duration > budget.max_total_duration {
                tracing::debug!(
                    "[Selector] Skipping {} ({:.2}s): would exceed {:.2}s budget",
                    clip.source_ref,
                    duration,
                    budget.max_total_duration
                );
                continue;
            }
            running_duration += duration;
            selected.push(clip.clone());
        }

        if selected.is_empty() {
            return Err(HighlightError::NothingSelected {
                candidates: candidates.len(),
            });
        }

        selected.sort_by(chronological);
        tracing::info!(
            "[Selector] Selected {} of {} clips ({:.2}s)",
            selected.len(),
            candidates.len(),
            running_duration
        );
        Ok(selected)
    }
}

fn score_key(clip: &HighlightClip) -> f32 {
    if clip.quality_score.is_finite() {
        clip.quality_score
    } else {
        0.0
    }
}

fn by_quality(a: &HighlightClip, b: &HighlightClip) -> Ordering {
    score_key(b)
        .total_cmp(&score_key(a))
        .then_with(|| a.start_time.total_cmp(&b.start_time))
        .then_with(|| a.source_ref.cmp(&b.source_ref))
}

fn chronological(a: &HighlightClip, b: &HighlightClip) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.start_time.total_cmp(&b.start_time))
        .then_with(|| a.source_ref.cmp(&b.source_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn clip(source: &str, start: f64, duration: f64, score: f32) -> HighlightClip {
        HighlightClip::new(source, start, start + duration, score)
    }

    #[test]
    fn test_overflowing_clips_are_skipped() {
        let candidates = vec![
            clip("v1", 0.0, 40.0, 0.9),
            clip("v2", 0.0, 40.0, 0.8),
            clip("v3", 0.0, 40.0, 0.7),
            clip("v4", 0.0, 40.0, 0.6),
        ];
        let budget = SelectionBudget::new(12, 100.0);
        let selected = HighlightSelector::new().select(&candidates, &budget).unwrap();

        let sources: Vec<&str> = selected.iter().map(|c| c.source_ref.as_str()).collect();
        assert_eq!(sources, vec!["v1", "v2"]);
        let total: f64 = selected.iter().map(|c| c.duration()).sum();
        assert_eq!(total, 80.0);
    }

    #[test]
    fn test_lower_quality_clip_may_still_fit() {
        let candidates = vec![
            clip("big", 0.0, 50.0, 0.9),
            clip("huge", 0.0, 60.0, 0.8),
            clip("small", 0.0, 10.0, 0.1),
        ];
        let budget = SelectionBudget::new(12, 65.0);
        let selected = HighlightSelector::new().select(&candidates, &budget).unwrap();

        let mut sources: Vec<&str> = selected.iter().map(|c| c.source_ref.as_str()).collect();
        sources.sort();
        assert_eq!(sources, vec!["big", "small"]);
    }

    #[test]
    fn test_count_limit() {
        let candidates: Vec<HighlightClip> = (0..10)
            .map(|i| clip("v", i as f64 * 10.0, 5.0, i as f32 / 10.0))
            .collect();
        let budget = SelectionBudget::new(3, 1000.0);
        let selected = HighlightSelector::new().select(&candidates, &budget).unwrap();

        assert_eq!(selected.len(), 3);
        // Top three by score, which are the last three by start time
        let starts: Vec<f64> = selected.iter().map(|c| c.start_time).collect();
        assert_eq!(starts, vec![70.0, 80.0, 90.0]);
    }

    #[test]
    fn test_output_is_chronological_not_by_score() {
        let day = |d: u32| Some(Utc.with_ymd_and_hms(2024, 5, d, 9, 0, 0).unwrap());
        let candidates = vec![
            clip("late", 0.0, 5.0, 0.9).with_date(day(20)),
            clip("early", 30.0, 5.0, 0.5).with_date(day(2)),
            clip("early", 10.0, 5.0, 0.7).with_date(day(2)),
            clip("undated", 50.0, 5.0, 0.6),
        ];
        let selected = HighlightSelector::new()
            .select(&candidates, &SelectionBudget::default())
            .unwrap();

        let order: Vec<(&str, f64)> = selected
            .iter()
            .map(|c| (c.source_ref.as_str(), c.start_time))
            .collect();
        assert_eq!(
            order,
            vec![
                ("undated", 50.0),
                ("early", 10.0),
                ("early", 30.0),
                ("late", 0.0)
            ]
        );
    }

    #[test]
    fn test_nothing_fits_is_explicit() {
        let candidates = vec![clip("v", 0.0, 200.0, 0.9)];
        let result = HighlightSelector::new().select(&candidates, &SelectionBudget::default());
        assert_eq!(
            result,
            Err(HighlightError::NothingSelected { candidates: 1 })
        );

        let result = HighlightSelector::new().select(&[], &SelectionBudget::default());
        assert_eq!(
            result,
            Err(HighlightError::NothingSelected { candidates: 0 })
        );
    }

    #[test]
    fn test_invalid_budget_rejected() {
        let candidates = vec![clip("v", 0.0, 5.0, 0.9)];
        let result = HighlightSelector::new().select(&candidates, &SelectionBudget::new(0, 10.0));
        assert!(matches!(result, Err(HighlightError::InvalidBudget { .. })));
    }

    #[test]
    fn test_budget_invariants_hold() {
        let candidates: Vec<HighlightClip> = (0..40)
            .map(|i| clip("v", i as f64, 3.0 + (i % 7) as f64, ((i * 37) % 100) as f32 / 100.0))
            .collect();
        let budget = SelectionBudget::new(6, 30.0);
        let selected = HighlightSelector::new().select(&candidates, &budget).unwrap();

        assert!(selected.len() <= 6);
        assert!(selected.iter().map(|c| c.duration()).sum::<f64>() <= 30.0);
    }
}
