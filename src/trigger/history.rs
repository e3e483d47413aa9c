// LabelHistory - bounded window of recent (timestamp, label) pairs
//
// Entries older than the window (relative to the newest timestamp seen) are
// pruned on push. Late frames are appended as-is; run measurement compares
// labels only, so out-of-order timestamps cannot break it.

use std::collections::VecDeque;

use crate::analysis::PoseLabel;

#[derive(Debug, Clone)]
pub struct LabelHistory {
    entries: VecDeque<(f64, PoseLabel)>,
    window_s: f64,
    newest: Option<f64>,
}

impl LabelHistory {
    pub fn new(window_s: f64) -> Self {
        Self {
            entries: VecDeque::new(),
            window_s,
            newest: None,
        }
    }

    pub fn push(&mut self, timestamp: f64, label: PoseLabel) {
        self.entries.push_back((timestamp, label));
        let newest = self.newest.map_or(timestamp, |n| n.max(timestamp));
        self.newest = Some(newest);

        let horizon = newest - self.window_s;
        while let Some(&(t, _)) = self.entries.front() {
            if t < horizon && self.entries.len() > 1 {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Length of the most recent uninterrupted run of `label`
    ///
    /// Walks backward from the newest entry while labels match and returns
    /// `now - t` for the oldest entry of that run. Returns 0 when the newest
    /// entry carries a different label or the history is empty.
    pub fn continuous_duration(&self, label: PoseLabel, now: f64) -> f64 {
        let mut run_start = None;
        for &(t, l) in self.entries.iter().rev() {
            if l != label {
                break;
            }
            run_start = Some(t);
        }
        run_start.map_or(0.0, |t| (now - t).max(0.0))
    }

    pub fn last(&self) -> Option<(f64, PoseLabel)> {
        self.entries.back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.newest = None;
    }
}
