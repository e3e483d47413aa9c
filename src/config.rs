//! Configuration management for dynamic parameter tuning
//!
//! This module provides runtime configuration loading from JSON files so
//! trigger debounce windows, offline padding and selection budgets can be
//! tuned without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub features: FeatureConfig,
    pub trigger: TriggerConfig,
    pub offline: OfflineConfig,
    pub highlight: HighlightConfig,
    pub compose: ComposeConfig,
}

/// Feature extraction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Joints with confidence below this floor are treated as absent
    pub confidence_floor: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.1,
        }
    }
}

/// Live trigger debounce and cooldown parameters (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Continuous `Ready` run required to start a clip
    pub ready_hold_s: f64,
    /// Continuous `EndSwing` run required to arm the post-end timer
    pub end_hold_s: f64,
    /// Recording continues this long after the swing ends
    pub post_end_duration_s: f64,
    /// Minimum time since the last phase change before a new start
    pub cooldown_s: f64,
    /// Length of label history retained for run measurement
    pub history_window_s: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            ready_hold_s: 0.1,
            end_hold_s: 0.1,
            post_end_duration_s: 4.0,
            cooldown_s: 5.0,
            history_window_s: 2.5,
        }
    }
}

/// Offline sequence extraction parameters (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Interval between sampled frames when scanning a recording
    pub sample_interval_s: f64,
    /// Padding added before each detected sequence
    pub lead_padding_s: f64,
    /// Padding added after each detected sequence
    pub tail_padding_s: f64,
    /// Cap applied to a sequence still open when the stream ends
    pub max_open_sequence_s: f64,
    /// Videos at or below this length never get fallback clips
    pub fallback_min_video_s: f64,
    /// Length of each uniform fallback clip
    pub fallback_clip_s: f64,
    /// A trailing fallback remainder shorter than this is dropped
    pub fallback_min_tail_s: f64,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            sample_interval_s: 0.2,
            lead_padding_s: 1.0,
            tail_padding_s: 2.0,
            max_open_sequence_s: 6.0,
            fallback_min_video_s: 3.0,
            fallback_clip_s: 5.0,
            fallback_min_tail_s: 1.0,
        }
    }
}

/// Highlight selection budget defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub max_clips: usize,
    pub max_total_duration_s: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            max_clips: 12,
            max_total_duration_s: 120.0,
        }
    }
}

/// Timeline composition parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub frame_rate: u32,
    /// Emit a per-segment caption span
    pub show_segment_labels: bool,
    /// Text of the persistent corner mark, if any
    pub corner_mark: Option<String>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            show_segment_labels: true,
            corner_mark: Some("SWING".to_string()),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/swing_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.features.confidence_floor, 0.1);
        assert_eq!(config.trigger.ready_hold_s, 0.1);
        assert_eq!(config.trigger.post_end_duration_s, 4.0);
        assert_eq!(config.trigger.cooldown_s, 5.0);
        assert_eq!(config.offline.sample_interval_s, 0.2);
        assert_eq!(config.highlight.max_clips, 12);
        assert_eq!(config.highlight.max_total_duration_s, 120.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "trigger": { "cooldown_s": 2.0 } }"#).unwrap();
        assert_eq!(parsed.trigger.cooldown_s, 2.0);
        assert_eq!(parsed.trigger.ready_hold_s, 0.1);
        assert_eq!(parsed.offline.tail_padding_s, 2.0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AppConfig::load_from_file("/definitely/not/here.json");
        assert_eq!(config.compose.frame_rate, 30);
    }

    #[test]
    fn test_load_from_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "highlight": { "max_clips": 6 } }"#).unwrap();

        let config = AppConfig::load_from_file(&path);
        assert_eq!(config.highlight.max_clips, 6);
        assert_eq!(config.highlight.max_total_duration_s, 120.0);
    }
}
