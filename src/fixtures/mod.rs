//! Fixture utilities for the deterministic CLI harness.
//!
//! A fixture is one JSON file describing a recording as a label stream,
//! plus optional expectations for the sequences the offline extractor
//! should find. Fixtures feed the scripted video source, so the offline
//! pipeline, the live trigger and composition can all be replayed without
//! decoding any video.

pub mod poses;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{ClassifiedFrame, PoseLabel};
use crate::compose::TrackGeometry;
use crate::config::TriggerConfig;
use crate::engine::backend::{ScriptedVideo, ScriptedVideoSource};
use crate::offline::{SourceRecording, SwingSequence};
use crate::trigger::{LiveTrigger, TriggerCommand};

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

fn default_interval() -> f64 {
    0.2
}

fn default_confidence() -> f32 {
    0.9
}

fn default_tolerance() -> f64 {
    0.05
}

/// One recording described as a label stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelFixture {
    pub name: String,
    /// Recording length in seconds
    pub duration: f64,
    /// Spacing of `labels`; ignored when `frames` is given
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Confidence assigned to every entry of `labels`
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub labels: Vec<PoseLabel>,
    /// Explicit frames, for fixtures needing irregular timing or confidence
    #[serde(default)]
    pub frames: Vec<ClassifiedFrame>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub geometry: Option<TrackGeometry>,
    /// Time the live session is activated during replay; defaults to the
    /// first frame
    #[serde(default)]
    pub session_start: Option<f64>,
    #[serde(default)]
    pub expect: Option<FixtureExpectations>,
}

impl LabelFixture {
    /// Frames in time order, expanded from `labels` when `frames` is empty
    pub fn classified_frames(&self) -> Vec<ClassifiedFrame> {
        if !self.frames.is_empty() {
            return self.frames.clone();
        }
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| ClassifiedFrame::new(i as f64 * self.interval, *label, self.confidence))
            .collect()
    }

    pub fn video(&self) -> ScriptedVideo {
        let video = ScriptedVideo::from_frames(self.classified_frames(), self.duration);
        match self.geometry {
            Some(geometry) => video.with_geometry(geometry),
            None => video,
        }
    }

    pub fn recording(&self) -> SourceRecording {
        SourceRecording {
            source_ref: self.name.clone(),
            course: self.course.clone(),
            date: self.date,
        }
    }

    /// Drive a fresh LiveTrigger through this fixture
    ///
    /// The session is activated at `session_start`, the post-end timer is
    /// polled at every frame and once more at the end of the recording,
    /// then the session is deactivated.
    pub fn replay_trigger(&self, config: TriggerConfig) -> Vec<TriggerCommand> {
        let frames = self.classified_frames();
        let start = self
            .session_start
            .or_else(|| frames.first().map(|f| f.timestamp))
            .unwrap_or(0.0);

        let mut trigger = LiveTrigger::new(config);
        let mut commands = trigger.set_active(true, start);

        for frame in frames.iter().filter(|f| f.timestamp >= start) {
            commands.extend(trigger.poll_timer(frame.timestamp));
            commands.extend(trigger.on_label(frame.timestamp, frame.label));
        }

        commands.extend(trigger.poll_timer(self.duration));
        commands.extend(trigger.set_active(false, self.duration));
        commands
    }
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    #[serde(default)]
    pub notes: Option<String>,
    pub sequences: Vec<ExpectedSequence>,
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &[SwingSequence]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (idx, expected) in self.sequences.iter().enumerate() {
            match actual.get(idx) {
                Some(sequence) if expected.matches(sequence) => {}
                other => failures.push(ExpectationFailure {
                    index: idx,
                    expected: Some(expected.clone()),
                    actual: other.copied(),
                }),
            }
        }

        for (idx, sequence) in actual.iter().enumerate().skip(self.sequences.len()) {
            failures.push(ExpectationFailure {
                index: idx,
                expected: None,
                actual: Some(*sequence),
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Expected sequence bounds and score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedSequence {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub quality_score: Option<f32>,
    #[serde(default = "default_tolerance")]
    pub tolerance_s: f64,
}

impl ExpectedSequence {
    fn matches(&self, actual: &SwingSequence) -> bool {
        let bounds = (actual.start_time - self.start_time).abs() <= self.tolerance_s
            && (actual.end_time - self.end_time).abs() <= self.tolerance_s;
        let score = self
            .quality_score
            .map_or(true, |q| (actual.quality_score - q).abs() < 1e-4);
        bounds && score
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug, Clone, Serialize)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "failures": self.failures })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug, Clone, Serialize)]
pub struct ExpectationFailure {
    pub index: usize,
    pub expected: Option<ExpectedSequence>,
    pub actual: Option<SwingSequence>,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List fixture names (file stems), sorted.
    pub fn discover(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.exists() {
            return Ok(names);
        }

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Load a fixture by name or path.
    pub fn load(&self, fixture: &str) -> Result<LabelFixture> {
        let path = self.resolve_fixture_path(fixture)?;
        let json =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let parsed: LabelFixture =
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;

        if !(parsed.duration.is_finite() && parsed.duration >= 0.0) {
            return Err(anyhow!(
                "Fixture {} has invalid duration {}",
                path.display(),
                parsed.duration
            ));
        }
        Ok(parsed)
    }

    pub fn load_all(&self, fixtures: &[String]) -> Result<Vec<LabelFixture>> {
        fixtures.iter().map(|name| self.load(name)).collect()
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Scripted video source serving every fixture under its name
pub fn video_library(fixtures: &[LabelFixture]) -> ScriptedVideoSource {
    fixtures
        .iter()
        .fold(ScriptedVideoSource::new(), |source, fixture| {
            source.with_video(fixture.name.clone(), fixture.video())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PoseLabel::{EndSwing, Other, Ready};
    use std::io::Write;

    fn fixture(labels: Vec<PoseLabel>, duration: f64) -> LabelFixture {
        LabelFixture {
            name: "test".to_string(),
            duration,
            interval: 0.2,
            confidence: 0.9,
            labels,
            frames: Vec::new(),
            course: None,
            date: None,
            geometry: None,
            session_start: None,
            expect: None,
        }
    }

    #[test]
    fn test_load_minimal_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swing.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "name": "swing",
                "duration": 10.0,
                "labels": ["Other", "Ready", "Ready", "EndSwing", "Other"],
                "course": "Links",
                "expect": {{ "sequences": [{{ "start_time": 0.2, "end_time": 0.8, "quality_score": 0.8 }}] }}
            }}"#
        )
        .unwrap();

        let catalog = FixtureCatalog::new(dir.path());
        assert_eq!(catalog.discover().unwrap(), vec!["swing".to_string()]);

        let loaded = catalog.load("swing").unwrap();
        assert_eq!(loaded.interval, 0.2);
        assert_eq!(loaded.classified_frames().len(), 5);
        assert_eq!(loaded.recording().course.as_deref(), Some("Links"));
        assert_eq!(loaded.expect.unwrap().sequences[0].tolerance_s, 0.05);
    }

    #[test]
    fn test_missing_fixture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FixtureCatalog::new(dir.path());

        assert!(catalog.load("nope").is_err());
        assert!(FixtureCatalog::new(dir.path().join("absent"))
            .discover()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_expectations_report_each_mismatch() {
        let expectations = FixtureExpectations {
            notes: None,
            sequences: vec![ExpectedSequence {
                start_time: 0.2,
                end_time: 0.8,
                quality_score: Some(0.8),
                tolerance_s: 0.05,
            }],
        };
        let good = SwingSequence {
            start_time: 0.2,
            end_time: 0.8,
            quality_score: 0.8,
        };

        assert!(expectations.verify(&[good]).is_ok());

        let diff = expectations.verify(&[]).unwrap_err();
        assert_eq!(diff.failures.len(), 1);
        assert!(diff.failures[0].actual.is_none());

        let diff = expectations.verify(&[good, good]).unwrap_err();
        assert_eq!(diff.failures.len(), 1);
        assert_eq!(diff.failures[0].index, 1);
        assert!(diff.to_json()["failures"].is_array());
    }

    #[test]
    fn test_replay_trigger_records_one_swing() {
        // 0.125 s frames: 48 Other (6 s, past the cooldown), a held address,
        // a held finish, then Other until the recording ends
        let mut labels = vec![Other; 48];
        labels.extend([Ready, Ready, Other, EndSwing, EndSwing]);
        labels.extend(vec![Other; 40]);
        let mut fixture = fixture(labels, 15.0);
        fixture.interval = 0.125;

        let commands = fixture.replay_trigger(TriggerConfig::default());

        let starts: Vec<f64> = commands
            .iter()
            .filter_map(|c| match c {
                TriggerCommand::StartClip { timestamp } => Some(*timestamp),
                _ => None,
            })
            .collect();
        let stops: Vec<f64> = commands
            .iter()
            .filter_map(|c| match c {
                TriggerCommand::StopClip { timestamp } => Some(*timestamp),
                _ => None,
            })
            .collect();

        assert_eq!(starts, vec![6.125]);
        // Finish held at 6.5 arms the timer, polled at the 10.5 frame
        assert_eq!(stops, vec![10.5]);
    }

    #[test]
    fn test_video_library_serves_each_fixture() {
        let a = fixture(vec![Ready, EndSwing, Other], 10.0);
        let mut b = fixture(vec![Other], 4.0);
        b.name = "other".to_string();

        let library = video_library(&[a, b]);

        use crate::engine::backend::VideoSource;
        assert_eq!(library.duration("test").unwrap(), 10.0);
        assert_eq!(library.duration("other").unwrap(), 4.0);
    }
}
