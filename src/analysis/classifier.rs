// Classifier - pose classifier port and the rule-based fallback
//
// The trained classifier lives outside this crate and is reached through the
// PoseClassifier trait. ClassifierSlot is what the pipelines actually call:
// it holds an optional classifier that the host can load or unload at
// runtime and degrades to (Other, 0.0) when nothing is loaded.
//
// HeuristicClassifier reads the two hand features:
// - Address: wrists together and well below the shoulders => Ready
// - Finish: wrists raised above the shoulders => EndSwing
// - Everything else => Other

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::analysis::PoseLabel;
use crate::error::{log_pose_error, PoseError};
use crate::pose::features::{FeatureVector, WRIST_HEIGHT, WRIST_SEPARATION};
use crate::telemetry::{self, DiagnosticError};

/// Contract for any pose classifier implementation
///
/// Implementations must accept an all-zero vector and should return a
/// confidence in 0.0-1.0. They are assumed to be slow; callers invoke them
/// at most once per sampled frame.
pub trait PoseClassifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> (PoseLabel, f32);
}

/// Hot-swappable classifier holder
///
/// Clones share the same slot, so a classifier loaded through one handle is
/// visible to every lane and scanner holding a clone.
#[derive(Clone, Default)]
pub struct ClassifierSlot {
    inner: Arc<RwLock<Option<Arc<dyn PoseClassifier>>>>,
    warned_missing: Arc<AtomicBool>,
}

impl ClassifierSlot {
    /// Create an empty slot; every frame classifies as (Other, 0.0)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: Arc<dyn PoseClassifier>) -> Self {
        let slot = Self::default();
        slot.load(classifier);
        slot
    }

    /// Install or replace the classifier
    pub fn load(&self, classifier: Arc<dyn PoseClassifier>) {
        match self.inner.write() {
            Ok(mut guard) => {
                *guard = Some(classifier);
                self.warned_missing.store(false, Ordering::Relaxed);
                tracing::info!("[Classifier] Classifier loaded");
            }
            Err(_) => log_pose_error(
                &PoseError::LockPoisoned {
                    component: "ClassifierSlot".to_string(),
                },
                "ClassifierSlot::load",
            ),
        }
    }

    /// Remove the classifier, degrading to (Other, 0.0)
    pub fn unload(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Classify one frame's features
    ///
    /// # Returns
    /// Tuple of (PoseLabel, confidence 0.0-1.0). Never fails: a missing
    /// classifier or a poisoned lock yields (Other, 0.0).
    pub fn classify(&self, features: &FeatureVector) -> (PoseLabel, f32) {
        let classifier = match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(_) => {
                log::error!("Classifier slot lock poisoned in classify");
                return (PoseLabel::Other, 0.0);
            }
        };

        match classifier {
            Some(classifier) => {
                let (label, confidence) = classifier.classify(features);
                let confidence = if confidence.is_finite() {
                    confidence.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (label, confidence)
            }
            None => {
                if !self.warned_missing.swap(true, Ordering::Relaxed) {
                    log_pose_error(&PoseError::ClassifierUnavailable, "ClassifierSlot::classify");
                    telemetry::hub().record_error(
                        DiagnosticError::ClassifierUnavailable,
                        "no classifier loaded",
                    );
                }
                (PoseLabel::Other, 0.0)
            }
        }
    }
}

impl std::fmt::Debug for ClassifierSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSlot")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Rule-based classifier over the hand features
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    /// Wrist height (torso units) below which hands count as at address
    pub address_height: f32,
    /// Maximum wrist separation (torso units) for hands gripping the club
    pub grip_separation: f32,
    /// Wrist height above which hands count as in the finish
    pub finish_height: f32,
}

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self {
            address_height: -0.3,
            grip_separation: 0.35,
            finish_height: 0.1,
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseClassifier for HeuristicClassifier {
    fn classify(&self, features: &FeatureVector) -> (PoseLabel, f32) {
        if features.is_zero() {
            return (PoseLabel::Other, 0.0);
        }

        let height = features.get(WRIST_HEIGHT);
        let separation = features.get(WRIST_SEPARATION);

        if height < self.address_height && separation < self.grip_separation {
            // Margin past the threshold raises confidence
            let margin = self.address_height - height;
            return (PoseLabel::Ready, (0.5 + margin).clamp(0.5, 1.0));
        }

        if height > self.finish_height {
            let margin = height - self.finish_height;
            return (PoseLabel::EndSwing, (0.5 + margin).clamp(0.5, 1.0));
        }

        (PoseLabel::Other, 0.6)
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
