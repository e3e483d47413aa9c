// Types module - fixed-length pose feature vector
//
// Layout (37 floats):
// - 0..28:  14 joints × (x, y), pelvis-relative and torso-scale-normalized
// - 28..35: shoulder-line, hip-line, trunk pitch, elbow flex L/R, knee flex L/R
// - 35..37: mean wrist height above shoulders, wrist-pair separation

/// Number of floats in every feature vector
pub const FEATURE_LEN: usize = 37;

/// Index of the first derived (angle) feature
pub const DERIVED_OFFSET: usize = 28;

/// Index of the first hand feature
pub const HAND_OFFSET: usize = 35;

pub const SHOULDER_LINE: usize = DERIVED_OFFSET;
pub const HIP_LINE: usize = DERIVED_OFFSET + 1;
pub const TRUNK_PITCH: usize = DERIVED_OFFSET + 2;
pub const LEFT_ELBOW_FLEX: usize = DERIVED_OFFSET + 3;
pub const RIGHT_ELBOW_FLEX: usize = DERIVED_OFFSET + 4;
pub const LEFT_KNEE_FLEX: usize = DERIVED_OFFSET + 5;
pub const RIGHT_KNEE_FLEX: usize = DERIVED_OFFSET + 6;
pub const WRIST_HEIGHT: usize = HAND_OFFSET;
pub const WRIST_SEPARATION: usize = HAND_OFFSET + 1;

/// Normalized numeric encoding of one frame's pose
///
/// Always exactly [`FEATURE_LEN`] finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_LEN],
}

impl FeatureVector {
    /// All-zero vector, used for sensor gaps
    pub fn zeros() -> Self {
        Self {
            values: [0.0; FEATURE_LEN],
        }
    }

    /// Build from raw values, replacing any non-finite entry with zero
    pub fn from_values(mut values: [f32; FEATURE_LEN]) -> Self {
        for value in values.iter_mut() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_holds_every_feature() {
        let mut values = [0.25_f32; FEATURE_LEN];
        values[WRIST_SEPARATION] = f32::NAN;

        let vector = FeatureVector::from_values(values);

        assert_eq!(vector.as_slice().len(), FEATURE_LEN);
        assert_eq!(vector.get(SHOULDER_LINE), 0.25);
        assert_eq!(vector.get(WRIST_SEPARATION), 0.0);
        assert_eq!(vector.get(FEATURE_LEN), 0.0);
        assert_eq!(FeatureVector::default(), FeatureVector::zeros());
    }
}
