//! # Thresholds
//!
//! Immutable tuning for the geometry gate, the form rules and the rep
//! detector. Every field has a documented default, and a threshold document
//! may set any subset of keys:
//!
//! ```toml
//! visibility_threshold = 0.5
//!
//! [squat]
//! knee_angle_target_range = { min = 80.0, max = 100.0 }
//! hip_angle_target_range = { min = 70.0, max = 100.0 }
//! torso_max_tilt = 30.0
//! cog_max_horizontal_offset = 0.07
//!
//! [rep_detection]
//! knee_down_threshold = 110.0
//! knee_up_threshold = 160.0
//! ideal_depth_min = 80.0
//! ideal_depth_max = 100.0
//! ```
//!
//! Parsing the document text is done by the application; this module only
//! defines the shape and the defaults.

use crate::primitives::DEFAULT_VISIBILITY_THRESHOLD;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ANGLE RANGE
// =============================================================================

/// Inclusive target range for a joint angle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }
}

const KNEE_TARGET_RANGE: AngleRange = AngleRange::new(80.0, 100.0);
const HIP_TARGET_RANGE: AngleRange = AngleRange::new(70.0, 100.0);

/// A range as written in a document; either bound may be left out.
#[derive(Deserialize)]
struct PartialRange {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl PartialRange {
    fn over(self, base: AngleRange) -> AngleRange {
        AngleRange::new(self.min.unwrap_or(base.min), self.max.unwrap_or(base.max))
    }
}

fn knee_target_range<'de, D: Deserializer<'de>>(d: D) -> Result<AngleRange, D::Error> {
    PartialRange::deserialize(d).map(|r| r.over(KNEE_TARGET_RANGE))
}

fn hip_target_range<'de, D: Deserializer<'de>>(d: D) -> Result<AngleRange, D::Error> {
    PartialRange::deserialize(d).map(|r| r.over(HIP_TARGET_RANGE))
}

// =============================================================================
// SQUAT TARGETS (Form Validator)
// =============================================================================

/// Limits used by the form rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatTargets {
    /// Target knee angle at depth. `depth` fires above `max`. Default 80–100°.
    #[serde(deserialize_with = "knee_target_range")]
    pub knee_angle_target_range: AngleRange,
    /// Target hip angle at depth. `hip_hinge` fires above `max`. Default 70–100°.
    #[serde(deserialize_with = "hip_target_range")]
    pub hip_angle_target_range: AngleRange,
    /// Largest allowed forward lean from vertical. Default 30°.
    pub torso_max_tilt: f64,
    /// Largest allowed `|cog.x - base.x|` as a fraction of frame width. Default 0.07.
    pub cog_max_horizontal_offset: f64,
    /// Per-knee collapse limit. The per-joint rules are off unless this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knee_min_angle: Option<f64>,
}

impl Default for SquatTargets {
    fn default() -> Self {
        Self {
            knee_angle_target_range: KNEE_TARGET_RANGE,
            hip_angle_target_range: HIP_TARGET_RANGE,
            torso_max_tilt: 30.0,
            cog_max_horizontal_offset: 0.07,
            knee_min_angle: None,
        }
    }
}

// =============================================================================
// REP DETECTION
// =============================================================================

/// Hysteresis band and depth window for the repetition state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepThresholds {
    /// Enter `Down` when the average knee angle drops below this. Default 110°.
    pub knee_down_threshold: f64,
    /// Leave `Down` (rep complete) when the angle rises above this. Default 160°.
    pub knee_up_threshold: f64,
    /// Bottom angle below this is "too deep". Default 80°.
    pub ideal_depth_min: f64,
    /// Bottom angle above this is "not deep enough". Default 100°.
    pub ideal_depth_max: f64,
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self {
            knee_down_threshold: 110.0,
            knee_up_threshold: 160.0,
            ideal_depth_min: 80.0,
            ideal_depth_max: 100.0,
        }
    }
}

impl RepThresholds {
    /// Width of the hysteresis band; positive when the thresholds are usable.
    #[must_use]
    pub fn band(&self) -> f64 {
        self.knee_up_threshold - self.knee_down_threshold
    }

    /// The inclusive bottom-angle window of a good rep.
    #[must_use]
    pub fn ideal_depth(&self) -> AngleRange {
        AngleRange::new(self.ideal_depth_min, self.ideal_depth_max)
    }
}

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum keypoint visibility for a landmark to count. Default 0.5.
    pub visibility_threshold: f64,
    pub squat: SquatTargets,
    pub rep_detection: RepThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            squat: SquatTargets::default(),
            rep_detection: RepThresholds::default(),
        }
    }
}

impl Thresholds {
    /// Override the visibility cutoff.
    #[must_use]
    pub fn with_visibility_threshold(mut self, threshold: f64) -> Self {
        self.visibility_threshold = threshold;
        self
    }

    /// Override the rep-detection band.
    #[must_use]
    pub fn with_rep_detection(mut self, rep_detection: RepThresholds) -> Self {
        self.rep_detection = rep_detection;
        self
    }

    /// Non-fatal problems with this configuration.
    ///
    /// The engine runs with any values; these are reported so a caller can
    /// log them. An empty list means the configuration is coherent.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        let mut out = Vec::new();
        let rep = &self.rep_detection;

        if rep.band() <= 0.0 {
            out.push(format!(
                "knee_down_threshold ({}) must be below knee_up_threshold ({}); rep detection will oscillate or never complete",
                rep.knee_down_threshold, rep.knee_up_threshold
            ));
        }
        if rep.ideal_depth_min > rep.ideal_depth_max {
            out.push(format!(
                "ideal_depth_min ({}) is above ideal_depth_max ({}); no rep can be classified as good",
                rep.ideal_depth_min, rep.ideal_depth_max
            ));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            out.push(format!(
                "visibility_threshold ({}) is outside [0, 1]",
                self.visibility_threshold
            ));
        }
        for (name, range) in [
            ("knee_angle_target_range", self.squat.knee_angle_target_range),
            ("hip_angle_target_range", self.squat.hip_angle_target_range),
        ] {
            if range.min > range.max {
                out.push(format!(
                    "{} has min ({}) above max ({})",
                    name, range.min, range.max
                ));
            }
        }
        if self.squat.cog_max_horizontal_offset < 0.0 {
            out.push(format!(
                "cog_max_horizontal_offset ({}) is negative",
                self.squat.cog_max_horizontal_offset
            ));
        }

        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_coherent() {
        let t = Thresholds::default();
        assert!(t.diagnostics().is_empty());
        assert!((t.visibility_threshold - 0.5).abs() < f64::EPSILON);
        assert!(t.rep_detection.band() > 0.0);
    }

    #[test]
    fn inverted_band_is_reported_not_rejected() {
        let t = Thresholds::default().with_rep_detection(RepThresholds {
            knee_down_threshold: 160.0,
            knee_up_threshold: 110.0,
            ..RepThresholds::default()
        });
        let diags = t.diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("knee_down_threshold"));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let json = r#"{"squat": {"torso_max_tilt": 45.0}, "rep_detection": {"knee_up_threshold": 150.0}}"#;
        let t: Thresholds = serde_json::from_str(json).expect("parse");
        assert!((t.squat.torso_max_tilt - 45.0).abs() < f64::EPSILON);
        assert!((t.squat.cog_max_horizontal_offset - 0.07).abs() < f64::EPSILON);
        assert!((t.rep_detection.knee_up_threshold - 150.0).abs() < f64::EPSILON);
        assert!((t.rep_detection.knee_down_threshold - 110.0).abs() < f64::EPSILON);
        assert_eq!(t.squat.knee_min_angle, None);
    }

    #[test]
    fn range_with_one_bound_keeps_the_other_default() {
        let json = r#"{"squat": {"knee_angle_target_range": {"max": 95.0}, "hip_angle_target_range": {"min": 60.0}}}"#;
        let t: Thresholds = serde_json::from_str(json).expect("parse");
        assert_eq!(t.squat.knee_angle_target_range, AngleRange::new(80.0, 95.0));
        assert_eq!(t.squat.hip_angle_target_range, AngleRange::new(60.0, 100.0));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let t: Thresholds = serde_json::from_str("{}").expect("parse");
        assert_eq!(t, Thresholds::default());
    }

    #[test]
    fn angle_range_is_inclusive() {
        let r = AngleRange::new(80.0, 100.0);
        assert!(r.contains(80.0));
        assert!(r.contains(100.0));
        assert!(!r.contains(100.5));
    }
}
