//! # Core Type Definitions
//!
//! This module contains the shared value types of the Kinex engine:
//! - Raw input (`Keypoint`, `PoseFrame`)
//! - Visibility-gated geometry (`PointXY`)
//! - Repetition phase (`Stage`)
//! - Error types (`KinexError`)
//!
//! ## Absence Guarantees
//!
//! Nothing in this module panics on malformed input:
//! - Out-of-range landmark lookups return `None`
//! - Low-confidence keypoints gate to `None`
//! - Non-finite coordinates gate to `None`

use crate::landmarks::Landmark;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// KEYPOINT
// =============================================================================

/// One detected landmark as produced by the pose estimator.
///
/// Coordinates are normalized to the frame: `x` grows to the right and `y`
/// grows downward, both nominally in `[0, 1]`. `z` is relative depth and is
/// carried through but not used by the 2D geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Landmark index as reported by the producer.
    #[serde(default)]
    pub id: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Detection confidence in `[0, 1]`.
    pub visibility: f64,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(id: u32, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            visibility,
        }
    }

    /// Project to a 2D point if this keypoint is visible enough.
    ///
    /// A keypoint passes the gate when `visibility >= threshold` and both
    /// coordinates are finite.
    #[must_use]
    pub fn gated(&self, threshold: f64) -> Option<PointXY> {
        if self.visibility >= threshold && self.x.is_finite() && self.y.is_finite() {
            Some(PointXY::new(self.x, self.y))
        } else {
            None
        }
    }
}

// =============================================================================
// POINT
// =============================================================================

/// A 2D point in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PointXY {
    pub x: f64,
    pub y: f64,
}

impl PointXY {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Vector from `self` to `to`, as a point.
    #[must_use]
    pub fn to(self, to: Self) -> Self {
        Self::new(to.x - self.x, to.y - self.y)
    }
}

// =============================================================================
// POSE FRAME
// =============================================================================

/// One vision cycle: the ordered keypoints of a single person.
///
/// Keypoints are addressed by position in the landmark scheme, not by their
/// `id` field. A frame shorter than the scheme yields absent landmarks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FrameDocument")]
pub struct PoseFrame {
    /// Capture time in milliseconds since the Unix epoch, if the producer set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    /// Create a frame without a capture timestamp.
    #[must_use]
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            timestamp: None,
            keypoints,
        }
    }

    /// Attach a capture timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Raw keypoint for a landmark, if the frame is long enough.
    #[must_use]
    pub fn keypoint(&self, landmark: Landmark) -> Option<&Keypoint> {
        self.keypoints.get(landmark.index())
    }

    /// Visibility-gated 2D position of a landmark.
    #[must_use]
    pub fn point(&self, landmark: Landmark, threshold: f64) -> Option<PointXY> {
        self.keypoint(landmark).and_then(|kp| kp.gated(threshold))
    }

    /// True when the frame carries no keypoints at all (no person detected).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Accepted wire shapes for a frame: an object with keypoints or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum FrameDocument {
    Object {
        #[serde(default)]
        timestamp: Option<i64>,
        keypoints: Vec<Keypoint>,
    },
    Bare(Vec<Keypoint>),
}

impl From<FrameDocument> for PoseFrame {
    fn from(doc: FrameDocument) -> Self {
        match doc {
            FrameDocument::Object {
                timestamp,
                keypoints,
            } => Self {
                timestamp,
                keypoints,
            },
            FrameDocument::Bare(keypoints) => Self::new(keypoints),
        }
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// Repetition phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Standing / knees extended. Initial state.
    #[default]
    Up,
    /// Inside the bottom half of the squat.
    Down,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur at the edges of the Kinex system.
///
/// The analysis path itself never returns these: missing data is modelled as
/// `Option`. Errors only come from decoding input, loading configuration and
/// the external collaborators.
#[derive(Debug, Error)]
pub enum KinexError {
    /// A pose frame document could not be decoded.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// A threshold document could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The rephrasing collaborator failed.
    #[error("Rephrase failed: {0}")]
    RephraseError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_uses_inclusive_threshold() {
        let kp = Keypoint::new(0, 0.5, 0.5, 0.0, 0.5);
        assert!(kp.gated(0.5).is_some());
        assert!(kp.gated(0.51).is_none());
    }

    #[test]
    fn gate_rejects_non_finite_coordinates() {
        let kp = Keypoint::new(0, f64::NAN, 0.5, 0.0, 1.0);
        assert!(kp.gated(0.2).is_none());
    }

    #[test]
    fn short_frame_yields_absent_landmarks() {
        let frame = PoseFrame::new(vec![Keypoint::new(0, 0.5, 0.1, 0.0, 1.0)]);
        assert!(frame.point(Landmark::Nose, 0.5).is_some());
        assert!(frame.point(Landmark::LeftHip, 0.5).is_none());
    }

    #[test]
    fn frame_decodes_object_and_bare_forms() {
        let object = r#"{"timestamp": 42, "keypoints": [{"x": 0.1, "y": 0.2, "visibility": 0.9}]}"#;
        let frame: PoseFrame = serde_json::from_str(object).expect("object form");
        assert_eq!(frame.timestamp, Some(42));
        assert_eq!(frame.keypoints.len(), 1);

        let bare = r#"[{"id": 0, "x": 0.1, "y": 0.2, "z": -0.3, "visibility": 0.9}]"#;
        let frame: PoseFrame = serde_json::from_str(bare).expect("bare form");
        assert_eq!(frame.timestamp, None);
        assert!((frame.keypoints[0].z + 0.3).abs() < 1e-12);
    }

    #[test]
    fn stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Down).expect("ser"), "\"down\"");
        assert_eq!(Stage::default(), Stage::Up);
    }

    #[test]
    fn midpoint_and_vector() {
        let a = PointXY::new(0.0, 0.0);
        let b = PointXY::new(2.0, 4.0);
        assert_eq!(a.midpoint(b), PointXY::new(1.0, 2.0));
        assert_eq!(a.to(b), PointXY::new(2.0, 4.0));
    }
}
