//! # Engine Primitives
//!
//! Fixed constants of the Kinex engine.
//!
//! Tunable limits live in [`crate::thresholds`]; the values here are part of
//! the model itself and do not change at runtime.

/// Neutral knee/hip angle in degrees: a fully extended joint.
///
/// - Substituted for a missing side when averaging left/right angles
/// - The reset value of the per-rep minimum knee angle
pub const NEUTRAL_ANGLE: f64 = 180.0;

/// Default visibility cutoff for gating keypoints.
///
/// A keypoint contributes to geometry only when `visibility >= cutoff`.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Permissive visibility cutoff.
///
/// Lower cutoffs compute more angles from less-confident keypoints. Useful
/// for side-on camera placements where the far leg is partially occluded.
pub const PERMISSIVE_VISIBILITY_THRESHOLD: f64 = 0.2;

/// Reference "up" direction in image coordinates (y grows downward).
pub const VERTICAL_REFERENCE: (f64, f64) = (0.0, -1.0);

// =============================================================================
// CENTER-OF-GRAVITY SEGMENT WEIGHTS
// =============================================================================

/// Weight of the hip midpoint in the center-of-gravity estimate.
pub const HIP_SEGMENT_WEIGHT: f64 = 25.0;

/// Weight of the shoulder midpoint in the center-of-gravity estimate.
pub const SHOULDER_SEGMENT_WEIGHT: f64 = 25.0;

/// Weight of the knee midpoint in the center-of-gravity estimate.
pub const KNEE_SEGMENT_WEIGHT: f64 = 15.0;

/// Weight of the ankle midpoint in the center-of-gravity estimate.
pub const ANKLE_SEGMENT_WEIGHT: f64 = 5.0;

// =============================================================================
// FEEDBACK TEXT
// =============================================================================

/// Separator used when joining several active feedback messages.
pub const FEEDBACK_SEPARATOR: &str = " | ";

/// Coaching text shown before the first completed rep.
pub const INITIAL_COACH_TEXT: &str = "Start your first set!";

/// Coaching text returned for an empty correction list.
pub const NEUTRAL_COACH_TEXT: &str =
    "Great form! Keep up the amazing work. Ready for the next set?";
