//! # Geometry Engine
//!
//! Joint angles and balance estimates from a single pose frame.
//!
//! Every landmark passes through the visibility gate before use. Anything
//! missing or degenerate collapses to an absent value; nothing here fails.

use crate::landmarks::{ANKLES, HIPS, KNEES, Landmark, LandmarkPair, SHOULDERS};
use crate::primitives::{
    ANKLE_SEGMENT_WEIGHT, DEFAULT_VISIBILITY_THRESHOLD, HIP_SEGMENT_WEIGHT, KNEE_SEGMENT_WEIGHT,
    NEUTRAL_ANGLE, SHOULDER_SEGMENT_WEIGHT, VERTICAL_REFERENCE,
};
use crate::types::{PointXY, PoseFrame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ANGLE PRIMITIVE
// =============================================================================

/// Angle between two vectors in degrees, or `None` if either has zero length.
fn vector_angle(v1: PointXY, v2: PointXY) -> Option<f64> {
    let mag1 = v1.x.hypot(v1.y);
    let mag2 = v2.x.hypot(v2.y);

    if mag1 == 0.0 || mag2 == 0.0 || !mag1.is_finite() || !mag2.is_finite() {
        return None;
    }

    // Normalise first: `mag1 * mag2` overflows or underflows at extreme scales.
    let cos = (v1.x / mag1) * (v2.x / mag2) + (v1.y / mag1) * (v2.y / mag2);
    if !cos.is_finite() {
        return None;
    }
    Some(cos.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Angle at `b` between rays `b→a` and `b→c`, in degrees within `[0, 180]`.
///
/// Returns `None` when `a` or `c` coincides with `b`.
#[must_use]
pub fn angle_at(a: PointXY, b: PointXY, c: PointXY) -> Option<f64> {
    vector_angle(b.to(a), b.to(c))
}

// =============================================================================
// ANGLE SET
// =============================================================================

/// The joint angles tracked for a squat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleName {
    KneeLeft,
    KneeRight,
    HipLeft,
    HipRight,
    TorsoTilt,
}

impl AngleName {
    pub const ALL: [AngleName; 5] = [
        AngleName::KneeLeft,
        AngleName::KneeRight,
        AngleName::HipLeft,
        AngleName::HipRight,
        AngleName::TorsoTilt,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleName::KneeLeft => "knee_left",
            AngleName::KneeRight => "knee_right",
            AngleName::HipLeft => "hip_left",
            AngleName::HipRight => "hip_right",
            AngleName::TorsoTilt => "torso_tilt",
        }
    }
}

impl std::fmt::Display for AngleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Angles computed for one frame. A name is present only if every
/// contributing landmark was visible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AngleSet(BTreeMap<AngleName, f64>);

impl AngleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an angle if it was computed.
    pub fn set(&mut self, name: AngleName, angle: Option<f64>) {
        if let Some(angle) = angle {
            self.0.insert(name, angle);
        }
    }

    #[must_use]
    pub fn get(&self, name: AngleName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AngleName, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Mean of a left/right pair with a missing side read as fully extended.
    ///
    /// `None` only when both sides are missing.
    #[must_use]
    pub fn average_pair(&self, left: AngleName, right: AngleName) -> Option<f64> {
        match (self.get(left), self.get(right)) {
            (None, None) => None,
            (l, r) => Some((l.unwrap_or(NEUTRAL_ANGLE) + r.unwrap_or(NEUTRAL_ANGLE)) / 2.0),
        }
    }

    /// Average knee angle, the single input of the rep state machine.
    #[must_use]
    pub fn average_knee_angle(&self) -> Option<f64> {
        self.average_pair(AngleName::KneeLeft, AngleName::KneeRight)
    }

    /// Average hip angle.
    #[must_use]
    pub fn average_hip_angle(&self) -> Option<f64> {
        self.average_pair(AngleName::HipLeft, AngleName::HipRight)
    }
}

impl FromIterator<(AngleName, f64)> for AngleSet {
    fn from_iter<I: IntoIterator<Item = (AngleName, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// BALANCE ESTIMATE
// =============================================================================

/// Center of gravity and base of support for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceEstimate {
    pub center_of_gravity: Option<PointXY>,
    pub base_of_support: Option<PointXY>,
}

impl BalanceEstimate {
    /// `|cog.x - base.x|`, if both points are known.
    #[must_use]
    pub fn horizontal_offset(&self) -> Option<f64> {
        match (self.center_of_gravity, self.base_of_support) {
            (Some(cog), Some(base)) => Some((cog.x - base.x).abs()),
            _ => None,
        }
    }
}

/// Body segments contributing to the center of gravity, with their weights.
const COG_SEGMENTS: [(LandmarkPair, f64); 4] = [
    (HIPS, HIP_SEGMENT_WEIGHT),
    (SHOULDERS, SHOULDER_SEGMENT_WEIGHT),
    (KNEES, KNEE_SEGMENT_WEIGHT),
    (ANKLES, ANKLE_SEGMENT_WEIGHT),
];

// =============================================================================
// GEOMETRY ENGINE
// =============================================================================

/// Computes angles and balance with a fixed visibility cutoff.
///
/// The engine holds no per-frame state, so a single instance can be shared
/// across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryEngine {
    visibility_threshold: f64,
}

impl Default for GeometryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

impl GeometryEngine {
    #[must_use]
    pub const fn new(visibility_threshold: f64) -> Self {
        Self {
            visibility_threshold,
        }
    }

    #[must_use]
    pub const fn visibility_threshold(&self) -> f64 {
        self.visibility_threshold
    }

    fn point(&self, frame: &PoseFrame, landmark: Landmark) -> Option<PointXY> {
        frame.point(landmark, self.visibility_threshold)
    }

    fn midpoint(&self, frame: &PoseFrame, (left, right): LandmarkPair) -> Option<PointXY> {
        Some(self.point(frame, left)?.midpoint(self.point(frame, right)?))
    }

    fn joint(&self, frame: &PoseFrame, a: Landmark, b: Landmark, c: Landmark) -> Option<f64> {
        angle_at(
            self.point(frame, a)?,
            self.point(frame, b)?,
            self.point(frame, c)?,
        )
    }

    /// Forward lean: angle between vertical and the hip-to-shoulder midline.
    fn torso_tilt(&self, frame: &PoseFrame) -> Option<f64> {
        let mid_hip = self.midpoint(frame, HIPS)?;
        let mid_shoulder = self.midpoint(frame, SHOULDERS)?;
        let (vx, vy) = VERTICAL_REFERENCE;
        vector_angle(PointXY::new(vx, vy), mid_hip.to(mid_shoulder))
    }

    /// Compute the knee, hip and torso angles present in this frame.
    #[must_use]
    pub fn compute_angles(&self, frame: &PoseFrame) -> AngleSet {
        use Landmark::{
            LeftAnkle, LeftHip, LeftKnee, LeftShoulder, RightAnkle, RightHip, RightKnee,
            RightShoulder,
        };

        let mut angles = AngleSet::new();
        angles.set(
            AngleName::KneeLeft,
            self.joint(frame, LeftHip, LeftKnee, LeftAnkle),
        );
        angles.set(
            AngleName::KneeRight,
            self.joint(frame, RightHip, RightKnee, RightAnkle),
        );
        angles.set(
            AngleName::HipLeft,
            self.joint(frame, LeftShoulder, LeftHip, LeftKnee),
        );
        angles.set(
            AngleName::HipRight,
            self.joint(frame, RightShoulder, RightHip, RightKnee),
        );
        angles.set(AngleName::TorsoTilt, self.torso_tilt(frame));
        angles
    }

    /// Estimate center of gravity and base of support.
    ///
    /// Segment weights are renormalized over the segments that are visible.
    /// With no visible segment both fields are `None`.
    #[must_use]
    pub fn compute_balance(&self, frame: &PoseFrame) -> BalanceEstimate {
        let mut total_weight = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;

        for (pair, weight) in COG_SEGMENTS {
            if let Some(mid) = self.midpoint(frame, pair) {
                sum_x += mid.x * weight;
                sum_y += mid.y * weight;
                total_weight += weight;
            }
        }

        if total_weight <= 0.0 {
            return BalanceEstimate::default();
        }

        BalanceEstimate {
            center_of_gravity: Some(PointXY::new(sum_x / total_weight, sum_y / total_weight)),
            base_of_support: self.midpoint(frame, ANKLES),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LANDMARK_COUNT;
    use crate::types::Keypoint;

    fn p(x: f64, y: f64) -> PointXY {
        PointXY::new(x, y)
    }

    fn frame_with(points: &[(Landmark, f64, f64, f64)]) -> PoseFrame {
        let mut keypoints: Vec<Keypoint> = (0..LANDMARK_COUNT)
            .map(|i| Keypoint::new(i as u32, 0.0, 0.0, 0.0, 0.0))
            .collect();
        for &(landmark, x, y, vis) in points {
            keypoints[landmark.index()] = Keypoint::new(landmark.index() as u32, x, y, 0.0, vis);
        }
        PoseFrame::new(keypoints)
    }

    #[test]
    fn straight_line_is_180() {
        let angle = angle_at(p(0.0, 0.0), p(0.5, 0.0), p(1.0, 0.0)).expect("angle");
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn right_angle_is_90() {
        let angle = angle_at(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5)).expect("angle");
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn same_direction_is_0() {
        let angle = angle_at(p(1.0, 1.0), p(0.0, 0.0), p(2.0, 2.0)).expect("angle");
        assert!(angle.abs() < 1e-4);
    }

    #[test]
    fn zero_length_ray_is_absent() {
        assert_eq!(angle_at(p(0.3, 0.3), p(0.3, 0.3), p(0.5, 0.1)), None);
        assert_eq!(angle_at(p(0.5, 0.1), p(0.3, 0.3), p(0.3, 0.3)), None);
    }

    #[test]
    fn extreme_scales_stay_finite() {
        let huge = angle_at(p(1e200, 0.0), p(0.0, 0.0), p(1e200, 1e200)).expect("huge");
        assert!((huge - 45.0).abs() < 1e-9);
        let tiny = angle_at(p(1e-200, 0.0), p(0.0, 0.0), p(0.0, 1e-200)).expect("tiny");
        assert!((tiny - 90.0).abs() < 1e-9);
    }

    #[test]
    fn huge_coordinates_keep_knee_angle_valid() {
        let frame = frame_with(&[
            (Landmark::LeftHip, 0.0, 0.0, 0.9),
            (Landmark::LeftKnee, 1e200, 0.0, 0.9),
            (Landmark::LeftAnkle, 1e200, 1e200, 0.9),
        ]);
        let angles = GeometryEngine::default().compute_angles(&frame);
        let knee = angles.get(AngleName::KneeLeft).expect("knee");
        assert!((knee - 90.0).abs() < 1e-9);
        assert_eq!(angles.average_knee_angle(), Some(135.0));
    }

    #[test]
    fn standing_pose_angles() {
        let frame = frame_with(&[
            (Landmark::LeftShoulder, 0.45, 0.2, 0.9),
            (Landmark::RightShoulder, 0.55, 0.2, 0.9),
            (Landmark::LeftHip, 0.45, 0.5, 0.9),
            (Landmark::RightHip, 0.55, 0.5, 0.9),
            (Landmark::LeftKnee, 0.45, 0.7, 0.9),
            (Landmark::RightKnee, 0.55, 0.7, 0.9),
            (Landmark::LeftAnkle, 0.45, 0.9, 0.9),
            (Landmark::RightAnkle, 0.55, 0.9, 0.9),
        ]);
        let angles = GeometryEngine::default().compute_angles(&frame);

        assert_eq!(angles.len(), 5);
        for name in [
            AngleName::KneeLeft,
            AngleName::KneeRight,
            AngleName::HipLeft,
            AngleName::HipRight,
        ] {
            let a = angles.get(name).expect("present");
            assert!((a - 180.0).abs() < 1e-6, "{name} = {a}");
        }
        let tilt = angles.get(AngleName::TorsoTilt).expect("tilt");
        assert!(tilt.abs() < 1e-6);
    }

    #[test]
    fn forward_lean_is_measured_from_vertical() {
        // Shoulders displaced forward by the same amount they sit above the hips.
        let frame = frame_with(&[
            (Landmark::LeftShoulder, 0.6, 0.3, 0.9),
            (Landmark::RightShoulder, 0.6, 0.3, 0.9),
            (Landmark::LeftHip, 0.4, 0.5, 0.9),
            (Landmark::RightHip, 0.4, 0.5, 0.9),
        ]);
        let angles = GeometryEngine::default().compute_angles(&frame);
        let tilt = angles.get(AngleName::TorsoTilt).expect("tilt");
        assert!((tilt - 45.0).abs() < 1e-6);
        assert_eq!(angles.get(AngleName::KneeLeft), None);
    }

    #[test]
    fn occluded_ankle_drops_only_that_knee() {
        let frame = frame_with(&[
            (Landmark::LeftHip, 0.45, 0.5, 0.9),
            (Landmark::RightHip, 0.55, 0.5, 0.9),
            (Landmark::LeftKnee, 0.45, 0.7, 0.9),
            (Landmark::RightKnee, 0.55, 0.7, 0.9),
            (Landmark::LeftAnkle, 0.45, 0.9, 0.9),
            (Landmark::RightAnkle, 0.55, 0.9, 0.1),
        ]);
        let angles = GeometryEngine::default().compute_angles(&frame);
        assert!(angles.get(AngleName::KneeLeft).is_some());
        assert!(angles.get(AngleName::KneeRight).is_none());
    }

    #[test]
    fn visibility_cutoff_is_configurable() {
        let frame = frame_with(&[
            (Landmark::LeftHip, 0.45, 0.5, 0.3),
            (Landmark::LeftKnee, 0.45, 0.7, 0.3),
            (Landmark::LeftAnkle, 0.45, 0.9, 0.3),
        ]);
        assert!(GeometryEngine::new(0.5).compute_angles(&frame).is_empty());
        assert!(
            GeometryEngine::new(0.2)
                .compute_angles(&frame)
                .get(AngleName::KneeLeft)
                .is_some()
        );
    }

    #[test]
    fn all_invisible_yields_nothing() {
        let frame = frame_with(&[]);
        let engine = GeometryEngine::default();
        assert!(engine.compute_angles(&frame).is_empty());
        assert_eq!(engine.compute_balance(&frame), BalanceEstimate::default());
    }

    #[test]
    fn balance_uses_segment_weights() {
        let frame = frame_with(&[
            (Landmark::LeftShoulder, 0.4, 0.2, 0.9),
            (Landmark::RightShoulder, 0.6, 0.2, 0.9),
            (Landmark::LeftHip, 0.4, 0.5, 0.9),
            (Landmark::RightHip, 0.6, 0.5, 0.9),
            (Landmark::LeftKnee, 0.3, 0.7, 0.9),
            (Landmark::RightKnee, 0.5, 0.7, 0.9),
            (Landmark::LeftAnkle, 0.3, 0.9, 0.9),
            (Landmark::RightAnkle, 0.5, 0.9, 0.9),
        ]);
        let balance = GeometryEngine::default().compute_balance(&frame);
        let cog = balance.center_of_gravity.expect("cog");
        let base = balance.base_of_support.expect("base");

        // (0.5*25 + 0.5*25 + 0.4*15 + 0.4*5) / 70
        assert!((cog.x - 33.0 / 70.0).abs() < 1e-9);
        assert!((base.x - 0.4).abs() < 1e-9);
        assert!((base.y - 0.9).abs() < 1e-9);
    }

    #[test]
    fn balance_renormalizes_over_present_segments() {
        let frame = frame_with(&[
            (Landmark::LeftShoulder, 0.4, 0.2, 0.9),
            (Landmark::RightShoulder, 0.6, 0.2, 0.9),
            (Landmark::LeftHip, 0.4, 0.6, 0.9),
            (Landmark::RightHip, 0.6, 0.6, 0.9),
        ]);
        let balance = GeometryEngine::default().compute_balance(&frame);
        let cog = balance.center_of_gravity.expect("cog");
        assert!((cog.x - 0.5).abs() < 1e-9);
        assert!((cog.y - 0.4).abs() < 1e-9);
        assert_eq!(balance.base_of_support, None);
        assert_eq!(balance.horizontal_offset(), None);
    }

    #[test]
    fn average_pair_reads_missing_side_as_extended() {
        let angles: AngleSet = [(AngleName::KneeLeft, 90.0)].into_iter().collect();
        assert_eq!(angles.average_knee_angle(), Some(135.0));
        assert_eq!(angles.average_hip_angle(), None);
    }

    #[test]
    fn angle_set_serializes_with_snake_case_keys() {
        let angles: AngleSet = [(AngleName::TorsoTilt, 12.5)].into_iter().collect();
        let json = serde_json::to_string(&angles).expect("ser");
        assert_eq!(json, r#"{"torso_tilt":12.5}"#);
    }
}
