//! # Form Validator
//!
//! Rule-based technique checks over one frame's angles and balance.
//!
//! - Stateless: output depends only on the arguments
//! - Every rule runs on every call; no rule short-circuits another
//! - A rule whose inputs are absent is skipped, never reported as violated

use crate::geometry::{AngleName, AngleSet, BalanceEstimate};
use crate::primitives::FEEDBACK_SEPARATOR;
use crate::thresholds::SquatTargets;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// FEEDBACK KEYS
// =============================================================================

/// Identifies the rule that produced a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKey {
    /// Average knee angle above the depth target.
    Depth,
    /// Average hip angle above the hinge target.
    HipHinge,
    /// Torso leaning past the allowed tilt.
    TorsoForm,
    /// Center of gravity drifting off the base of support.
    Balance,
    /// Left knee collapsed below the per-joint limit.
    KneeLeftForm,
    /// Right knee collapsed below the per-joint limit.
    KneeRightForm,
}

impl FeedbackKey {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKey::Depth => "depth",
            FeedbackKey::HipHinge => "hip_hinge",
            FeedbackKey::TorsoForm => "torso_form",
            FeedbackKey::Balance => "balance",
            FeedbackKey::KneeLeftForm => "knee_left_form",
            FeedbackKey::KneeRightForm => "knee_right_form",
        }
    }

    /// Technical message reported when this rule is violated.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            FeedbackKey::Depth => "Squat not deep enough.",
            FeedbackKey::HipHinge => "Hips not low enough.",
            FeedbackKey::TorsoForm => "Torso leaning too far forward.",
            FeedbackKey::Balance => "Weight shifted off your base of support.",
            FeedbackKey::KneeLeftForm => "Left knee too bent.",
            FeedbackKey::KneeRightForm => "Right knee too bent.",
        }
    }
}

impl std::fmt::Display for FeedbackKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FEEDBACK SET
// =============================================================================

/// Violated rules and their messages, in a stable key order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackSet(BTreeMap<FeedbackKey, String>);

impl FeedbackSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation with the rule's standard message.
    pub fn flag(&mut self, key: FeedbackKey) {
        self.0.insert(key, key.message().to_string());
    }

    #[must_use]
    pub fn contains(&self, key: FeedbackKey) -> bool {
        self.0.contains_key(&key)
    }

    #[must_use]
    pub fn get(&self, key: FeedbackKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = FeedbackKey> + '_ {
        self.0.keys().copied()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.values().map(String::as_str)
    }

    /// All messages joined with `" | "`, in key order.
    #[must_use]
    pub fn joined(&self) -> String {
        self.messages().collect::<Vec<_>>().join(FEEDBACK_SEPARATOR)
    }
}

// =============================================================================
// FORM VALIDATOR
// =============================================================================

/// Evaluates the squat rule set.
pub struct FormValidator;

impl FormValidator {
    /// Evaluate every rule against one frame.
    ///
    /// | Key | Input | Violated when |
    /// |-----|-------|---------------|
    /// | `depth` | mean knee angle | above `knee_angle_target_range.max` |
    /// | `hip_hinge` | mean hip angle | above `hip_angle_target_range.max` |
    /// | `torso_form` | torso tilt | above `torso_max_tilt` |
    /// | `balance` | CoG offset | above `cog_max_horizontal_offset` |
    /// | `knee_*_form` | each knee | below `knee_min_angle`, if set |
    #[must_use]
    pub fn evaluate(
        angles: &AngleSet,
        balance: &BalanceEstimate,
        targets: &SquatTargets,
    ) -> FeedbackSet {
        let mut feedback = FeedbackSet::new();

        if let Some(knee) = angles.average_knee_angle()
            && knee > targets.knee_angle_target_range.max
        {
            feedback.flag(FeedbackKey::Depth);
        }

        if let Some(hip) = angles.average_hip_angle()
            && hip > targets.hip_angle_target_range.max
        {
            feedback.flag(FeedbackKey::HipHinge);
        }

        if let Some(tilt) = angles.get(AngleName::TorsoTilt)
            && tilt > targets.torso_max_tilt
        {
            feedback.flag(FeedbackKey::TorsoForm);
        }

        if let Some(offset) = balance.horizontal_offset()
            && offset > targets.cog_max_horizontal_offset
        {
            feedback.flag(FeedbackKey::Balance);
        }

        if let Some(limit) = targets.knee_min_angle {
            for (name, key) in [
                (AngleName::KneeLeft, FeedbackKey::KneeLeftForm),
                (AngleName::KneeRight, FeedbackKey::KneeRightForm),
            ] {
                if angles.get(name).is_some_and(|angle| angle < limit) {
                    feedback.flag(key);
                }
            }
        }

        feedback
    }
}

// =============================================================================
// TESTS
// =============================================================================
