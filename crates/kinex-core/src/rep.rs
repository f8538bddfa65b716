//! # Repetition State Machine
//!
//! Counts squat repetitions from the per-frame average knee angle.
//!
//! ```text
//!            angle < knee_down_threshold
//!     ┌────┐ ─────────────────────────────▶ ┌──────┐
//!     │ Up │                                │ Down │ ── tracks min angle
//!     └────┘ ◀───────────────────────────── └──────┘
//!            angle > knee_up_threshold
//!            (rep_count += 1, verdict)
//! ```
//!
//! The gap between the two thresholds is the debounce: an angle hovering
//! around either one cannot toggle the stage back and forth.

use crate::primitives::NEUTRAL_ANGLE;
use crate::thresholds::RepThresholds;
use crate::types::Stage;
use serde::{Deserialize, Serialize};

// =============================================================================
// VERDICT
// =============================================================================

/// Quality of a completed rep, judged by its bottom knee angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepVerdict {
    /// Bottom angle above `ideal_depth_max`.
    NotDeepEnough,
    /// Bottom angle below `ideal_depth_min`.
    TooDeep,
    /// Bottom angle inside the ideal window.
    Good,
}

impl RepVerdict {
    /// Classify a rep from its minimum knee angle.
    #[must_use]
    pub fn classify(min_knee_angle: f64, thresholds: &RepThresholds) -> Self {
        if thresholds.ideal_depth().contains(min_knee_angle) {
            RepVerdict::Good
        } else if min_knee_angle > thresholds.ideal_depth_max {
            RepVerdict::NotDeepEnough
        } else {
            RepVerdict::TooDeep
        }
    }

    /// Technical feedback text for this verdict.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            RepVerdict::NotDeepEnough => "Try going a bit deeper next rep!",
            RepVerdict::TooDeep => "Careful, you went too deep!",
            RepVerdict::Good => "Good rep! Keep it up!",
        }
    }
}

impl std::fmt::Display for RepVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

// =============================================================================
// EVENTS & STATE
// =============================================================================

/// A stage transition produced by [`RepCounter::update`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepEvent {
    /// `Up → Down`.
    Descended,
    /// `Down → Up`: one rep finished.
    Completed {
        /// 1-based number of this rep within the session.
        rep_number: u32,
        min_knee_angle: f64,
        verdict: RepVerdict,
    },
}

/// Mutable state of one session's rep tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepState {
    pub stage: Stage,
    pub rep_count: u32,
    /// Lowest average knee angle seen in the current `Down` phase.
    pub min_knee_angle_this_rep: f64,
}

impl Default for RepState {
    fn default() -> Self {
        Self {
            stage: Stage::Up,
            rep_count: 0,
            min_knee_angle_this_rep: NEUTRAL_ANGLE,
        }
    }
}

// =============================================================================
// REP COUNTER
// =============================================================================

/// Hysteresis-based squat phase tracker.
#[derive(Debug, Clone)]
pub struct RepCounter {
    thresholds: RepThresholds,
    state: RepState,
}

impl RepCounter {
    #[must_use]
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            state: RepState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &RepState {
        &self.state
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    #[must_use]
    pub fn thresholds(&self) -> &RepThresholds {
        &self.thresholds
    }

    /// Back to the initial state, keeping the thresholds.
    pub fn reset(&mut self) {
        self.state = RepState::default();
    }

    /// Feed one frame's average knee angle.
    ///
    /// `None` (no usable knee angle in the frame) leaves the state untouched.
    pub fn update(&mut self, knee_angle: Option<f64>) -> Option<RepEvent> {
        let angle = knee_angle.filter(|a| a.is_finite())?;

        match self.state.stage {
            Stage::Up => {
                if angle < self.thresholds.knee_down_threshold {
                    self.state.stage = Stage::Down;
                    self.state.min_knee_angle_this_rep =
                        self.state.min_knee_angle_this_rep.min(angle);
                    Some(RepEvent::Descended)
                } else {
                    None
                }
            }
            Stage::Down => {
                if angle > self.thresholds.knee_up_threshold {
                    Some(self.complete())
                } else {
                    self.state.min_knee_angle_this_rep =
                        self.state.min_knee_angle_this_rep.min(angle);
                    None
                }
            }
        }
    }

    fn complete(&mut self) -> RepEvent {
        let min_knee_angle = self.state.min_knee_angle_this_rep;
        let verdict = RepVerdict::classify(min_knee_angle, &self.thresholds);

        self.state.stage = Stage::Up;
        self.state.rep_count = self.state.rep_count.saturating_add(1);
        self.state.min_knee_angle_this_rep = NEUTRAL_ANGLE;

        RepEvent::Completed {
            rep_number: self.state.rep_count,
            min_knee_angle,
            verdict,
        }
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new(RepThresholds::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
