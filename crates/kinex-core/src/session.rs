//! # Session Module
//!
//! One person's squat set: the per-frame analysis pipeline.
//!
//! ```text
//! PoseFrame ─▶ GeometryEngine ─▶ AngleSet ─┬─▶ RepCounter ─▶ RepEvent
//!                          └─▶ Balance ────┴─▶ FormValidator (Down only)
//! ```
//!
//! A Session is driven by a single caller; it performs no I/O and never
//! blocks. Rep verdicts that need rephrasing are returned as a
//! [`RephraseRequest`] holding a ticket on the session's [`FeedbackSlot`];
//! whoever runs the rephraser publishes the result through that slot.

use crate::geometry::{AngleSet, BalanceEstimate, GeometryEngine};
use crate::primitives::INITIAL_COACH_TEXT;
use crate::record::{AnalysisRecord, SessionStatus};
use crate::rep::{RepCounter, RepEvent, RepVerdict};
use crate::slot::{FeedbackSlot, Ticket};
use crate::thresholds::Thresholds;
use crate::types::{PoseFrame, Stage};
use crate::validator::{FeedbackSet, FormValidator};

/// Technical text waiting to be rephrased for a completed rep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RephraseRequest {
    pub ticket: Ticket,
    pub rep_number: u32,
    pub verdict: RepVerdict,
    pub text: String,
}

/// Everything produced by one call to [`Session::process`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub record: AnalysisRecord,
    pub balance: BalanceEstimate,
    pub status: SessionStatus,
    pub event: Option<RepEvent>,
    /// Text for the live form line: verdict after a rep, joined rule messages while descending.
    pub form_text: String,
    pub rephrase: Option<RephraseRequest>,
}

impl FrameAnalysis {
    /// True when the frame had no knee angle to drive the state machine.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.record.angles.average_knee_angle().is_none()
    }
}

/// Squat analysis state for one set.
#[derive(Debug)]
pub struct Session {
    thresholds: Thresholds,
    geometry: GeometryEngine,
    counter: RepCounter,
    form_text: String,
    coach: FeedbackSlot,
    frames_processed: u64,
    idle_frames: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl Session {
    /// Create a session with the given configuration.
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            geometry: GeometryEngine::new(thresholds.visibility_threshold),
            counter: RepCounter::new(thresholds.rep_detection),
            thresholds,
            form_text: String::new(),
            coach: FeedbackSlot::new(INITIAL_COACH_TEXT),
            frames_processed: 0,
            idle_frames: 0,
        }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn geometry(&self) -> &GeometryEngine {
        &self.geometry
    }

    /// Handle to the shared coaching-text slot.
    #[must_use]
    pub fn coach_slot(&self) -> FeedbackSlot {
        self.coach.clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            rep_count: self.counter.rep_count(),
            stage: self.counter.stage(),
        }
    }

    #[must_use]
    pub fn form_text(&self) -> &str {
        &self.form_text
    }

    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames that could not drive the rep counter (see [`FrameAnalysis::is_idle`]).
    #[must_use]
    pub fn idle_frames(&self) -> u64 {
        self.idle_frames
    }

    /// Start a new set: zero the counter, clear the form line and reset coaching.
    pub fn reset(&mut self) {
        self.counter.reset();
        self.form_text.clear();
        self.coach.reset(INITIAL_COACH_TEXT);
        self.frames_processed = 0;
        self.idle_frames = 0;
    }

    /// Analyze one frame.
    ///
    /// `now_ms` stamps the record when the frame carries no timestamp.
    pub fn process(&mut self, frame: &PoseFrame, now_ms: i64) -> FrameAnalysis {
        let angles = self.geometry.compute_angles(frame);
        let balance = self.geometry.compute_balance(frame);
        self.process_measurements(angles, balance, frame.timestamp.unwrap_or(now_ms))
    }

    /// Advance the session from already-computed measurements.
    pub fn process_measurements(
        &mut self,
        angles: AngleSet,
        balance: BalanceEstimate,
        timestamp: i64,
    ) -> FrameAnalysis {
        self.frames_processed = self.frames_processed.saturating_add(1);

        let knee = angles.average_knee_angle();
        if knee.is_none() {
            self.idle_frames = self.idle_frames.saturating_add(1);
        }

        let event = self.counter.update(knee);
        let mut rephrase = None;

        match event {
            Some(RepEvent::Descended) => self.form_text.clear(),
            Some(RepEvent::Completed {
                rep_number,
                verdict,
                ..
            }) => {
                self.form_text = verdict.message().to_string();
                rephrase = Some(RephraseRequest {
                    ticket: self.coach.reserve(),
                    rep_number,
                    verdict,
                    text: verdict.message().to_string(),
                });
            }
            None => {}
        }

        let form_feedback = if self.counter.stage() == Stage::Down {
            let feedback = FormValidator::evaluate(&angles, &balance, &self.thresholds.squat);
            if !feedback.is_empty() {
                self.form_text = feedback.joined();
            }
            feedback
        } else {
            FeedbackSet::new()
        };

        FrameAnalysis {
            record: AnalysisRecord::new(timestamp, angles, form_feedback),
            balance,
            status: self.status(),
            event,
            form_text: self.form_text.clone(),
            rephrase,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
