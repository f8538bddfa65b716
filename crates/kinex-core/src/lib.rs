//! # kinex-core
//!
//! The squat analysis engine for Kinex - THE LOGIC.
//!
//! This crate turns a stream of pose keypoints into joint angles, balance
//! estimates, technique feedback and counted repetitions.
//!
//! ## Components
//!
//! - `geometry`: angles and center of gravity from visibility-gated landmarks
//! - `validator`: stateless form rules over one frame
//! - `rep`: hysteresis state machine that counts and grades reps
//! - `slot`: shared, ticketed slot for asynchronously produced coaching text
//! - `session`: the per-frame pipeline tying the above together
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Never fails on sensor data: missing or degenerate input is `None`
//! - Holds mutable state only in `Session`, `RepCounter` and `FeedbackSlot`
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod geometry;
pub mod landmarks;
pub mod primitives;
pub mod record;
pub mod rep;
pub mod session;
pub mod slot;
pub mod thresholds;
pub mod types;
pub mod validator;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use landmarks::{LANDMARK_COUNT, Landmark};
pub use types::{Keypoint, KinexError, PointXY, PoseFrame, Stage};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use geometry::{AngleName, AngleSet, BalanceEstimate, GeometryEngine, angle_at};
pub use record::{AnalysisRecord, SessionStatus};
pub use rep::{RepCounter, RepEvent, RepState, RepVerdict};
pub use session::{FrameAnalysis, RephraseRequest, Session};
pub use slot::{FeedbackSlot, SlotSnapshot, Ticket};
pub use thresholds::{AngleRange, RepThresholds, SquatTargets, Thresholds};
pub use validator::{FeedbackKey, FeedbackSet, FormValidator};
