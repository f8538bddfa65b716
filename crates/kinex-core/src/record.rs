//! # Analysis Records
//!
//! Structured output handed to serializers and displays.

use crate::geometry::AngleSet;
use crate::types::Stage;
use crate::validator::FeedbackSet;
use serde::{Deserialize, Serialize};

/// One analysis cycle, as emitted per processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub angles: AngleSet,
    pub form_feedback: FeedbackSet,
}

impl AnalysisRecord {
    #[must_use]
    pub fn new(timestamp: i64, angles: AngleSet, form_feedback: FeedbackSet) -> Self {
        Self {
            timestamp,
            angles,
            form_feedback,
        }
    }
}

/// Running counters for continuous display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionStatus {
    pub rep_count: u32,
    pub stage: Stage,
}
