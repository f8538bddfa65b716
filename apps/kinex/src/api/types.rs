//! # API Request/Response Types
//!
//! JSON structures for the HTTP API.

use kinex_core::{
    AnalysisRecord, BalanceEstimate, FrameAnalysis, PoseFrame, RepEvent, SessionStatus, Stage,
    Thresholds,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Live session status: counters plus both feedback lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub rep_count: u32,
    pub stage: Stage,
    /// Verdict after a rep, rule messages while descending.
    pub form_text: String,
    /// Latest rephrased coaching text.
    pub coach_text: String,
    /// Grows whenever `coach_text` is replaced; 0 before the first rephrase.
    pub coach_revision: u64,
    pub frames_processed: u64,
    pub idle_frames: u64,
}

// =============================================================================
// FRAME REQUEST/RESPONSE
// =============================================================================

/// One pose frame. Accepts `{"timestamp": .., "keypoints": [..]}` or a bare
/// keypoint array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRequest {
    pub frame: PoseFrame,
}

/// Result of processing one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResponse {
    pub success: bool,
    pub record: Option<AnalysisRecord>,
    pub balance: Option<BalanceEstimate>,
    pub status: Option<SessionStatus>,
    pub event: Option<RepEvent>,
    pub form_text: Option<String>,
    pub error: Option<String>,
}

impl FrameResponse {
    /// Build from a session analysis.
    #[must_use]
    pub fn from_analysis(analysis: FrameAnalysis) -> Self {
        Self {
            success: true,
            record: Some(analysis.record),
            balance: Some(analysis.balance),
            status: Some(analysis.status),
            event: analysis.event,
            form_text: Some(analysis.form_text),
            error: None,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            balance: None,
            status: None,
            event: None,
            form_text: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// RESET RESPONSE
// =============================================================================

/// Acknowledges a new set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    /// Reps counted before the reset.
    pub previous_rep_count: u32,
}

// =============================================================================
// THRESHOLDS RESPONSE
// =============================================================================

/// Effective configuration and its non-fatal diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsResponse {
    pub thresholds: Thresholds,
    pub diagnostics: Vec<String>,
}

impl From<&Thresholds> for ThresholdsResponse {
    fn from(thresholds: &Thresholds) -> Self {
        Self {
            thresholds: *thresholds,
            diagnostics: thresholds.diagnostics(),
        }
    }
}
