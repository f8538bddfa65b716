//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        FrameRequest, FrameResponse, HealthResponse, ResetResponse, StatusResponse,
        ThresholdsResponse,
    },
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use kinex_core::{LANDMARK_COUNT, RepEvent};

/// Upper bound on keypoints accepted in one frame.
///
/// Generous enough for whole-body schemes; anything past the body scheme is
/// ignored by the geometry anyway.
pub const MAX_FRAME_KEYPOINTS: usize = LANDMARK_COUNT * 16;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get live session status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let status = session.status();
    let coach = state.coach.snapshot();

    let response = StatusResponse {
        rep_count: status.rep_count,
        stage: status.stage,
        form_text: session.form_text().to_string(),
        coach_text: coach.text,
        coach_revision: coach.ticket.0,
        frames_processed: session.frames_processed(),
        idle_frames: session.idle_frames(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// FRAME HANDLER
// =============================================================================

/// Process one pose frame.
pub async fn frame_handler(
    State(state): State<AppState>,
    request: Result<Json<FrameRequest>, JsonRejection>,
) -> impl IntoResponse {
    let frame = match request {
        Ok(Json(FrameRequest { frame })) => frame,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(FrameResponse::error(format!("Invalid frame: {}", e.body_text()))),
            );
        }
    };

    if frame.keypoints.len() > MAX_FRAME_KEYPOINTS {
        return (
            StatusCode::BAD_REQUEST,
            Json(FrameResponse::error(format!(
                "Frame has {} keypoints, maximum is {}",
                frame.keypoints.len(),
                MAX_FRAME_KEYPOINTS
            ))),
        );
    }

    let analysis = {
        let mut session = state.session.lock().await;
        session.process(&frame, crate::now_ms())
    };

    if let Some(RepEvent::Completed {
        rep_number,
        min_knee_angle,
        verdict,
    }) = analysis.event
    {
        tracing::info!(rep = rep_number, min_knee_angle, %verdict, "Rep completed");
    }

    if let Some(request) = analysis.rephrase.clone() {
        // Fire and forget: the slot discards the result if it arrives late.
        drop(state.dispatcher.dispatch(state.coach.clone(), request));
    }

    (StatusCode::OK, Json(FrameResponse::from_analysis(analysis)))
}

// =============================================================================
// RESET HANDLER
// =============================================================================

/// Start a new set.
pub async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    let previous_rep_count = session.status().rep_count;
    session.reset();

    tracing::info!(previous_rep_count, "Session reset");

    (
        StatusCode::OK,
        Json(ResetResponse {
            success: true,
            previous_rep_count,
        }),
    )
}

// =============================================================================
// THRESHOLDS HANDLER
// =============================================================================

/// Effective thresholds of the live session.
pub async fn thresholds_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    (
        StatusCode::OK,
        Json(ThresholdsResponse::from(session.thresholds())),
    )
}
