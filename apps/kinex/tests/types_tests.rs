//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use kinex::api::{
    FrameRequest, FrameResponse, HealthResponse, ResetResponse, StatusResponse,
    ThresholdsResponse,
};
use kinex_core::{Stage, Thresholds};
use serde_json::json;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        rep_count: 4,
        stage: Stage::Down,
        form_text: "Squat not deep enough.".to_string(),
        coach_text: "Start your first set!".to_string(),
        coach_revision: 0,
        frames_processed: 120,
        idle_frames: 3,
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"rep_count\":4"));
    assert!(json.contains("\"stage\":\"down\""));
    assert!(json.contains("\"form_text\":\"Squat not deep enough.\""));
    assert!(json.contains("\"idle_frames\":3"));
}

// =============================================================================
// FRAME REQUEST/RESPONSE TESTS
// =============================================================================

#[test]
fn test_frame_request_object_form() {
    let request: FrameRequest = serde_json::from_value(json!({
        "timestamp": 1234,
        "keypoints": [{"id": 0, "x": 0.5, "y": 0.1, "z": -0.2, "visibility": 0.99}]
    }))
    .unwrap();

    assert_eq!(request.frame.timestamp, Some(1234));
    assert_eq!(request.frame.keypoints.len(), 1);
    assert!((request.frame.keypoints[0].z + 0.2).abs() < 1e-12);
}

#[test]
fn test_frame_request_bare_array() {
    let request: FrameRequest = serde_json::from_value(json!([
        {"x": 0.5, "y": 0.1, "visibility": 0.99},
        {"x": 0.4, "y": 0.2, "visibility": 0.10}
    ]))
    .unwrap();

    assert_eq!(request.frame.timestamp, None);
    assert_eq!(request.frame.keypoints.len(), 2);
    assert_eq!(request.frame.keypoints[1].id, 0);
}

#[test]
fn test_frame_request_missing_coordinates_rejected() {
    let result: Result<FrameRequest, _> =
        serde_json::from_value(json!({"keypoints": [{"x": 0.5, "visibility": 0.9}]}));
    assert!(result.is_err());
}

#[test]
fn test_frame_response_error() {
    let response = FrameResponse::error("Invalid frame: expected array");

    assert!(!response.success);
    assert!(response.record.is_none());
    assert!(response.event.is_none());
    assert_eq!(
        response.error.as_deref(),
        Some("Invalid frame: expected array")
    );
}

#[test]
fn test_frame_response_event_wire_shape() {
    let response: FrameResponse = serde_json::from_value(json!({
        "success": true,
        "record": {"timestamp": 1, "angles": {"knee_left": 171.0}, "form_feedback": {}},
        "balance": {"center_of_gravity": null, "base_of_support": null},
        "status": {"rep_count": 1, "stage": "up"},
        "event": {"type": "completed", "rep_number": 1, "min_knee_angle": 90.0, "verdict": "good"},
        "form_text": "Good rep! Keep it up!",
        "error": null
    }))
    .unwrap();

    assert!(response.success);
    assert_eq!(response.status.unwrap().rep_count, 1);
    assert!(response.event.is_some());
}

// =============================================================================
// RESET / THRESHOLDS RESPONSE TESTS
// =============================================================================

#[test]
fn test_reset_response_serialization() {
    let reset = ResetResponse {
        success: true,
        previous_rep_count: 12,
    };
    let json = serde_json::to_string(&reset).unwrap();
    assert_eq!(json, r#"{"success":true,"previous_rep_count":12}"#);
}

#[test]
fn test_thresholds_response_carries_diagnostics() {
    let response = ThresholdsResponse::from(&Thresholds::default().with_visibility_threshold(1.5));

    assert_eq!(response.diagnostics.len(), 1);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["thresholds"]["visibility_threshold"], 1.5);
    assert_eq!(json["thresholds"]["rep_detection"]["knee_down_threshold"], 110.0);
}
