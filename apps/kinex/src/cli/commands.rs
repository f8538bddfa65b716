//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::coach::RephraseDispatcher;
use crate::config;
use kinex_core::{
    FormValidator, GeometryEngine, KinexError, Landmark, PoseFrame, RepEvent, RepVerdict,
    Session, Thresholds, primitives::PERMISSIVE_VISIBILITY_THRESHOLD,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum replay file size (256 MB, roughly two hours of 30 fps frames).
const MAX_REPLAY_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum single-frame file size (1 MB).
const MAX_FRAME_FILE_SIZE: u64 = 1024 * 1024;

/// Clock step between replayed frames without a timestamp (30 fps).
const REPLAY_FRAME_INTERVAL_MS: i64 = 33;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), KinexError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| KinexError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(KinexError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize `path` and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, KinexError> {
    let canonical = path.canonicalize().map_err(|e| {
        KinexError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(KinexError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read a whole input file after path and size checks.
fn read_input(path: &Path, max_size: u64) -> Result<String, KinexError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, max_size)?;
    std::fs::read_to_string(&path)
        .map_err(|e| KinexError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

/// Parse one frame document.
pub fn parse_frame(text: &str) -> Result<PoseFrame, KinexError> {
    serde_json::from_str(text).map_err(|e| KinexError::InvalidFrame(e.to_string()))
}

fn to_json_line<T: serde::Serialize>(value: &T) -> Result<String, KinexError> {
    serde_json::to_string(value).map_err(|e| KinexError::SerializationError(e.to_string()))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(thresholds: Thresholds, host: &str, port: u16) -> Result<(), KinexError> {
    println!("Kinex Squat Coach Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Visibility: {}", thresholds.visibility_threshold);
    println!(
        "  Rep band:   down < {} / up > {}",
        thresholds.rep_detection.knee_down_threshold, thresholds.rep_detection.knee_up_threshold
    );
    println!();
    println!("Endpoints:");
    println!("  POST /frame      - Process a pose frame");
    println!("  POST /reset      - Start a new set");
    println!("  GET  /status     - Reps, stage and feedback");
    println!("  GET  /thresholds - Effective configuration");
    println!("  GET  /health     - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, Session::new(thresholds)).await
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

/// Totals of one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReplaySummary {
    pub frames: u64,
    pub invalid_lines: u64,
    pub idle_frames: u64,
    pub rep_count: u32,
    pub good_reps: u32,
    pub coach_text: String,
}

/// Run every frame of a JSON-lines stream through one session.
///
/// Malformed lines are skipped with a warning. Rep verdicts are rephrased in
/// the background and awaited before the summary is built.
pub async fn replay_lines<F>(
    session: &mut Session,
    dispatcher: &RephraseDispatcher,
    input: &str,
    mut on_frame: F,
) -> Result<ReplaySummary, KinexError>
where
    F: FnMut(usize, &kinex_core::FrameAnalysis) -> Result<(), KinexError>,
{
    let slot = session.coach_slot();
    let mut summary = ReplaySummary::default();
    let mut pending = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame = match parse_frame(line) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed frame");
                summary.invalid_lines += 1;
                continue;
            }
        };

        let clock = i64::try_from(index)
            .unwrap_or(i64::MAX)
            .saturating_mul(REPLAY_FRAME_INTERVAL_MS);
        let analysis = session.process(&frame, clock);
        summary.frames += 1;

        match analysis.event {
            Some(RepEvent::Descended) => {
                tracing::debug!(line = index + 1, "Descending");
            }
            Some(RepEvent::Completed {
                rep_number,
                min_knee_angle,
                verdict,
            }) => {
                tracing::debug!(rep = rep_number, min_knee_angle, %verdict, "Rep completed");
                if verdict == RepVerdict::Good {
                    summary.good_reps += 1;
                }
            }
            None => {}
        }

        if let Some(request) = analysis.rephrase.clone() {
            pending.push(dispatcher.dispatch(slot.clone(), request));
        }

        on_frame(index, &analysis)?;
    }

    for handle in pending {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Rephrase task failed to join");
        }
    }

    summary.idle_frames = session.idle_frames();
    summary.rep_count = session.status().rep_count;
    summary.coach_text = slot.text();
    Ok(summary)
}

/// Replay a recorded session.
pub async fn cmd_replay(
    thresholds: Thresholds,
    file: &Path,
    json_mode: bool,
    verbose: bool,
) -> Result<(), KinexError> {
    let input = read_input(file, MAX_REPLAY_FILE_SIZE)?;
    let mut session = Session::new(thresholds);
    let dispatcher = RephraseDispatcher::default();

    let summary = replay_lines(&mut session, &dispatcher, &input, |index, analysis| {
        if json_mode {
            println!("{}", to_json_line(&analysis.record)?);
            return Ok(());
        }

        match analysis.event {
            Some(RepEvent::Completed {
                rep_number,
                min_knee_angle,
                verdict,
            }) => {
                println!(
                    "[frame {:>5}] rep {:>3}  bottom {:>6.1}°  {}",
                    index + 1,
                    rep_number,
                    min_knee_angle,
                    verdict
                );
            }
            _ if verbose => {
                let knee = analysis
                    .record
                    .angles
                    .average_knee_angle()
                    .map_or_else(|| "   -  ".to_string(), |a| format!("{:>6.1}", a));
                println!(
                    "[frame {:>5}] {:<4} knee {}°  {}",
                    index + 1,
                    analysis.status.stage.as_str(),
                    knee,
                    analysis.form_text
                );
            }
            _ => {}
        }
        Ok(())
    })
    .await?;

    if json_mode {
        let output = serde_json::json!({ "summary": summary });
        println!("{}", to_json_line(&output)?);
        return Ok(());
    }

    println!();
    println!("Replay Summary");
    println!("==============");
    println!("File:            {}", file.display());
    println!("Frames:          {}", summary.frames);
    println!("Idle frames:     {}", summary.idle_frames);
    println!("Malformed lines: {}", summary.invalid_lines);
    println!("Reps:            {}", summary.rep_count);
    println!("Good reps:       {}", summary.good_reps);
    println!();
    println!("Coach: {}", summary.coach_text);

    Ok(())
}

// =============================================================================
// ANALYZE COMMAND
// =============================================================================

/// Names of the landmarks that clear the visibility gate, in frame order.
///
/// Keypoints past the landmark table are ignored.
pub fn visible_landmarks(frame: &PoseFrame, threshold: f64) -> Vec<&'static str> {
    frame
        .keypoints
        .iter()
        .enumerate()
        .filter(|(_, kp)| kp.gated(threshold).is_some())
        .filter_map(|(i, _)| Landmark::from_index(i).map(Landmark::name))
        .collect()
}

/// Show one frame's geometry and every rule it violates.
pub fn cmd_analyze(thresholds: &Thresholds, file: &Path, json_mode: bool) -> Result<(), KinexError> {
    let frame = parse_frame(&read_input(file, MAX_FRAME_FILE_SIZE)?)?;
    let engine = GeometryEngine::new(thresholds.visibility_threshold);

    let angles = engine.compute_angles(&frame);
    let balance = engine.compute_balance(&frame);
    let feedback = FormValidator::evaluate(&angles, &balance, &thresholds.squat);
    let visible = visible_landmarks(&frame, thresholds.visibility_threshold);

    if json_mode {
        let output = serde_json::json!({
            "keypoints": frame.keypoints.len(),
            "visible_landmarks": visible,
            "angles": angles,
            "average_knee_angle": angles.average_knee_angle(),
            "balance": balance,
            "horizontal_offset": balance.horizontal_offset(),
            "form_feedback": feedback,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .map_err(|e| KinexError::SerializationError(e.to_string()))?
        );
        return Ok(());
    }

    println!("Frame Analysis");
    println!("==============");
    if frame.is_empty() {
        println!("Keypoints: none (no person detected)");
    } else {
        println!("Keypoints: {} ({} visible)", frame.keypoints.len(), visible.len());
        if !visible.is_empty() {
            println!("Visible:   {}", visible.join(", "));
        }
    }
    println!();

    if angles.is_empty() {
        println!("No angles: too few landmarks above visibility {}", thresholds.visibility_threshold);
        if !frame.is_empty() && thresholds.visibility_threshold > PERMISSIVE_VISIBILITY_THRESHOLD {
            println!(
                "Hint: a noisy camera may need --visibility-threshold {}",
                PERMISSIVE_VISIBILITY_THRESHOLD
            );
        }
    } else {
        println!("Angles:");
        for (name, angle) in angles.iter() {
            println!("  {:<12} {:>6.1}°", name.as_str(), angle);
        }
    }

    println!();
    match balance.horizontal_offset() {
        Some(offset) => println!(
            "Balance offset: {:.3} (max {})",
            offset, thresholds.squat.cog_max_horizontal_offset
        ),
        None => println!("Balance offset: unknown"),
    }

    println!();
    if feedback.is_empty() {
        println!("Form: no issues");
    } else {
        println!("Form:");
        for (key, message) in feedback.keys().zip(feedback.messages()) {
            println!("  {:<14} {}", key.as_str(), message);
        }
    }

    Ok(())
}

// =============================================================================
// THRESHOLDS COMMAND
// =============================================================================

/// Print the effective configuration.
pub fn cmd_thresholds(thresholds: &Thresholds, json_mode: bool) -> Result<(), KinexError> {
    let diagnostics = thresholds.diagnostics();

    if json_mode {
        let output = serde_json::json!({
            "thresholds": thresholds,
            "diagnostics": diagnostics,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .map_err(|e| KinexError::SerializationError(e.to_string()))?
        );
        return Ok(());
    }

    println!("# Effective Kinex thresholds");
    println!("{}", config::render_toml(thresholds)?);

    if !diagnostics.is_empty() {
        println!("# Diagnostics:");
        for d in &diagnostics {
            println!("#   {}", d);
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
