//! # Kinex
//!
//! Library surface of the Kinex binary, shared by `main.rs` and the
//! integration tests.

pub mod api;
pub mod cli;
pub mod coach;
pub mod config;

/// Wall-clock time in milliseconds since the Unix epoch.
///
/// Stamps frames that arrive without a capture timestamp.
#[must_use]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
