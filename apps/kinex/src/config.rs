//! # Configuration Module
//!
//! Loads the threshold document used to build a [`Session`](kinex_core::Session).
//!
//! The document is TOML, or JSON when the file extension is `.json`. Every
//! key is optional. Loading never fails: a missing file, an unreadable file
//! or a document that does not parse degrades to the defaults with a warning.

use kinex_core::{KinexError, Thresholds};
use std::path::Path;

/// Largest threshold document we are willing to read (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Parse a threshold document.
pub fn parse_thresholds(content: &str, format: ConfigFormat) -> Result<Thresholds, KinexError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| KinexError::ConfigError(format!("Invalid TOML: {}", e))),
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| KinexError::ConfigError(format!("Invalid JSON: {}", e))),
    }
}

/// Read and parse a threshold document, reporting every failure.
pub fn read_thresholds(path: &Path) -> Result<Thresholds, KinexError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| KinexError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(KinexError::ConfigError(format!(
            "Config size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| KinexError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;

    parse_thresholds(&content, ConfigFormat::from_path(path))
}

/// Load thresholds, falling back to the defaults on any error.
///
/// `visibility_override` replaces the document's visibility cutoff. Non-fatal
/// diagnostics of the effective configuration are logged as warnings.
pub fn load_thresholds(path: Option<&Path>, visibility_override: Option<f64>) -> Thresholds {
    let thresholds = match path {
        None => {
            tracing::debug!("No config file given, using default thresholds");
            Thresholds::default()
        }
        Some(path) => match read_thresholds(path) {
            Ok(t) => {
                tracing::info!(path = %path.display(), "Loaded thresholds");
                t
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Falling back to default thresholds"
                );
                Thresholds::default()
            }
        },
    };
    let thresholds = match visibility_override {
        Some(v) => thresholds.with_visibility_threshold(v),
        None => thresholds,
    };

    for diagnostic in thresholds.diagnostics() {
        tracing::warn!("Config: {}", diagnostic);
    }

    thresholds
}

/// Render thresholds back to a TOML document.
pub fn render_toml(thresholds: &Thresholds) -> Result<String, KinexError> {
    toml::to_string(thresholds).map_err(|e| KinexError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
