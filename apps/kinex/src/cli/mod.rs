//! # Kinex CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `replay` - Run a recorded frame stream through a session
//! - `analyze` - Inspect a single frame
//! - `thresholds` - Show the effective configuration (default)

mod commands;

use crate::config;
use clap::{Parser, Subcommand};
use kinex_core::{KinexError, Thresholds};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Kinex - squat coach
///
/// Counts squat reps from pose keypoints, grades their depth and flags
/// technique faults while you are in the hole.
#[derive(Parser, Debug)]
#[command(name = "kinex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print every frame, not only rep events
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Threshold document (TOML, or JSON with a .json extension)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the landmark visibility cutoff (0.0 - 1.0)
    #[arg(long, global = true)]
    pub visibility_threshold: Option<f64>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Replay a JSON-lines file of pose frames
    Replay {
        /// Path to the frames file (one frame per line)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Analyze a single pose frame
    Analyze {
        /// Path to a JSON frame
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show effective thresholds and configuration diagnostics
    Thresholds,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve thresholds from the config file and command-line overrides.
///
/// Out-of-range values are reported as warnings, never rejected.
pub fn resolve_thresholds(cli: &Cli) -> Thresholds {
    config::load_thresholds(cli.config.as_deref(), cli.visibility_threshold)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), KinexError> {
    let thresholds = resolve_thresholds(&cli);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(thresholds, &host, port).await,
        Some(Commands::Replay { file }) => {
            cmd_replay(thresholds, &file, json_mode, cli.verbose).await
        }
        Some(Commands::Analyze { file }) => cmd_analyze(&thresholds, &file, json_mode),
        Some(Commands::Thresholds) | None => cmd_thresholds(&thresholds, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
