//! # Kinex - Squat Coach
//!
//! The main binary for the Kinex squat analysis engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/kinex (THE BINARY)                 │
//! │                                                          │
//! │   ┌─────────────┐    ┌─────────────┐    ┌────────────┐   │
//! │   │    CLI      │    │  HTTP API   │    │   Coach    │   │
//! │   │   (clap)    │    │   (axum)    │    │ (rephrase) │   │
//! │   └──────┬──────┘    └──────┬──────┘    └─────┬──────┘   │
//! │          └──────────────────┼─────────────────┘          │
//! │                             ▼                            │
//! │                     ┌───────────────┐                    │
//! │                     │  kinex-core   │                    │
//! │                     │  (THE LOGIC)  │                    │
//! │                     └───────────────┘                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! kinex server --host 0.0.0.0 --port 8080
//!
//! # Offline
//! kinex replay -f session.jsonl
//! kinex analyze -f frame.json --json-mode
//! kinex --config kinex.toml thresholds
//! ```

use clap::Parser;
use kinex::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // KINEX_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KINEX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kinex=info,kinex_core=info,tower_http=debug".into());

    // Logs go to stderr so JSON output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Kinex startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗  ██╗██╗███╗   ██╗███████╗██╗  ██╗
  ██║ ██╔╝██║████╗  ██║██╔════╝╚██╗██╔╝
  █████╔╝ ██║██╔██╗ ██║█████╗   ╚███╔╝
  ██╔═██╗ ██║██║╚██╗██║██╔══╝   ██╔██╗
  ██║  ██╗██║██║ ╚████║███████╗██╔╝ ██╗
  ╚═╝  ╚═╝╚═╝╚═╝  ╚═══╝╚══════╝╚═╝  ╚═╝

  Squat Coach v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
