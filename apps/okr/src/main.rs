//! # OKR - Objectives and Key Results Tracker
//!
//! The main binary for the OKR tracker.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for database maintenance
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 apps/okr (THE BINARY)                │
//! │                                                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │    CLI      │   │  HTTP API   │   │  GitHub    │  │
//! │  │   (clap)    │   │   (axum)    │   │  OAuth     │  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────┬──────┘  │
//! │         └─────────────────┼────────────────┘         │
//! │                           ▼                          │
//! │                   ┌───────────────┐                  │
//! │                   │   okr-core    │                  │
//! │                   │  (THE LOGIC)  │                  │
//! │                   └───────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! OKR_JWT_SECRET=change-me okr server --port 4000
//!
//! # Maintenance
//! okr seed
//! okr recompute
//! okr token --user 1
//! ```

use clap::Parser;
use okr::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. OKR_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("OKR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "okr=debug,okr_core=debug,tower_http=debug"
    } else {
        "okr=info,okr_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the OKR startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗ ██╗  ██╗██████╗
  ██╔═══██╗██║ ██╔╝██╔══██╗
  ██║   ██║█████╔╝ ██████╔╝
  ██║   ██║██╔═██╗ ██╔══██╗
  ╚██████╔╝██║  ██╗██║  ██║
   ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝

  Objectives & Key Results v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
