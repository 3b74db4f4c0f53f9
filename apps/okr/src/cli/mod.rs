//! # OKR CLI Module
//!
//! This module implements the CLI interface for the OKR tracker.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show document counts
//! - `init` - Initialize a new database
//! - `seed` - Replace all data with the demo organization
//! - `recompute` - Re-derive every key result and objective rollup
//! - `token` - Issue a bearer token for a user

mod commands;

use clap::{Parser, Subcommand};
use okr_core::OkrError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// OKR - Objectives and Key Results tracker
///
/// Serves the OKR REST API and manages its database.
#[derive(Parser, Debug)]
#[command(name = "okr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the redb database
    #[arg(short = 'D', long, global = true, default_value = "okr.redb")]
    pub database: PathBuf,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub memory: bool,

    /// TOML configuration file (environment variables still override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

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
        /// Host to bind to (overrides configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show document counts
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Replace all data with the demo organization
    Seed,

    /// Re-derive key result progress/status and objective rollups
    Recompute,

    /// Issue a bearer token for an existing user
    Token {
        /// User id
        #[arg(short, long)]
        user: u64,
    },
}

/// Where the tracker lives.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl Cli {
    pub fn store_location(&self) -> StoreLocation {
        if self.memory {
            StoreLocation::Memory
        } else {
            StoreLocation::File(self.database.clone())
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), OkrError> {
    let location = cli.store_location();
    let json_mode = cli.json_mode;
    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&location, config, host, port).await,
        Some(Commands::Status) => cmd_status(&location, json_mode),
        Some(Commands::Init { force }) => cmd_init(&location, force, json_mode),
        Some(Commands::Seed) => cmd_seed(&location, json_mode),
        Some(Commands::Recompute) => cmd_recompute(&location, json_mode),
        Some(Commands::Token { user }) => cmd_token(&location, config, user, json_mode),
        None => cmd_status(&location, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
