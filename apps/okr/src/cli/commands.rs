//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::StoreLocation;
use crate::api;
use crate::api::TokenIssuer;
use crate::config::ServerConfig;
use okr_core::{OkrError, Tracker, UserId};
use std::path::Path;

/// Open the tracker at `location`, creating an empty database if needed.
pub fn open_tracker(location: &StoreLocation) -> Result<Tracker, OkrError> {
    match location {
        StoreLocation::Memory => Tracker::in_memory(),
        StoreLocation::File(path) => Tracker::open(path),
    }
}

fn describe(location: &StoreLocation) -> String {
    match location {
        StoreLocation::Memory => "(in memory)".to_string(),
        StoreLocation::File(path) => path.display().to_string(),
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    location: &StoreLocation,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), OkrError> {
    let mut config = ServerConfig::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.require_jwt_secret()?;

    let tracker = open_tracker(location)?;

    println!("OKR Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.bind_address());
    println!("  Database: {}", describe(location));
    println!("  Frontend: {}", config.frontend_base());
    println!(
        "  GitHub:   {}",
        if config.github.client_id.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /api/health          - Health check");
    println!("  GET  /api/auth/github     - GitHub sign-in");
    println!("  POST /api/auth/okta/callback - Okta sign-in");
    println!("  *    /api/objectives      - Objectives");
    println!("  *    /api/key-results     - Key results");
    println!("  *    /api/departments, /api/teams, /api/users");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, tracker).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document counts.
pub fn cmd_status(location: &StoreLocation, json_mode: bool) -> Result<(), OkrError> {
    let tracker = open_tracker(location)?;
    let stats = tracker.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": describe(location),
            "persistent": tracker.is_persistent(),
            "users": stats.users,
            "departments": stats.departments,
            "teams": stats.teams,
            "objectives": stats.objectives,
            "key_results": stats.key_results,
        }));
        return Ok(());
    }

    println!("OKR Status");
    println!("==========");
    println!("Database: {}", describe(location));
    println!();
    println!("Users:        {}", stats.users);
    println!("Departments:  {}", stats.departments);
    println!("Teams:        {}", stats.teams);
    println!("Objectives:   {}", stats.objectives);
    println!("Key results:  {}", stats.key_results);

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create an empty database, replacing an existing one with `force`.
pub fn cmd_init(location: &StoreLocation, force: bool, json_mode: bool) -> Result<(), OkrError> {
    if let StoreLocation::File(path) = location {
        if path.exists() {
            if !force {
                return Err(OkrError::Config(
                    "Database already exists. Use --force to overwrite.".to_string(),
                ));
            }
            std::fs::remove_file(path).map_err(|e| {
                OkrError::Storage(format!("cannot remove '{}': {}", path.display(), e))
            })?;
        }
    }

    let tracker = open_tracker(location)?;
    if json_mode {
        print_json(&serde_json::json!({
            "database": describe(location),
            "persistent": tracker.is_persistent(),
        }));
    } else {
        println!("Initialized new database at {}", describe(location));
    }
    Ok(())
}

// =============================================================================
// SEED COMMAND
// =============================================================================

/// Replace everything with the demo organization.
pub fn cmd_seed(location: &StoreLocation, json_mode: bool) -> Result<(), OkrError> {
    let mut tracker = open_tracker(location)?;
    let summary = tracker.seed_demo_data()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": describe(location),
            "seeded": summary,
        }));
        return Ok(());
    }

    println!("Seeded {}", describe(location));
    println!("  Users:        {}", summary.users.len());
    println!("  Departments:  {}", summary.departments.len());
    println!("  Teams:        {}", summary.teams.len());
    if let Some(admin) = summary.users.first() {
        println!();
        println!("Admin user id: {} (use `okr token --user {}`)", admin, admin);
    }
    Ok(())
}

// =============================================================================
// RECOMPUTE COMMAND
// =============================================================================

/// Re-derive every key result and objective rollup.
pub fn cmd_recompute(location: &StoreLocation, json_mode: bool) -> Result<(), OkrError> {
    let mut tracker = open_tracker(location)?;
    let report = tracker.recompute_key_results()?;

    if json_mode {
        print_json(&serde_json::json!(report));
        return Ok(());
    }

    println!("Recomputed {} key results", report.key_results);
    println!("  Key results changed: {}", report.key_results_changed);
    println!("  Objectives changed:  {}", report.objectives_changed);
    Ok(())
}

// =============================================================================
// TOKEN COMMAND
// =============================================================================

/// Issue a bearer token for an existing, active user.
pub fn cmd_token(
    location: &StoreLocation,
    config_path: Option<&Path>,
    user: u64,
    json_mode: bool,
) -> Result<(), OkrError> {
    let config = ServerConfig::load(config_path)?;
    let tracker = open_tracker(location)?;
    let user = tracker.user(UserId(user))?;
    if !user.is_active {
        return Err(OkrError::Unauthorized("User account is inactive".to_string()));
    }

    let issuer = TokenIssuer::new(config.require_jwt_secret()?, config.token_ttl_days);
    let token = issuer
        .issue(user.id)
        .map_err(|e| OkrError::Config(e.to_string()))?;

    if json_mode {
        print_json(&serde_json::json!({
            "user": user.id.0,
            "email": user.email,
            "token": token,
        }));
    } else {
        println!("{}", token);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
