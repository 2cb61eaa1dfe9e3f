//! Persistence layer.
//!
//! Saves and loads session statistics to/from a JSON file so an
//! interrupted session resumes with its streaks and chart intact.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::SessionStats;

/// Default stats file path.
const DEFAULT_STATS_FILE: &str = "gambit_stats.json";

/// Save session stats to a JSON file.
pub fn save_stats(stats: &SessionStats, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATS_FILE);
    let json = serde_json::to_string_pretty(stats)
        .context("Failed to serialise session stats")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write stats to {path}"))?;

    debug!(path, balance = %stats.current_balance, "Stats saved");
    Ok(())
}

/// Load session stats from a JSON file.
/// Returns None if the file doesn't exist (fresh session).
pub fn load_stats(path: Option<&str>) -> Result<Option<SessionStats>> {
    let path = path.unwrap_or(DEFAULT_STATS_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved stats found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read stats from {path}"))?;

    let stats: SessionStats = serde_json::from_str(&json)
        .context(format!("Failed to parse stats from {path}"))?;

    info!(
        path,
        balance = %stats.current_balance,
        rounds = stats.play_number,
        wins = stats.wins,
        "Stats loaded from disk"
    );

    Ok(Some(stats))
}

/// Delete the stats file (for testing or reset).
pub fn delete_stats(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATS_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete stats file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
