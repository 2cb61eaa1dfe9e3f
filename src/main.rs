//! GAMBIT — Autonomous Blackjack Table Agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores session stats from disk (or starts fresh), and runs the
//! bet → decide → act loop with graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use gambit::config;
use gambit::dashboard;
use gambit::dashboard::routes::DashboardState;
use gambit::driver::simulator::SimulatorDriver;
use gambit::driver::GameDriver;
use gambit::engine::Autopilot;
use gambit::session::SessionTracker;
use gambit::storage;
use gambit::wager::WagerPlanner;

const BANNER: &str = r#"
  ____    _    __  __ ____ ___ _____
 / ___|  / \  |  \/  | __ )_ _|_   _|
| |  _  / _ \ | |\/| |  _ \| |  | |
| |_| |/ ___ \| |  | | |_) | |  | |
 \____/_/   \_\_|  |_|____/___| |_|

  Game-Aware Monitoring & Betting Interface Table-agent
  v0.1.0 — Autonomous Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        tick_interval_ms = cfg.agent.tick_interval_ms,
        starting_balance = %cfg.table.starting_balance,
        "GAMBIT starting up"
    );

    // -- Table driver ------------------------------------------------------

    let rules = cfg.table.rules().context("invalid table parameters")?;
    let driver: Arc<dyn GameDriver> = Arc::new(SimulatorDriver::new(
        rules,
        cfg.table.starting_balance,
        cfg.table.decks,
        cfg.table.seed,
    ));

    // -- Restore or create session stats -----------------------------------

    let stats_path = cfg.agent.stats_file.clone();
    let opening_balance = driver.balance().await?;
    let tracker = match storage::load_stats(stats_path.as_deref())? {
        Some(stats) => {
            info!(
                balance = %stats.current_balance,
                rounds = stats.play_number,
                "Resumed session from saved stats"
            );
            Arc::new(SessionTracker::resume(stats))
        }
        None => {
            info!(balance = %opening_balance, "Fresh session");
            Arc::new(SessionTracker::new(opening_balance))
        }
    };

    // -- Autopilot ---------------------------------------------------------

    let planner = WagerPlanner::new(cfg.agent.bet_progression.clone())?;
    let (mut autopilot, handle) = Autopilot::new(
        driver,
        planner,
        tracker.clone(),
        Duration::from_millis(cfg.agent.tick_interval_ms),
        stats_path.clone(),
        cfg.agent.auto_start,
    )?;

    // -- Dashboard ---------------------------------------------------------

    // The handle outlives the dashboard so the control channel stays
    // open even when the dashboard is disabled.
    let handle = Arc::new(handle);
    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(
            cfg.agent.name.clone(),
            tracker.clone(),
            handle.clone(),
        ));
        dashboard::spawn_dashboard(state, cfg.dashboard.port)?;
    }

    // -- Main loop ---------------------------------------------------------

    info!("Entering main loop. Press Ctrl+C to stop.");

    tokio::select! {
        result = autopilot.run() => match result {
            Ok(reason) => info!(%reason, "Autopilot stopped"),
            Err(e) => error!(error = %e, "Autopilot failed"),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    // Save final stats and summarise the session
    let stats = tracker.snapshot().await;
    if let Some(path) = stats_path.as_deref() {
        storage::save_stats(&stats, Some(path))?;
    }
    info!(
        rounds = stats.play_number,
        wins = stats.wins,
        draws = stats.draws,
        losses = stats.losses,
        balance = format!("${}", stats.current_balance),
        net = format!("${}", stats.net()),
        "GAMBIT shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gambit=info"));

    let json_logging = std::env::var("GAMBIT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
