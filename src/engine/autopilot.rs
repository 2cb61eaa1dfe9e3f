//! The autopilot — ties the monitor, strategy, planner, and tracker
//! into one bet → decide → act loop against a table driver.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::driver::GameDriver;
use crate::engine::monitor::{PhaseMonitor, PhaseSignal};
use crate::session::SessionTracker;
use crate::storage;
use crate::strategy::StrategyEngine;
use crate::wager::{WagerError, WagerPlanner};

/// Why the autopilot ended the session on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Bankroll dropped below the table minimum.
    OutOfFunds { balance: Decimal },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::OutOfFunds { balance } => {
                write!(f, "out of funds (balance ${balance})")
            }
        }
    }
}

enum CycleOutcome {
    Idle,
    BetPlaced,
    ActionTaken,
    Stopped(StopReason),
}

/// Start/stop control shared with the dashboard.
pub struct AutopilotHandle {
    running: watch::Sender<bool>,
}

impl AutopilotHandle {
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn start(&self) {
        self.running.send_replace(true);
    }

    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Start if stopped, stop if running. Returns the new state.
    /// Flip and read happen under the channel's lock so concurrent
    /// toggles never collapse into a no-op.
    pub fn toggle(&self) -> bool {
        let mut next = false;
        self.running.send_modify(|running| {
            *running = !*running;
            next = *running;
        });
        info!(running = next, "autopilot toggled");
        next
    }
}

pub struct Autopilot {
    driver: Arc<dyn GameDriver>,
    strategy: StrategyEngine,
    planner: WagerPlanner,
    tracker: Arc<SessionTracker>,
    monitor: PhaseMonitor,
    tick: Duration,
    stats_path: Option<String>,
    running: watch::Receiver<bool>,
}

impl Autopilot {
    /// Wire the autopilot. Fails fast when the opening progression
    /// amount is below the table minimum.
    pub fn new(
        driver: Arc<dyn GameDriver>,
        planner: WagerPlanner,
        tracker: Arc<SessionTracker>,
        tick: Duration,
        stats_path: Option<String>,
        auto_start: bool,
    ) -> Result<(Self, AutopilotHandle)> {
        let opening = planner.progression()[0];
        let min_bet = driver.rules().min_bet();
        if opening < min_bet {
            bail!("initial bet {opening} is lower than the table minimum {min_bet}");
        }

        let (tx, rx) = watch::channel(auto_start);
        let autopilot = Self {
            driver,
            strategy: StrategyEngine::new(),
            planner,
            tracker,
            monitor: PhaseMonitor::new(),
            tick,
            stats_path,
            running: rx,
        };
        Ok((autopilot, AutopilotHandle { running: tx }))
    }

    /// Main loop. Runs until the bankroll is exhausted; pauses whenever
    /// the control handle stops it. Cycle failures are logged and the
    /// loop continues on the next tick.
    pub async fn run(&mut self) -> Result<StopReason> {
        info!(
            driver = self.driver.name(),
            tick_ms = self.tick.as_millis() as u64,
            "autopilot entering main loop"
        );

        loop {
            if !*self.running.borrow() {
                info!("autopilot paused");
                self.running
                    .wait_for(|running| *running)
                    .await
                    .context("control channel closed")?;
                info!("autopilot resumed");
            }

            match self.cycle().await {
                Ok(CycleOutcome::Stopped(reason)) => {
                    self.persist().await;
                    return Ok(reason);
                }
                Ok(CycleOutcome::BetPlaced) => self.persist().await,
                Ok(CycleOutcome::ActionTaken) | Ok(CycleOutcome::Idle) => {}
                Err(e) => {
                    error!(error = %e, "cycle failed, continuing");
                    // The consumed signal's phase may still hold; let
                    // the next observation fire it again.
                    self.monitor.reset();
                }
            }

            let tick = self.tick;
            tokio::select! {
                _ = tokio::time::sleep(tick) => {}
                // A stop request cancels the pending re-arm immediately.
                Ok(_) = self.running.wait_for(|running| !*running) => {}
            }
        }
    }

    async fn cycle(&mut self) -> Result<CycleOutcome> {
        match self.monitor.observe(self.driver.as_ref()).await? {
            Some(PhaseSignal::Bet) => self.place_bet().await,
            Some(PhaseSignal::Play) => {
                self.take_action().await?;
                Ok(CycleOutcome::ActionTaken)
            }
            None => Ok(CycleOutcome::Idle),
        }
    }

    /// Bet phase: classify the finished round off the fresh balance
    /// read, size the next wager off the loss streak, stage the chips,
    /// and confirm the deal.
    async fn place_bet(&mut self) -> Result<CycleOutcome> {
        let balance = self
            .driver
            .balance()
            .await
            .context("reading balance at bet phase")?;
        self.tracker.record_balance(balance).await;

        let rules = self.driver.rules().clone();
        let loss_streak = self.tracker.loss_streak().await;
        let choice = match self.planner.next_bet(loss_streak, balance, &rules) {
            Ok(choice) => choice,
            Err(WagerError::InsufficientFunds { balance, min }) => {
                error!(%balance, %min, "bankroll below the table minimum, stopping");
                return Ok(CycleOutcome::Stopped(StopReason::OutOfFunds { balance }));
            }
            Err(e) => return Err(e.into()),
        };
        WagerPlanner::validate(choice.amount(), &rules)?;
        self.tracker.record_wager(choice.index(), choice.amount()).await;

        let staged = self.driver.staged_bet().await?;
        if staged > choice.amount() {
            self.driver
                .clear_bets()
                .await
                .context("clearing over-staged chips")?;
        }
        let plan = self.planner.decompose(choice.amount(), staged, &rules)?;
        self.driver.place_chips(&plan).await.context("staging chips")?;
        self.driver.deal().await.context("confirming the deal")?;

        info!(amount = %choice.amount(), index = choice.index(), "bet placed");
        Ok(CycleOutcome::BetPlaced)
    }

    /// Play phase: read the table, decide, invoke exactly one action.
    async fn take_action(&mut self) -> Result<()> {
        let (dealer, hand, available) = tokio::try_join!(
            self.driver.dealer_card(),
            self.driver.playing_hand(),
            self.driver.available_actions(),
        )
        .context("reading the table at play phase")?;

        let action = self.strategy.decide(&hand, dealer.value(), available)?;
        info!(%hand, dealer = %dealer, %action, "playing");

        self.driver
            .invoke(action)
            .await
            .with_context(|| format!("invoking {action}"))
    }

    async fn persist(&self) {
        if let Some(path) = self.stats_path.as_deref() {
            let stats = self.tracker.snapshot().await;
            if let Err(e) = storage::save_stats(&stats, Some(path)) {
                error!(error = %e, "failed to save session stats");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
