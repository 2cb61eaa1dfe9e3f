//! Phase monitor.
//!
//! Each observation races the driver's four readiness waits and commits
//! to whichever resolves first. The bet and play conditions carry a
//! randomized settle delay inside the raced future so a half-rendered
//! table state is never acted on; the quiescent hand-in-progress
//! condition commits immediately.

use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::debug;

use crate::driver::GameDriver;
use crate::types::Phase;

/// Settle delay bounds, milliseconds.
const SETTLE_MIN_MS: u64 = 250;
const SETTLE_MAX_MS: u64 = 500;

/// A phase observation the autopilot must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    /// A new betting opportunity opened.
    Bet,
    /// A new card was dealt and the action controls are up.
    Play,
}

/// Tracks the last signalled phase and the player's observed card count
/// so each round produces exactly one bet signal and one play signal
/// per new card.
pub struct PhaseMonitor {
    last: Option<Phase>,
    card_count: usize,
}

impl PhaseMonitor {
    pub fn new() -> Self {
        Self {
            last: None,
            card_count: 0,
        }
    }

    /// Race the four phase conditions once and translate the winner
    /// into at most one signal.
    ///
    /// Insurance is declined on the spot and never signalled. A repeat
    /// bet observation is debounced. The hand-in-progress condition
    /// only marks the monitor as mid-round so the next bet observation
    /// fires.
    pub async fn observe(&mut self, driver: &dyn GameDriver) -> Result<Option<PhaseSignal>> {
        let phase = tokio::select! {
            res = Self::settled(driver.wait_ready_to_bet()) => {
                res?;
                Phase::Bet
            }
            res = Self::settled(driver.wait_insurance_offered()) => {
                res?;
                Phase::Insurance
            }
            res = Self::settled(driver.wait_new_card(self.card_count)) => {
                res?;
                Phase::Play
            }
            res = driver.wait_hand_in_progress() => {
                res?;
                Phase::Playing
            }
        };
        debug!(%phase, last = ?self.last, "phase observed");

        match phase {
            Phase::Bet => {
                if self.last == Some(Phase::Bet) {
                    return Ok(None);
                }
                self.card_count = 0;
                self.last = Some(Phase::Bet);
                Ok(Some(PhaseSignal::Bet))
            }
            Phase::Insurance => {
                driver.decline_insurance().await?;
                Ok(None)
            }
            Phase::Play => {
                self.card_count = driver.dealt_card_count().await?;
                self.last = Some(Phase::Play);
                Ok(Some(PhaseSignal::Play))
            }
            Phase::Playing => {
                if self.last != Some(Phase::Play) {
                    self.last = Some(Phase::Play);
                }
                Ok(None)
            }
        }
    }

    /// Forget the last observation so the next one signals again.
    ///
    /// Called after a failed cycle: the phase that produced the signal
    /// may still hold, and debouncing it would strand the session.
    pub fn reset(&mut self) {
        self.last = None;
    }

    async fn settled(wait: impl std::future::Future<Output = Result<()>>) -> Result<()> {
        wait.await?;
        let ms = rand::rng().random_range(SETTLE_MIN_MS..=SETTLE_MAX_MS);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }
}

impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
