//! Session tracker — round outcomes, streaks, and the change stream.
//!
//! All session state lives behind one tracker; every mutation funnels
//! through a publishing choke point so the dashboard sees each change as
//! it happens, in order.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::types::{ChartPoint, SessionStats, StatsEvent, StreakLog, StreakSpan};

/// Capacity of the change-notification channel. Slow dashboard
/// subscribers drop old events rather than backpressure the agent.
const EVENT_CAPACITY: usize = 256;

/// Classification of one round by balance delta at the next bet phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The opening balance read; nothing to classify yet.
    Opening,
    Win,
    Draw,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreakKind {
    Win,
    Loss,
}

/// Owns the [`SessionStats`] and publishes a [`StatsEvent`] for every
/// field it changes.
pub struct SessionTracker {
    stats: Arc<RwLock<SessionStats>>,
    events: broadcast::Sender<StatsEvent>,
}

impl SessionTracker {
    /// Fresh session anchored at the opening balance.
    pub fn new(initial_balance: Decimal) -> Self {
        Self::resume(SessionStats::new(initial_balance))
    }

    /// Continue a session from persisted stats.
    pub fn resume(stats: SessionStats) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            stats: Arc::new(RwLock::new(stats)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatsEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionStats {
        self.stats.read().await.clone()
    }

    pub async fn loss_streak(&self) -> u64 {
        self.stats.read().await.loss_streak
    }

    /// Ingest the balance read at a bet phase and classify the round
    /// that just finished.
    ///
    /// The very first read only anchors `last_balance`; from the second
    /// read on, the delta against the previous read decides win, draw,
    /// or loss. A draw leaves both streaks untouched.
    pub async fn record_balance(&self, balance: Decimal) -> RoundOutcome {
        let mut stats = self.stats.write().await;

        stats.current_balance = balance;
        self.publish("currentBalance", json!(balance));

        let outcome = match stats.last_balance {
            None => RoundOutcome::Opening,
            Some(last) => {
                stats.play_number += 1;
                self.publish("playNumber", json!(stats.play_number));

                let delta = balance - last;
                let outcome = if delta > Decimal::ZERO {
                    self.add_win(&mut stats);
                    RoundOutcome::Win
                } else if delta.is_zero() {
                    stats.draws += 1;
                    self.publish("draws", json!(stats.draws));
                    RoundOutcome::Draw
                } else {
                    self.add_loss(&mut stats);
                    RoundOutcome::Loss
                };

                let point = ChartPoint {
                    round: stats.play_number,
                    net: balance - stats.initial_balance,
                };
                stats.play_chart.push(point.clone());
                self.publish_push("playChart", json!(point));

                info!(outcome = ?outcome, "{}", *stats);
                outcome
            }
        };

        if balance < stats.lowest_balance {
            stats.lowest_balance = balance;
            self.publish("lowestBalance", json!(balance));
        } else if balance > stats.highest_balance {
            stats.highest_balance = balance;
            self.publish("highestBalance", json!(balance));
        }

        stats.last_balance = Some(balance);
        self.publish("lastBalance", json!(balance));

        outcome
    }

    /// Record the wager chosen for the upcoming round.
    pub async fn record_wager(&self, bet_index: usize, amount: Decimal) {
        let mut stats = self.stats.write().await;
        stats.bet_index = bet_index;
        self.publish("betIndex", json!(bet_index));
        stats.last_bet = amount;
        self.publish("lastBet", json!(amount));
    }

    // -- Outcome bookkeeping ----------------------------------------------

    fn add_win(&self, stats: &mut SessionStats) {
        stats.wins += 1;
        self.publish("wins", json!(stats.wins));
        stats.win_streak += 1;
        self.publish("winStreak", json!(stats.win_streak));

        self.close_streak(stats, StreakKind::Loss);

        if stats.win_streak > stats.win_streak_record {
            stats.win_streak_record = stats.win_streak;
            self.publish("winStreakRecord", json!(stats.win_streak_record));
        }
    }

    fn add_loss(&self, stats: &mut SessionStats) {
        stats.losses += 1;
        self.publish("losses", json!(stats.losses));
        stats.loss_streak += 1;
        self.publish("lossStreak", json!(stats.loss_streak));

        self.close_streak(stats, StreakKind::Win);

        if stats.loss_streak > stats.loss_streak_record {
            stats.loss_streak_record = stats.loss_streak;
            self.publish("lossStreakRecord", json!(stats.loss_streak_record));

            warn!(
                record = stats.loss_streak_record,
                "new loss streak record"
            );
        }
    }

    /// Log and reset the streak of the opposite outcome, if one was
    /// running. A streak of length `n` broken at round `r` spans
    /// `[r - n - 1, r - 1]`.
    fn close_streak(&self, stats: &mut SessionStats, kind: StreakKind) {
        let length = match kind {
            StreakKind::Win => stats.win_streak,
            StreakKind::Loss => stats.loss_streak,
        };
        if length == 0 {
            return;
        }

        let span = StreakSpan {
            start: stats.play_number - length - 1,
            end: stats.play_number - 1,
        };
        let logs = match kind {
            StreakKind::Win => &mut stats.streak_logs.win,
            StreakKind::Loss => &mut stats.streak_logs.loss,
        };
        let log = logs.entry(length).or_insert_with(StreakLog::default);
        log.count += 1;
        log.positions.push(span);

        self.publish("streakLogs", json!(stats.streak_logs));

        match kind {
            StreakKind::Win => {
                stats.win_streak = 0;
                self.publish("winStreak", json!(0));
            }
            StreakKind::Loss => {
                stats.loss_streak = 0;
                self.publish("lossStreak", json!(0));
            }
        }
    }

    // -- Publishing choke point -------------------------------------------

    fn publish(&self, property: &str, value: serde_json::Value) {
        // No subscribers is fine; the agent never blocks on listeners.
        let _ = self.events.send(StatsEvent::PropertyChanged {
            property: property.to_string(),
            value,
        });
    }

    fn publish_push(&self, array_name: &str, element: serde_json::Value) {
        let _ = self.events.send(StatsEvent::ElementPushed {
            array_name: array_name.to_string(),
            element,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
