//! Table drivers.
//!
//! Defines the `GameDriver` trait over a live blackjack table and
//! provides the in-process simulator used for unattended runs.

pub mod simulator;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{Action, ActionSet, Card, Hand, TableRules};
use crate::wager::WagerPlan;

/// Abstraction over a blackjack table surface.
///
/// Readiness waits pend until their condition holds — "nothing new yet"
/// is a valid steady state, so none of them carry a timeout. The phase
/// monitor races them and drops the losers.
#[async_trait]
pub trait GameDriver: Send + Sync {
    /// Bet bounds and chip denominations discovered at session start.
    fn rules(&self) -> &TableRules;

    /// Resolves when a new betting opportunity is open.
    async fn wait_ready_to_bet(&self) -> Result<()>;

    /// Resolves when the table is offering insurance.
    async fn wait_insurance_offered(&self) -> Result<()>;

    /// Resolves when the player has more than `last_count` dealt cards
    /// and the action controls are present.
    async fn wait_new_card(&self, last_count: usize) -> Result<()>;

    /// Resolves when a hand is visible but no controls are — an action
    /// is still settling.
    async fn wait_hand_in_progress(&self) -> Result<()>;

    /// Turn down the insurance offer.
    async fn decline_insurance(&self) -> Result<()>;

    /// Number of cards currently dealt to the player.
    async fn dealt_card_count(&self) -> Result<usize>;

    /// Current bankroll as shown by the table.
    async fn balance(&self) -> Result<Decimal>;

    /// The dealer's visible card.
    async fn dealer_card(&self) -> Result<Card>;

    /// The hand the player is currently acting on.
    async fn playing_hand(&self) -> Result<Hand>;

    /// Which actions the table surface currently offers.
    async fn available_actions(&self) -> Result<ActionSet>;

    /// Invoke one playing action.
    async fn invoke(&self, action: Action) -> Result<()>;

    /// Amount already staged on the table from a prior incomplete round.
    async fn staged_bet(&self) -> Result<Decimal>;

    /// Remove all staged chips.
    async fn clear_bets(&self) -> Result<()>;

    /// Stage the plan's chip placements.
    async fn place_chips(&self, plan: &WagerPlan) -> Result<()>;

    /// Confirm the staged bet and start the round.
    async fn deal(&self) -> Result<()>;

    /// Driver name for logging.
    fn name(&self) -> &str;
}
