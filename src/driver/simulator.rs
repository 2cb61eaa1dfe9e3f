//! In-process blackjack table.
//!
//! A deterministic stand-in for a live table so the agent runs
//! end-to-end unattended: multi-deck shoe, dealer stands on 17,
//! blackjack pays 3:2, double takes exactly one card, insurance is
//! offered on a dealer ace. No hole card is drawn until resolution, so
//! a declined insurance always reaches the player's turn. Split is
//! never offered.

use std::collections::VecDeque;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::driver::GameDriver;
use crate::types::{Action, ActionSet, Card, Hand, Rank, TableRules};
use crate::wager::WagerPlan;

const RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

/// Reshuffle once the shoe drops below this many cards.
const SHOE_REFILL_THRESHOLD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TablePhase {
    AwaitingBet,
    InsuranceOffered,
    PlayerTurn,
}

/// What a readiness wait can observe, published on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableView {
    phase: TablePhase,
    dealt_cards: usize,
}

struct TableState {
    shoe: VecDeque<Card>,
    rng: StdRng,
    rigged: bool,
    balance: Decimal,
    staged: Decimal,
    bet: Decimal,
    player: Hand,
    dealer_up: Option<Card>,
    phase: TablePhase,
}

impl TableState {
    fn draw(&mut self, decks: usize) -> Result<Card> {
        if !self.rigged && self.shoe.len() < SHOE_REFILL_THRESHOLD {
            self.shoe = fresh_shoe(decks, &mut self.rng);
            debug!(cards = self.shoe.len(), "shoe reshuffled");
        }
        self.shoe.pop_front().ok_or_else(|| anyhow!("shoe is empty"))
    }

    fn view(&self) -> TableView {
        TableView {
            phase: self.phase,
            dealt_cards: self.player.len(),
        }
    }
}

fn fresh_shoe(decks: usize, rng: &mut StdRng) -> VecDeque<Card> {
    let mut cards: Vec<Card> = Vec::with_capacity(decks * 52);
    for _ in 0..decks {
        for rank in RANKS {
            for _ in 0..4 {
                cards.push(Card::new(rank));
            }
        }
    }
    cards.shuffle(rng);
    cards.into()
}

/// Simulated table implementing [`GameDriver`].
pub struct SimulatorDriver {
    rules: TableRules,
    decks: usize,
    state: Mutex<TableState>,
    view_tx: watch::Sender<TableView>,
}

impl SimulatorDriver {
    pub fn new(
        rules: TableRules,
        starting_balance: Decimal,
        decks: usize,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let shoe = fresh_shoe(decks.max(1), &mut rng);
        Self::build(rules, decks.max(1), starting_balance, shoe, rng, false)
    }

    /// Table with a preset shoe, for deterministic tests. Cards come
    /// off the front in deal order: player, player, dealer up, then
    /// every subsequent draw. The shoe is never reshuffled.
    pub fn with_shoe(rules: TableRules, starting_balance: Decimal, cards: Vec<Card>) -> Self {
        let rng = StdRng::seed_from_u64(0);
        Self::build(rules, 1, starting_balance, cards.into(), rng, true)
    }

    fn build(
        rules: TableRules,
        decks: usize,
        balance: Decimal,
        shoe: VecDeque<Card>,
        rng: StdRng,
        rigged: bool,
    ) -> Self {
        let state = TableState {
            shoe,
            rng,
            rigged,
            balance,
            staged: Decimal::ZERO,
            bet: Decimal::ZERO,
            player: Hand::new(),
            dealer_up: None,
            phase: TablePhase::AwaitingBet,
        };
        let (view_tx, _) = watch::channel(state.view());
        Self {
            rules,
            decks,
            state: Mutex::new(state),
            view_tx,
        }
    }

    async fn wait_view<F>(&self, condition: F) -> Result<()>
    where
        F: FnMut(&TableView) -> bool,
    {
        let mut rx = self.view_tx.subscribe();
        rx.wait_for(condition)
            .await
            .context("table view channel closed")?;
        Ok(())
    }

    fn publish(&self, state: &TableState) {
        self.view_tx.send_replace(state.view());
    }

    /// Dealer draws to 17 (standing on all 17s), the round is scored,
    /// and the table returns to the betting phase.
    fn resolve(&self, state: &mut TableState, player_busted: bool) -> Result<()> {
        let bet = state.bet;
        let player = state.player.clone();

        let payout = if player_busted {
            Decimal::ZERO
        } else {
            let up = state
                .dealer_up
                .ok_or_else(|| anyhow!("no dealer card at resolution"))?;
            let mut dealer = Hand::from_cards(vec![up]);
            while dealer.score() < 17 {
                let card = state.draw(self.decks)?;
                dealer.push(card);
            }

            let dealer_score = dealer.score();
            let player_score = player.score();
            debug!(%player, %dealer, "resolving round");

            if player.is_blackjack() {
                if dealer.is_blackjack() {
                    bet
                } else {
                    bet + bet * dec!(1.5)
                }
            } else if dealer.is_blackjack() {
                Decimal::ZERO
            } else if dealer_score > 21 || player_score > dealer_score {
                bet * dec!(2)
            } else if player_score == dealer_score {
                bet
            } else {
                Decimal::ZERO
            }
        };

        state.balance += payout;
        state.bet = Decimal::ZERO;
        state.player.clear();
        state.dealer_up = None;
        state.phase = TablePhase::AwaitingBet;
        self.publish(state);

        Ok(())
    }
}

#[async_trait]
impl GameDriver for SimulatorDriver {
    fn rules(&self) -> &TableRules {
        &self.rules
    }

    async fn wait_ready_to_bet(&self) -> Result<()> {
        self.wait_view(|v| v.phase == TablePhase::AwaitingBet).await
    }

    async fn wait_insurance_offered(&self) -> Result<()> {
        self.wait_view(|v| v.phase == TablePhase::InsuranceOffered)
            .await
    }

    async fn wait_new_card(&self, last_count: usize) -> Result<()> {
        self.wait_view(|v| v.phase == TablePhase::PlayerTurn && v.dealt_cards > last_count)
            .await
    }

    async fn wait_hand_in_progress(&self) -> Result<()> {
        // Actions settle synchronously here, so this state is never
        // observable; the race is always won by another condition.
        futures::future::pending::<()>().await;
        Ok(())
    }

    async fn decline_insurance(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != TablePhase::InsuranceOffered {
            bail!("insurance is not being offered");
        }
        state.phase = TablePhase::PlayerTurn;
        self.publish(&state);
        Ok(())
    }

    async fn dealt_card_count(&self) -> Result<usize> {
        Ok(self.state.lock().await.player.len())
    }

    async fn balance(&self) -> Result<Decimal> {
        Ok(self.state.lock().await.balance)
    }

    async fn dealer_card(&self) -> Result<Card> {
        self.state
            .lock()
            .await
            .dealer_up
            .ok_or_else(|| anyhow!("no dealer card on the table"))
    }

    async fn playing_hand(&self) -> Result<Hand> {
        let state = self.state.lock().await;
        if state.player.is_empty() {
            bail!("no player hand on the table");
        }
        Ok(state.player.clone())
    }

    async fn available_actions(&self) -> Result<ActionSet> {
        let state = self.state.lock().await;
        if state.phase != TablePhase::PlayerTurn {
            return Ok(ActionSet::default());
        }
        Ok(ActionSet {
            stand: true,
            hit: true,
            double: state.player.len() == 2 && state.balance >= state.bet,
            split: false,
        })
    }

    async fn invoke(&self, action: Action) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != TablePhase::PlayerTurn {
            bail!("cannot {action} outside the player's turn");
        }

        match action {
            Action::Stand => self.resolve(&mut state, false)?,
            Action::Hit => {
                let card = state.draw(self.decks)?;
                state.player.push(card);
                if state.player.score() > 21 {
                    self.resolve(&mut state, true)?;
                } else {
                    self.publish(&state);
                }
            }
            Action::Double => {
                if state.player.len() != 2 {
                    bail!("double is only offered on two cards");
                }
                if state.balance < state.bet {
                    bail!("insufficient balance to double");
                }
                let bet = state.bet;
                state.balance -= bet;
                state.bet += bet;
                let card = state.draw(self.decks)?;
                state.player.push(card);
                let busted = state.player.score() > 21;
                self.resolve(&mut state, busted)?;
            }
            Action::Split => bail!("split is not offered at this table"),
        }

        Ok(())
    }

    async fn staged_bet(&self) -> Result<Decimal> {
        Ok(self.state.lock().await.staged)
    }

    async fn clear_bets(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != TablePhase::AwaitingBet {
            bail!("cannot clear bets mid-round");
        }
        state.staged = Decimal::ZERO;
        Ok(())
    }

    async fn place_chips(&self, plan: &WagerPlan) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != TablePhase::AwaitingBet {
            bail!("cannot stage chips mid-round");
        }
        state.staged += plan.covered();
        Ok(())
    }

    async fn deal(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != TablePhase::AwaitingBet {
            bail!("cannot deal mid-round");
        }

        let staged = state.staged;
        if staged < self.rules.min_bet() || staged > self.rules.max_bet() {
            bail!("staged bet {staged} is outside the table bounds");
        }
        if staged > state.balance {
            bail!("staged bet {staged} exceeds balance {}", state.balance);
        }

        state.balance -= staged;
        state.bet = staged;
        state.staged = Decimal::ZERO;

        let first = state.draw(self.decks)?;
        let second = state.draw(self.decks)?;
        state.player.push(first);
        state.player.push(second);
        let up = state.draw(self.decks)?;
        state.dealer_up = Some(up);

        state.phase = if up.rank() == Rank::Ace {
            info!("dealer shows an ace, insurance offered");
            TablePhase::InsuranceOffered
        } else {
            TablePhase::PlayerTurn
        };
        self.publish(&state);

        Ok(())
    }

    fn name(&self) -> &str {
        "simulator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
