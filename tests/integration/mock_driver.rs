//! Mock table driver for integration testing.
//!
//! Provides a deterministic `GameDriver` whose observable phase is set
//! directly from test code — including the quiescent hand-in-progress
//! state the simulator never exposes — and which records every action
//! and deal it receives.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use gambit::driver::GameDriver;
use gambit::types::{Action, ActionSet, Card, Hand, TableRules};
use gambit::wager::WagerPlan;

/// The condition a readiness wait can currently observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// No condition holds; every wait pends.
    Idle,
    Bet,
    Insurance,
    Play,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MockView {
    condition: Condition,
    card_count: usize,
}

/// A scripted table driver. All state is in-memory and fully
/// controllable from test code.
pub struct MockDriver {
    rules: TableRules,
    view_tx: watch::Sender<MockView>,
    balance: Mutex<Decimal>,
    hand: Mutex<Hand>,
    dealer: Mutex<Option<Card>>,
    actions: Mutex<ActionSet>,
    staged: Mutex<Decimal>,
    invoked: Mutex<Vec<Action>>,
    deals: Mutex<Vec<Decimal>>,
    declines: AtomicUsize,
}

impl MockDriver {
    pub fn new(balance: Decimal) -> Self {
        let rules = TableRules::new(
            dec!(1),
            dec!(500),
            vec![dec!(1), dec!(5), dec!(25), dec!(100)],
        )
        .expect("valid mock rules");
        let (view_tx, _) = watch::channel(MockView {
            condition: Condition::Idle,
            card_count: 0,
        });
        Self {
            rules,
            view_tx,
            balance: Mutex::new(balance),
            hand: Mutex::new(Hand::new()),
            dealer: Mutex::new(None),
            actions: Mutex::new(ActionSet::all()),
            staged: Mutex::new(Decimal::ZERO),
            invoked: Mutex::new(Vec::new()),
            deals: Mutex::new(Vec::new()),
            declines: AtomicUsize::new(0),
        }
    }

    /// Make `condition` the observable table state.
    pub fn set_condition(&self, condition: Condition) {
        self.view_tx.send_modify(|v| v.condition = condition);
    }

    pub fn set_balance(&self, balance: Decimal) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Put a hand and dealer card on the table and surface the play
    /// condition.
    pub fn present_hand(&self, player: &[&str], dealer: &str, actions: ActionSet) {
        let cards: Vec<Card> = player
            .iter()
            .map(|s| Card::parse(s).expect("valid card symbol"))
            .collect();
        let count = cards.len();
        *self.hand.lock().unwrap() = Hand::from_cards(cards);
        *self.dealer.lock().unwrap() = Some(Card::parse(dealer).expect("valid card symbol"));
        *self.actions.lock().unwrap() = actions;
        self.view_tx.send_modify(|v| {
            v.condition = Condition::Play;
            v.card_count = count;
        });
    }

    pub fn invoked_actions(&self) -> Vec<Action> {
        self.invoked.lock().unwrap().clone()
    }

    pub fn dealt_bets(&self) -> Vec<Decimal> {
        self.deals.lock().unwrap().clone()
    }

    pub fn decline_count(&self) -> usize {
        self.declines.load(Ordering::Relaxed)
    }

    async fn wait_view<F>(&self, condition: F) -> Result<()>
    where
        F: FnMut(&MockView) -> bool,
    {
        let mut rx = self.view_tx.subscribe();
        rx.wait_for(condition)
            .await
            .map_err(|_| anyhow!("mock view channel closed"))?;
        Ok(())
    }
}

#[async_trait]
impl GameDriver for MockDriver {
    fn rules(&self) -> &TableRules {
        &self.rules
    }

    async fn wait_ready_to_bet(&self) -> Result<()> {
        self.wait_view(|v| v.condition == Condition::Bet).await
    }

    async fn wait_insurance_offered(&self) -> Result<()> {
        self.wait_view(|v| v.condition == Condition::Insurance)
            .await
    }

    async fn wait_new_card(&self, last_count: usize) -> Result<()> {
        self.wait_view(|v| v.condition == Condition::Play && v.card_count > last_count)
            .await
    }

    async fn wait_hand_in_progress(&self) -> Result<()> {
        self.wait_view(|v| v.condition == Condition::Playing).await
    }

    async fn decline_insurance(&self) -> Result<()> {
        self.declines.fetch_add(1, Ordering::Relaxed);
        self.set_condition(Condition::Idle);
        Ok(())
    }

    async fn dealt_card_count(&self) -> Result<usize> {
        Ok(self.hand.lock().unwrap().len())
    }

    async fn balance(&self) -> Result<Decimal> {
        Ok(*self.balance.lock().unwrap())
    }

    async fn dealer_card(&self) -> Result<Card> {
        self.dealer
            .lock()
            .unwrap()
            .ok_or_else(|| anyhow!("no dealer card on the mock table"))
    }

    async fn playing_hand(&self) -> Result<Hand> {
        let hand = self.hand.lock().unwrap();
        if hand.is_empty() {
            bail!("no player hand on the mock table");
        }
        Ok(hand.clone())
    }

    async fn available_actions(&self) -> Result<ActionSet> {
        Ok(*self.actions.lock().unwrap())
    }

    async fn invoke(&self, action: Action) -> Result<()> {
        self.invoked.lock().unwrap().push(action);
        self.set_condition(Condition::Idle);
        Ok(())
    }

    async fn staged_bet(&self) -> Result<Decimal> {
        Ok(*self.staged.lock().unwrap())
    }

    async fn clear_bets(&self) -> Result<()> {
        *self.staged.lock().unwrap() = Decimal::ZERO;
        Ok(())
    }

    async fn place_chips(&self, plan: &WagerPlan) -> Result<()> {
        *self.staged.lock().unwrap() += plan.covered();
        Ok(())
    }

    async fn deal(&self) -> Result<()> {
        let mut staged = self.staged.lock().unwrap();
        self.deals.lock().unwrap().push(*staged);
        *staged = Decimal::ZERO;
        self.set_condition(Condition::Idle);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
