//! Wager planner — loss-progression bet sizing and greedy chip
//! decomposition.
//!
//! Bet amounts come from a fixed progression list indexed by the current
//! loss streak (clamped to the last entry). A selected amount is turned
//! into discrete chip placements against the table's denomination list.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::TableRules;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WagerError {
    #[error("bet amount {0} is not a positive number")]
    InvalidAmount(Decimal),
    #[error("bet amount {amount} is less than min bet {min}")]
    BelowMinimum { amount: Decimal, min: Decimal },
    #[error("bet amount {amount} is greater than max bet {max}")]
    AboveMaximum { amount: Decimal, max: Decimal },
    #[error("amount {0} cannot be covered by the table's denominations")]
    NotRepresentable(Decimal),
    #[error("balance {balance} is below the table minimum {min}")]
    InsufficientFunds { balance: Decimal, min: Decimal },
    #[error("bet progression list is empty")]
    EmptyProgression,
}

// ---------------------------------------------------------------------------
// Wager plan
// ---------------------------------------------------------------------------

/// A count of one chip denomination to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipPlacement {
    pub denomination: Decimal,
    pub count: u32,
}

/// Ordered chip placements realizing a target amount. Transient —
/// computed per bet, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerPlan {
    /// The full amount the table should show once placed.
    pub target: Decimal,
    pub placements: Vec<ChipPlacement>,
}

impl WagerPlan {
    /// Total value of the placements (the difference that was owed).
    pub fn covered(&self) -> Decimal {
        self.placements
            .iter()
            .map(|p| p.denomination * Decimal::from(p.count))
            .sum()
    }
}

/// Outcome of bet-amount selection for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetChoice {
    /// The progression amount at `index` fits the balance.
    Progression { index: usize, amount: Decimal },
    /// The progression amount exceeded the balance but the balance still
    /// meets the table minimum: wager everything.
    AllIn { index: usize, amount: Decimal },
}

impl BetChoice {
    pub fn index(&self) -> usize {
        match self {
            BetChoice::Progression { index, .. } | BetChoice::AllIn { index, .. } => *index,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            BetChoice::Progression { amount, .. } | BetChoice::AllIn { amount, .. } => *amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Computes the next bet from loss-streak state and decomposes amounts
/// into chip placements.
#[derive(Debug, Clone)]
pub struct WagerPlanner {
    progression: Vec<Decimal>,
}

impl WagerPlanner {
    pub fn new(progression: Vec<Decimal>) -> Result<Self, WagerError> {
        if progression.is_empty() {
            return Err(WagerError::EmptyProgression);
        }
        Ok(Self { progression })
    }

    pub fn progression(&self) -> &[Decimal] {
        &self.progression
    }

    /// `min(loss_streak, last index)` while losing, otherwise back to
    /// the start of the progression.
    pub fn select_index(&self, loss_streak: u64) -> usize {
        if loss_streak == 0 {
            return 0;
        }
        (loss_streak as usize).min(self.progression.len() - 1)
    }

    /// Pick the next bet for the given loss streak and balance.
    ///
    /// The bankroll check is deliberately two-step: the *progression
    /// amount* is compared against the balance, and only when it does
    /// not fit is the all-in amount checked against the *table minimum*
    /// to choose between all-in and ending the session.
    ///
    /// An all-in wagers the chip-representable portion of the balance:
    /// a 3:2 payout can leave a fractional remainder no chip covers,
    /// and it must not block the wager.
    pub fn next_bet(
        &self,
        loss_streak: u64,
        balance: Decimal,
        rules: &TableRules,
    ) -> Result<BetChoice, WagerError> {
        let index = self.select_index(loss_streak);
        let amount = self.progression[index];

        if amount > balance {
            let all_in = balance - balance % rules.min_chip();
            if all_in >= rules.min_bet() {
                warn!(%balance, %amount, %all_in, "progression amount exceeds balance, going all in");
                return Ok(BetChoice::AllIn {
                    index,
                    amount: all_in,
                });
            }
            return Err(WagerError::InsufficientFunds {
                balance,
                min: rules.min_bet(),
            });
        }

        Ok(BetChoice::Progression { index, amount })
    }

    /// Validate a bet amount against the table bounds.
    pub fn validate(amount: Decimal, rules: &TableRules) -> Result<(), WagerError> {
        if amount <= Decimal::ZERO {
            return Err(WagerError::InvalidAmount(amount));
        }
        if amount < rules.min_bet() {
            return Err(WagerError::BelowMinimum {
                amount,
                min: rules.min_bet(),
            });
        }
        if amount > rules.max_bet() {
            return Err(WagerError::AboveMaximum {
                amount,
                max: rules.max_bet(),
            });
        }
        Ok(())
    }

    /// Greedily decompose the difference still owed into chip placements.
    ///
    /// `staged` is any amount already on the table from a prior
    /// incomplete round; when it exceeds the target the table is cleared
    /// by the driver and the full target is owed again.
    ///
    /// Each pass scans denominations from highest to lowest, taking the
    /// integer quotient of the remainder for every denomination that fits,
    /// until the remainder drops below the smallest chip. A pass that
    /// makes no progress, or a nonzero final remainder, means the amount
    /// cannot be expressed with the table's chips and is rejected rather
    /// than looped on or silently under-bet.
    pub fn decompose(
        &self,
        target: Decimal,
        staged: Decimal,
        rules: &TableRules,
    ) -> Result<WagerPlan, WagerError> {
        if target <= Decimal::ZERO {
            return Err(WagerError::InvalidAmount(target));
        }

        let mut rest = if staged > target {
            target
        } else {
            target - staged
        };
        let min_chip = rules.min_chip();
        let mut placements: Vec<ChipPlacement> = Vec::new();

        while rest >= min_chip {
            let before = rest;
            for &denomination in rules.denominations().iter().rev() {
                let quotient = rest / denomination;
                if quotient < Decimal::ONE {
                    continue;
                }
                let count = quotient.floor();
                rest -= count * denomination;
                placements.push(ChipPlacement {
                    denomination,
                    count: count
                        .to_u32()
                        .ok_or(WagerError::NotRepresentable(before))?,
                });
            }
            if rest == before {
                return Err(WagerError::NotRepresentable(rest));
            }
        }

        if !rest.is_zero() {
            return Err(WagerError::NotRepresentable(rest));
        }

        debug!(%target, %staged, chips = placements.len(), "wager plan computed");

        Ok(WagerPlan { target, placements })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
