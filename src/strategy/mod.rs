//! Strategy engine — deterministic action selection from basic-strategy
//! charts, with a fixed fallback chain for unavailable actions.

pub mod tables;

use thiserror::Error;
use tracing::debug;

use crate::types::{Action, ActionSet, Hand, HandError};

/// Strategy selection failures.
///
/// A missing chart entry for a key the charts are supposed to cover is a
/// fatal configuration error, never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("no strategy found for a hand of {hand} against a dealer card value of {dealer}")]
    MissingEntry { hand: String, dealer: u8 },
    #[error("could not perform action {0}")]
    ActionUnavailable(Action),
    #[error(transparent)]
    Hand(#[from] HandError),
}

/// Pure lookup engine mapping (hand classification, dealer value) → action.
///
/// Chart precedence: pairs if the hand is exactly two equal ranks, soft if
/// exactly two cards with an ace counted as 11, otherwise hard by score —
/// except that a hard score of 17 or more always stands without a lookup.
#[derive(Debug, Default)]
pub struct StrategyEngine;

impl StrategyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Decide the action for `hand` against the dealer's visible card
    /// value, honouring the currently available action set.
    ///
    /// When the indicated action is unavailable the fallback chain is:
    /// Double → Hit; Split → re-evaluate as a hard hand (stand at 17+,
    /// else hard-chart lookup whose Double degrades to Hit and anything
    /// else to Stand). An unavailable Stand or Hit is an error.
    pub fn decide(
        &self,
        hand: &Hand,
        dealer: u8,
        available: ActionSet,
    ) -> Result<Action, StrategyError> {
        let score = hand.score();

        let indicated = if hand.has_pairs() {
            tables::pairs(hand.pairs_of()?, dealer)
        } else if hand.is_soft() {
            tables::soft(hand.soft_of()?, dealer)
        } else if score >= 17 {
            return Ok(Action::Stand);
        } else {
            tables::hard(score, dealer)
        };

        let indicated = indicated.ok_or_else(|| Self::missing(hand, dealer))?;

        if available.contains(indicated) {
            return Ok(indicated);
        }

        debug!(%hand, dealer, %indicated, "indicated action unavailable, falling back");

        match indicated {
            Action::Double => Ok(Action::Hit),
            Action::Split => {
                let score = hand.score();
                if score >= 17 {
                    return Ok(Action::Stand);
                }
                let fallback =
                    tables::hard(score, dealer).ok_or_else(|| Self::missing(hand, dealer))?;
                if available.contains(fallback) {
                    Ok(fallback)
                } else if fallback == Action::Double {
                    Ok(Action::Hit)
                } else {
                    Ok(Action::Stand)
                }
            }
            other => Err(StrategyError::ActionUnavailable(other)),
        }
    }

    fn missing(hand: &Hand, dealer: u8) -> StrategyError {
        StrategyError::MissingEntry {
            hand: hand.to_string(),
            dealer,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
