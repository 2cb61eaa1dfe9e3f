//! Shared types for the GAMBIT agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that driver, strategy,
//! and engine modules can depend on them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Card rank as displayed on the table surface.
///
/// Number cards carry their face value, court cards count 10,
/// and the ace counts 11 until demoted during scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// Blackjack value of this rank (2–10, ace as 11).
    pub fn value(&self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
            Rank::Ace => 11,
        }
    }

    /// The symbol used on the table surface ("02".."10", "J", "Q", "K", "A").
    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Two => "02",
            Rank::Three => "03",
            Rank::Four => "04",
            Rank::Five => "05",
            Rank::Six => "06",
            Rank::Seven => "07",
            Rank::Eight => "08",
            Rank::Nine => "09",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for Rank {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "02" => Ok(Rank::Two),
            "03" => Ok(Rank::Three),
            "04" => Ok(Rank::Four),
            "05" => Ok(Rank::Five),
            "06" => Ok(Rank::Six),
            "07" => Ok(Rank::Seven),
            "08" => Ok(Rank::Eight),
            "09" => Ok(Rank::Nine),
            "10" => Ok(Rank::Ten),
            "J" => Ok(Rank::Jack),
            "Q" => Ok(Rank::Queen),
            "K" => Ok(Rank::King),
            "A" => Ok(Rank::Ace),
            other => Err(CardError::UnknownRank(other.to_string())),
        }
    }
}

/// Failed to build a card from a surface symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("failed to convert card \"{0}\"")]
    UnknownRank(String),
}

/// A single playing card. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
}

impl Card {
    pub fn new(rank: Rank) -> Self {
        Self { rank }
    }

    /// Parse a card from its surface symbol.
    pub fn parse(symbol: &str) -> Result<Self, CardError> {
        Ok(Self {
            rank: symbol.parse()?,
        })
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)
    }
}

// ---------------------------------------------------------------------------
// Hand
// ---------------------------------------------------------------------------

/// Precondition violations on hand accessors — programming errors, fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandError {
    #[error("pairs_of called without a pairs hand")]
    NotAPair,
    #[error("soft_of called without a soft hand")]
    NotSoft,
}

/// A player's hand: cards in draw order, appended as dealt and
/// cleared at round start. All derived properties are recomputed
/// on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    /// Hand score with incremental ace demotion: non-aces are summed
    /// first, then each ace adds 11 unless the running total would
    /// exceed 21, in which case it adds 1.
    pub fn score(&self) -> u8 {
        let mut total: u8 = 0;
        for card in self.cards.iter().filter(|c| c.rank() != Rank::Ace) {
            total = total.saturating_add(card.value());
        }
        for _ in self.cards.iter().filter(|c| c.rank() == Rank::Ace) {
            total = total.saturating_add(if total > 10 { 1 } else { 11 });
        }
        total
    }

    /// Exactly two cards, one valued 10 and one valued 11.
    pub fn is_blackjack(&self) -> bool {
        if self.cards.len() != 2 {
            return false;
        }
        let got_ten = self.cards.iter().any(|c| c.value() == 10);
        let got_ace = self.cards.iter().any(|c| c.value() == 11);
        got_ten && got_ace
    }

    /// Exactly two cards of identical rank symbol.
    pub fn has_pairs(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank() == self.cards[1].rank()
    }

    /// Exactly two cards with at least one ace counted as 11.
    pub fn is_soft(&self) -> bool {
        self.cards.len() == 2 && self.cards.iter().any(|c| c.value() == 11)
    }

    /// The shared value of a pairs hand.
    pub fn pairs_of(&self) -> Result<u8, HandError> {
        if !self.has_pairs() {
            return Err(HandError::NotAPair);
        }
        Ok(self.cards[0].value())
    }

    /// The non-ace card's value of a soft hand (or the other ace's
    /// value when both are aces).
    pub fn soft_of(&self) -> Result<u8, HandError> {
        if !self.is_soft() {
            return Err(HandError::NotSoft);
        }
        Ok(if self.cards[0].value() == 11 {
            self.cards[1].value()
        } else {
            self.cards[0].value()
        })
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self.cards.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}] ({})", cards.join(", "), self.score())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A playable action. Closed set — dispatch is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Stand,
    Hit,
    Double,
    Split,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Stand => write!(f, "stand"),
            Action::Hit => write!(f, "hit"),
            Action::Double => write!(f, "double"),
            Action::Split => write!(f, "split"),
        }
    }
}

/// The subset of actions currently invocable on the table surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub stand: bool,
    pub hit: bool,
    pub double: bool,
    pub split: bool,
}

impl ActionSet {
    /// All four actions available.
    pub fn all() -> Self {
        Self {
            stand: true,
            hit: true,
            double: true,
            split: true,
        }
    }

    pub fn contains(&self, action: Action) -> bool {
        match action {
            Action::Stand => self.stand,
            Action::Hit => self.hit,
            Action::Double => self.double,
            Action::Split => self.split,
        }
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// The four mutually exclusive phase conditions a tick can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A new betting opportunity is open.
    Bet,
    /// Insurance is being offered (always declined).
    Insurance,
    /// A new card appeared and action controls are present.
    Play,
    /// A hand is visible but no controls are — an action is resolving.
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Bet => write!(f, "bet"),
            Phase::Insurance => write!(f, "insurance"),
            Phase::Play => write!(f, "play"),
            Phase::Playing => write!(f, "playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table rules
// ---------------------------------------------------------------------------

/// Invalid table parameters read at session start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableRulesError {
    #[error("min/max bet must be positive")]
    NonPositiveBet,
    #[error("min bet {min} exceeds max bet {max}")]
    MinAboveMax { min: Decimal, max: Decimal },
    #[error("no chip denominations on the table")]
    NoDenominations,
    #[error("denominations must be ascending, positive, and duplicate-free")]
    BadDenominations,
    #[error("denomination {0} is not a multiple of the smallest chip")]
    IndivisibleDenomination(Decimal),
}

/// Bet bounds and the chip denominations present on the table.
/// Read once at session start and fixed for the session. Fields are
/// private so every instance passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    min_bet: Decimal,
    max_bet: Decimal,
    /// Ascending, duplicate-free chip values.
    denominations: Vec<Decimal>,
}

impl TableRules {
    /// Validate and construct table rules.
    ///
    /// Every denomination must be an exact multiple of the smallest so
    /// that greedy chip decomposition always terminates.
    pub fn new(
        min_bet: Decimal,
        max_bet: Decimal,
        denominations: Vec<Decimal>,
    ) -> Result<Self, TableRulesError> {
        if min_bet <= Decimal::ZERO || max_bet <= Decimal::ZERO {
            return Err(TableRulesError::NonPositiveBet);
        }
        if min_bet > max_bet {
            return Err(TableRulesError::MinAboveMax {
                min: min_bet,
                max: max_bet,
            });
        }
        let Some(smallest) = denominations.first().copied() else {
            return Err(TableRulesError::NoDenominations);
        };
        if smallest <= Decimal::ZERO || denominations.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TableRulesError::BadDenominations);
        }
        for &d in &denominations {
            if !(d % smallest).is_zero() {
                return Err(TableRulesError::IndivisibleDenomination(d));
            }
        }
        Ok(Self {
            min_bet,
            max_bet,
            denominations,
        })
    }

    pub fn min_bet(&self) -> Decimal {
        self.min_bet
    }

    pub fn max_bet(&self) -> Decimal {
        self.max_bet
    }

    pub fn denominations(&self) -> &[Decimal] {
        &self.denominations
    }

    /// The smallest chip on the table.
    pub fn min_chip(&self) -> Decimal {
        self.denominations[0]
    }
}

// ---------------------------------------------------------------------------
// Session statistics
// ---------------------------------------------------------------------------

/// A point on the balance chart: round index and net balance since
/// session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub round: u64,
    pub net: Decimal,
}

/// Rounds spanned by one observed streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSpan {
    pub start: u64,
    pub end: u64,
}

/// Occurrences of streaks of one particular length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakLog {
    pub count: u64,
    pub positions: Vec<StreakSpan>,
}

/// Per-length streak logs, separately for wins and losses.
/// Append-only for the life of the session, never pruned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakLogs {
    pub win: BTreeMap<u64, StreakLog>,
    pub loss: BTreeMap<u64, StreakLog>,
}

/// Running session counters, mutated only by the session tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub bet_index: usize,
    pub last_bet: Decimal,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    /// Balance observed at the previous bet phase; `None` before the
    /// first round so the opening read is never classified.
    pub last_balance: Option<Decimal>,
    pub lowest_balance: Decimal,
    pub highest_balance: Decimal,
    pub play_number: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub win_streak: u64,
    pub loss_streak: u64,
    pub win_streak_record: u64,
    pub loss_streak_record: u64,
    pub play_chart: Vec<ChartPoint>,
    pub streak_logs: StreakLogs,
}

impl SessionStats {
    /// Fresh stats anchored at the opening balance read.
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            bet_index: 0,
            last_bet: Decimal::ZERO,
            initial_balance,
            current_balance: initial_balance,
            last_balance: None,
            lowest_balance: initial_balance,
            highest_balance: initial_balance,
            play_number: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            win_streak: 0,
            loss_streak: 0,
            win_streak_record: 0,
            loss_streak_record: 0,
            play_chart: Vec::new(),
            streak_logs: StreakLogs::default(),
        }
    }

    /// Win rate over classified rounds (0.0 when none played).
    pub fn win_rate(&self) -> f64 {
        if self.play_number == 0 {
            0.0
        } else {
            self.wins as f64 / self.play_number as f64
        }
    }

    /// Net balance movement since the session started.
    pub fn net(&self) -> Decimal {
        self.current_balance - self.initial_balance
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round {} | balance ${} (net {:+}) | W{}/D{}/L{} | streak W{}/L{} | records W{}/L{}",
            self.play_number,
            self.current_balance,
            self.net(),
            self.wins,
            self.draws,
            self.losses,
            self.win_streak,
            self.loss_streak,
            self.win_streak_record,
            self.loss_streak_record,
        )
    }
}

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

/// Change notification emitted on every tracked-state mutation.
///
/// Scalar and object fields emit `PropertyChanged`; list fields emit an
/// additional `ElementPushed` when grown.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StatsEvent {
    #[serde(rename_all = "camelCase")]
    PropertyChanged {
        property: String,
        value: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    ElementPushed {
        array_name: String,
        element: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
