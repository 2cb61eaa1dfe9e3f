//! Basic strategy charts.
//!
//! Three charts keyed by hand classification: hard totals, soft totals
//! (ace + other card), and pairs (shared card value). Columns are the
//! dealer's visible card value 2–11 (ace as 11). The charts are const
//! arrays of a closed enum, so completeness over the covered key ranges
//! is structural; only an out-of-range key can miss.

use crate::types::Action;

const S: Action = Action::Stand;
const H: Action = Action::Hit;
const D: Action = Action::Double;
const T: Action = Action::Split;

/// Hard totals 4–17.
// Dealer →                                2  3  4  5  6  7  8  9 10  A
pub(crate) const HARD: [[Action; 10]; 14] = [
    /*  4 */ [H, H, H, H, H, H, H, H, H, H],
    /*  5 */ [H, H, H, H, H, H, H, H, H, H],
    /*  6 */ [H, H, H, H, H, H, H, H, H, H],
    /*  7 */ [H, H, H, H, H, H, H, H, H, H],
    /*  8 */ [H, H, H, H, H, H, H, H, H, H],
    /*  9 */ [H, D, D, D, D, H, H, H, H, H],
    /* 10 */ [D, D, D, D, D, D, D, D, H, H],
    /* 11 */ [D, D, D, D, D, D, D, D, D, H],
    /* 12 */ [H, H, S, S, S, H, H, H, H, H],
    /* 13 */ [S, S, S, S, S, H, H, H, H, H],
    /* 14 */ [S, S, S, S, S, H, H, H, H, H],
    /* 15 */ [S, S, S, S, S, H, H, H, H, H],
    /* 16 */ [S, S, S, S, S, H, H, H, H, H],
    /* 17 */ [S, S, S, S, S, S, S, S, S, S],
];

/// Soft totals 2–10 (the non-ace card's value; A+2 is row 2).
// Dealer →                               2  3  4  5  6  7  8  9 10  A
pub(crate) const SOFT: [[Action; 10]; 9] = [
    /*  2 */ [H, H, H, D, D, H, H, H, H, H],
    /*  3 */ [H, H, H, D, D, H, H, H, H, H],
    /*  4 */ [H, H, D, D, D, H, H, H, H, H],
    /*  5 */ [H, H, D, D, D, H, H, H, H, H],
    /*  6 */ [H, D, D, D, D, H, H, H, H, H],
    /*  7 */ [S, D, D, D, D, S, S, H, H, S],
    /*  8 */ [S, S, S, S, S, S, S, S, S, S],
    /*  9 */ [S, S, S, S, S, S, S, S, S, S],
    /* 10 */ [S, S, S, S, S, S, S, S, S, S],
];

/// Pair ranks 2–11 (shared card value; A,A is row 11).
// Dealer →                                 2  3  4  5  6  7  8  9 10  A
pub(crate) const PAIRS: [[Action; 10]; 10] = [
    /*  2 */ [T, T, T, T, T, T, H, H, H, H],
    /*  3 */ [T, T, T, T, T, T, H, H, H, H],
    /*  4 */ [H, H, H, T, T, H, H, H, H, H],
    /*  5 */ [D, D, D, D, D, D, D, D, H, H],
    /*  6 */ [T, T, T, T, T, H, H, H, H, H],
    /*  7 */ [T, T, T, T, T, T, H, H, H, H],
    /*  8 */ [T, T, T, T, T, T, T, T, T, T],
    /*  9 */ [T, T, T, T, T, S, T, T, S, S],
    /* 10 */ [S, S, S, S, S, S, S, S, S, S],
    /* 11 */ [T, T, T, T, T, T, T, T, T, T],
];

fn column(dealer: u8) -> Option<usize> {
    (2..=11).contains(&dealer).then(|| (dealer - 2) as usize)
}

/// Hard-chart lookup for totals 4–17.
pub(crate) fn hard(total: u8, dealer: u8) -> Option<Action> {
    let col = column(dealer)?;
    (4..=17)
        .contains(&total)
        .then(|| HARD[(total - 4) as usize][col])
}

/// Soft-chart lookup for totals 2–10.
pub(crate) fn soft(total: u8, dealer: u8) -> Option<Action> {
    let col = column(dealer)?;
    (2..=10)
        .contains(&total)
        .then(|| SOFT[(total - 2) as usize][col])
}

/// Pairs-chart lookup for pair ranks 2–11.
pub(crate) fn pairs(rank: u8, dealer: u8) -> Option<Action> {
    let col = column(dealer)?;
    (2..=11)
        .contains(&rank)
        .then(|| PAIRS[(rank - 2) as usize][col])
}
