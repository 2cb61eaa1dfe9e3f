//! End-to-end autopilot runs.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gambit::driver::simulator::SimulatorDriver;
use gambit::engine::{Autopilot, StopReason};
use gambit::session::SessionTracker;
use gambit::types::{Action, ActionSet, Card, TableRules};
use gambit::wager::WagerPlanner;

use super::mock_driver::{Condition, MockDriver};

fn rules() -> TableRules {
    TableRules::new(
        dec!(1),
        dec!(500),
        vec![dec!(1), dec!(5), dec!(25), dec!(100)],
    )
    .unwrap()
}

fn shoe(symbols: &[&str]) -> Vec<Card> {
    symbols.iter().map(|s| Card::parse(s).unwrap()).collect()
}

/// Poll a condition while the paused clock auto-advances.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn test_session_ends_when_bankroll_runs_out() {
    // Three scripted losses at a flat 10 wager: the player stands on
    // 19 and the dealer makes 20 every round. 30 → 20 → 10 → 0, then
    // the next bet phase finds nothing left to wager.
    let round = ["10", "09", "10", "K"];
    let mut cards = Vec::new();
    for _ in 0..3 {
        cards.extend_from_slice(&round);
    }

    let driver = SimulatorDriver::with_shoe(rules(), dec!(30), shoe(&cards));
    let tracker = Arc::new(SessionTracker::new(dec!(30)));
    let (mut pilot, _handle) = Autopilot::new(
        Arc::new(driver),
        WagerPlanner::new(vec![dec!(10)]).unwrap(),
        tracker.clone(),
        Duration::from_millis(10),
        None,
        true,
    )
    .unwrap();

    let reason = pilot.run().await.unwrap();
    assert_eq!(
        reason,
        StopReason::OutOfFunds {
            balance: Decimal::ZERO
        }
    );

    let stats = tracker.snapshot().await;
    assert_eq!(stats.losses, 3);
    assert_eq!(stats.play_number, 3);
    assert_eq!(stats.loss_streak, 3);
    assert_eq!(stats.loss_streak_record, 3);
    assert_eq!(stats.lowest_balance, Decimal::ZERO);
    assert_eq!(stats.play_chart.len(), 3);
    assert_eq!(stats.play_chart[2].net, dec!(-30));
}

#[tokio::test(start_paused = true)]
async fn test_autopilot_bets_and_plays_by_the_chart() {
    let driver = Arc::new(MockDriver::new(dec!(100)));
    let tracker = Arc::new(SessionTracker::new(dec!(100)));
    let (mut pilot, handle) = Autopilot::new(
        driver.clone(),
        WagerPlanner::new(vec![dec!(1), dec!(2), dec!(4)]).unwrap(),
        tracker.clone(),
        Duration::from_millis(10),
        None,
        true,
    )
    .unwrap();
    let task = tokio::spawn(async move { pilot.run().await });

    // Betting opportunity → one staged deal at the opening amount.
    driver.set_condition(Condition::Bet);
    let d = driver.clone();
    wait_until(move || !d.dealt_bets().is_empty()).await;
    assert_eq!(driver.dealt_bets(), vec![dec!(1)]);

    // Hard 16 against a 9 is a hit.
    driver.present_hand(&["10", "06"], "09", ActionSet::all());
    let d = driver.clone();
    wait_until(move || !d.invoked_actions().is_empty()).await;
    assert_eq!(driver.invoked_actions(), vec![Action::Hit]);

    handle.stop();
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_loss_streak_raises_the_wager() {
    let driver = Arc::new(MockDriver::new(dec!(100)));
    let tracker = Arc::new(SessionTracker::new(dec!(100)));
    let (mut pilot, handle) = Autopilot::new(
        driver.clone(),
        WagerPlanner::new(vec![dec!(1), dec!(2), dec!(4)]).unwrap(),
        tracker.clone(),
        Duration::from_millis(10),
        None,
        true,
    )
    .unwrap();
    let task = tokio::spawn(async move { pilot.run().await });

    // First bet anchors the balance.
    driver.set_condition(Condition::Bet);
    let d = driver.clone();
    wait_until(move || d.dealt_bets().len() == 1).await;

    // Play the round out so the monitor sees it in progress. Waiting
    // for the invoked action proves the play phase was consumed before
    // the table flips back to betting.
    driver.present_hand(&["10", "07"], "06", ActionSet::all());
    let d = driver.clone();
    wait_until(move || !d.invoked_actions().is_empty()).await;
    assert_eq!(driver.invoked_actions(), vec![Action::Stand]);

    // The round concludes with a lower balance; the next bet phase
    // classifies the loss and steps up the progression.
    driver.set_balance(dec!(99));
    driver.set_condition(Condition::Bet);
    let d = driver.clone();
    wait_until(move || d.dealt_bets().len() == 2).await;
    assert_eq!(driver.dealt_bets(), vec![dec!(1), dec!(2)]);

    let stats = tracker.snapshot().await;
    assert_eq!(stats.losses, 1);
    assert_eq!(stats.bet_index, 1);

    handle.stop();
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_paused_autopilot_places_no_bets() {
    let driver = Arc::new(MockDriver::new(dec!(100)));
    let tracker = Arc::new(SessionTracker::new(dec!(100)));
    let (mut pilot, handle) = Autopilot::new(
        driver.clone(),
        WagerPlanner::new(vec![dec!(1)]).unwrap(),
        tracker.clone(),
        Duration::from_millis(10),
        None,
        false,
    )
    .unwrap();
    let task = tokio::spawn(async move { pilot.run().await });

    driver.set_condition(Condition::Bet);
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert!(driver.dealt_bets().is_empty());

    // Starting the autopilot picks the opportunity up.
    handle.start();
    let d = driver.clone();
    wait_until(move || !d.dealt_bets().is_empty()).await;

    handle.stop();
    task.abort();
}
