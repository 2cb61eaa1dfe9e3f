//! Phase monitor behavior against a scripted table.

use rust_decimal_macros::dec;

use gambit::engine::{PhaseMonitor, PhaseSignal};
use gambit::types::ActionSet;

use super::mock_driver::{Condition, MockDriver};

#[tokio::test(start_paused = true)]
async fn test_bet_debounce_and_mid_round_marker() {
    let driver = MockDriver::new(dec!(100));
    let mut monitor = PhaseMonitor::new();

    driver.set_condition(Condition::Bet);
    assert_eq!(
        monitor.observe(&driver).await.unwrap(),
        Some(PhaseSignal::Bet)
    );
    // The same betting opportunity observed again is swallowed.
    assert_eq!(monitor.observe(&driver).await.unwrap(), None);

    // A hand in progress produces no signal but marks the monitor as
    // mid-round, so the next betting opportunity fires.
    driver.set_condition(Condition::Playing);
    assert_eq!(monitor.observe(&driver).await.unwrap(), None);

    driver.set_condition(Condition::Bet);
    assert_eq!(
        monitor.observe(&driver).await.unwrap(),
        Some(PhaseSignal::Bet)
    );
}

#[tokio::test(start_paused = true)]
async fn test_insurance_declined_silently() {
    let driver = MockDriver::new(dec!(100));
    let mut monitor = PhaseMonitor::new();

    driver.set_condition(Condition::Insurance);
    assert_eq!(monitor.observe(&driver).await.unwrap(), None);
    assert_eq!(driver.decline_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_play_signal_captures_card_count() {
    let driver = MockDriver::new(dec!(100));
    let mut monitor = PhaseMonitor::new();

    driver.present_hand(&["10", "06"], "09", ActionSet::all());
    assert_eq!(
        monitor.observe(&driver).await.unwrap(),
        Some(PhaseSignal::Play)
    );

    // Two cards already observed; a third triggers another signal.
    driver.present_hand(&["10", "06", "04"], "09", ActionSet::all());
    assert_eq!(
        monitor.observe(&driver).await.unwrap(),
        Some(PhaseSignal::Play)
    );
}
