//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{extract::State, http::StatusCode, Json};
use futures::Stream;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::engine::AutopilotHandle;
use crate::session::SessionTracker;
use crate::types::{ChartPoint, SessionStats, StreakLogs};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub agent_name: String,
    pub tracker: Arc<SessionTracker>,
    pub control: Arc<AutopilotHandle>,
}

impl DashboardState {
    pub fn new(
        agent_name: String,
        tracker: Arc<SessionTracker>,
        control: Arc<AutopilotHandle>,
    ) -> Self {
        Self {
            agent_name,
            tracker,
            control,
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub agent: String,
    pub is_playing: bool,
    pub win_rate: f64,
    pub net: Decimal,
    #[serde(flatten)]
    pub stats: SessionStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_playing: bool,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.tracker.snapshot().await;

    Json(StatsResponse {
        agent: state.agent_name.clone(),
        is_playing: state.control.is_running(),
        win_rate: stats.win_rate(),
        net: stats.net(),
        stats,
    })
}

/// GET /api/chart
pub async fn get_chart(State(state): State<AppState>) -> Json<Vec<ChartPoint>> {
    let stats = state.tracker.snapshot().await;
    Json(stats.play_chart)
}

/// GET /api/streaks
pub async fn get_streaks(State(state): State<AppState>) -> Json<StreakLogs> {
    let stats = state.tracker.snapshot().await;
    Json(stats.streak_logs)
}

/// POST /api/toggle — start if stopped, stop if running.
pub async fn toggle(State(state): State<AppState>) -> Json<ToggleResponse> {
    let is_playing = state.control.toggle();
    Json(ToggleResponse { is_playing })
}

/// GET /api/events — the change-notification stream as SSE.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.tracker.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().json_data(&event) {
                    Ok(sse) => return Some((Ok(sse), rx)),
                    Err(_) => continue,
                },
                // A lagged subscriber skips to the oldest retained event.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::simulator::SimulatorDriver;
    use crate::engine::Autopilot;
    use crate::types::TableRules;
    use crate::wager::WagerPlanner;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn test_state(auto_start: bool) -> AppState {
        let rules = TableRules::new(
            dec!(1),
            dec!(500),
            vec![dec!(1), dec!(5), dec!(25), dec!(100)],
        )
        .unwrap();
        let driver = SimulatorDriver::new(rules, dec!(100), 6, Some(1));
        let tracker = Arc::new(SessionTracker::new(dec!(100)));
        let (_pilot, handle) = Autopilot::new(
            Arc::new(driver),
            WagerPlanner::new(vec![dec!(1)]).unwrap(),
            tracker.clone(),
            Duration::from_millis(10),
            None,
            auto_start,
        )
        .unwrap();
        Arc::new(DashboardState::new(
            "GAMBIT-TEST".to_string(),
            tracker,
            Arc::new(handle),
        ))
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state(true);
        let Json(resp) = get_stats(State(state)).await;
        assert_eq!(resp.agent, "GAMBIT-TEST");
        assert!(resp.is_playing);
        assert_eq!(resp.stats.current_balance, dec!(100));
        assert_eq!(resp.win_rate, 0.0);
    }

    #[tokio::test]
    async fn test_stats_response_flattens_camel_case() {
        let state = test_state(true);
        let Json(resp) = get_stats(State(state)).await;
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("isPlaying").is_some());
        assert!(value.get("currentBalance").is_some());
        assert!(value.get("playChart").is_some());
    }

    #[tokio::test]
    async fn test_toggle_flips_running_state() {
        let state = test_state(false);
        let Json(resp) = toggle(State(state.clone())).await;
        assert!(resp.is_playing);
        let Json(resp) = toggle(State(state)).await;
        assert!(!resp.is_playing);
    }

    #[tokio::test]
    async fn test_chart_handler_empty_at_start() {
        let state = test_state(true);
        let Json(chart) = get_chart(State(state)).await;
        assert!(chart.is_empty());
    }

    #[tokio::test]
    async fn test_streaks_handler_empty_at_start() {
        let state = test_state(true);
        let Json(streaks) = get_streaks(State(state)).await;
        assert!(streaks.win.is_empty());
        assert!(streaks.loss.is_empty());
    }
}
