//! GAMBIT — Autonomous Blackjack Table Agent
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod driver;
pub mod strategy;
pub mod wager;
pub mod session;
pub mod engine;
pub mod storage;
pub mod dashboard;
