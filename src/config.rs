//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Table parameters are re-validated at startup via `TableRules`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::types::{TableRules, TableRulesError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub table: TableConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Delay between phase observations.
    pub tick_interval_ms: u64,
    /// Bet amounts indexed by loss streak.
    pub bet_progression: Vec<Decimal>,
    /// Start betting immediately instead of waiting for a dashboard
    /// toggle.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    /// Where session stats are persisted. None disables persistence.
    #[serde(default = "default_stats_file")]
    pub stats_file: Option<String>,
}

fn default_auto_start() -> bool {
    true
}

fn default_stats_file() -> Option<String> {
    Some("gambit_stats.json".to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    pub starting_balance: Decimal,
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    /// Chip denominations, ascending.
    pub denominations: Vec<Decimal>,
    /// Decks in the shoe.
    #[serde(default = "default_decks")]
    pub decks: usize,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_decks() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

impl TableConfig {
    /// Validated table rules from the configured parameters.
    pub fn rules(&self) -> Result<TableRules, TableRulesError> {
        TableRules::new(self.min_bet, self.max_bet, self.denominations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_config() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [agent]
            name = "GAMBIT-001"
            tick_interval_ms = 1000
            bet_progression = [1, 1, 1, 1, 5, 10, 20, 1]

            [table]
            starting_balance = 200.0
            min_bet = 1
            max_bet = 500
            denominations = [1, 5, 25, 100]
            decks = 6
            seed = 42

            [dashboard]
            enabled = true
            port = 3000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.agent.name, "GAMBIT-001");
        assert_eq!(cfg.agent.bet_progression.len(), 8);
        assert_eq!(cfg.agent.bet_progression[6], dec!(20));
        assert!(cfg.agent.auto_start);
        assert_eq!(cfg.table.seed, Some(42));
        assert_eq!(cfg.table.starting_balance, dec!(200));
        assert!(cfg.table.rules().is_ok());
        assert_eq!(cfg.dashboard.port, 3000);
    }

    #[test]
    fn test_bad_table_parameters_rejected() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [agent]
            name = "GAMBIT-001"
            tick_interval_ms = 1000
            bet_progression = [1]

            [table]
            starting_balance = 200.0
            min_bet = 10
            max_bet = 5
            denominations = [1, 5]

            [dashboard]
            enabled = false
            port = 3000
            "#,
        )
        .unwrap();

        assert!(cfg.table.rules().is_err());
    }
}
