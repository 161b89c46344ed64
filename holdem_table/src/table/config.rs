//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_CLEANUP_DELAY_MS,
        DEFAULT_MAX_BUY_IN, DEFAULT_MAX_SEATS, DEFAULT_SMALL_BLIND, MAX_SEATS,
    },
    entities::Chips,
};

/// Identifier of a table within a deployment.
pub type TableId = i64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Number of seats (default: 9)
    pub max_seats: usize,

    pub small_blind: Chips,

    pub big_blind: Chips,

    /// Largest buy-in a single seat may bring
    pub max_buy_in: Chips,

    /// Seconds a player has to act before auto check/fold
    pub action_timeout_secs: u64,

    /// Pause between the end of a hand and the next deal
    pub cleanup_delay_ms: u64,

    /// Events kept for replay on reconnect
    pub replay_capacity: usize,

    /// Largest gap served as a replay; anything bigger gets a snapshot
    pub replay_threshold: usize,

    /// Persist a snapshot after this many events (and at every hand end)
    pub snapshot_every: usize,

    /// Per-subscriber notification buffer
    pub subscriber_buffer: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_seats: DEFAULT_MAX_SEATS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            max_buy_in: DEFAULT_MAX_BUY_IN,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            cleanup_delay_ms: DEFAULT_CLEANUP_DELAY_MS,
            replay_capacity: 5000,
            replay_threshold: 200,
            snapshot_every: 50,
            subscriber_buffer: 256,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind == 0 {
            return Err(ConfigError::Invalid(
                "small blind must be positive".to_string(),
            ));
        }

        if self.big_blind < self.small_blind {
            return Err(ConfigError::Invalid(
                "big blind must be at least the small blind".to_string(),
            ));
        }

        if self.max_seats < 2 || self.max_seats > MAX_SEATS {
            return Err(ConfigError::Invalid(format!(
                "max seats must be between 2 and {MAX_SEATS}"
            )));
        }

        if self.max_buy_in < self.big_blind {
            return Err(ConfigError::Invalid(
                "max buy-in must cover the big blind".to_string(),
            ));
        }

        // A full table of maximum buy-ins must still fit in `Chips`.
        if u64::from(self.max_buy_in) * self.max_seats as u64 > u64::from(Chips::MAX) {
            return Err(ConfigError::Invalid(format!(
                "max buy-in of {} over {} seats exceeds the chip limit",
                self.max_buy_in, self.max_seats
            )));
        }

        if self.action_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "action timeout must be positive".to_string(),
            ));
        }

        if self.replay_capacity == 0 {
            return Err(ConfigError::Invalid(
                "replay capacity must be positive".to_string(),
            ));
        }

        if self.replay_threshold > self.replay_capacity {
            return Err(ConfigError::Invalid(
                "replay threshold cannot exceed replay capacity".to_string(),
            ));
        }

        if self.snapshot_every == 0 || self.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid(
                "snapshot interval and subscriber buffer must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }
}

impl From<&TableConfig> for GameSettings {
    fn from(config: &TableConfig) -> Self {
        Self {
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            max_seats: config.max_seats,
            max_buy_in: config.max_buy_in,
            action_timeout: config.action_timeout(),
            cleanup_delay: config.cleanup_delay(),
        }
    }
}
