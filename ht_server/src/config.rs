//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem_table::{
    entities::Chips,
    table::{ConfigError as TableConfigError, TableConfig, TableId},
};

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Identifier stamped on snapshots and persisted events
    pub table_id: TableId,
    /// Table settings
    pub table: TableConfig,
    /// Fixed shuffle seed for reproducible sessions
    pub seed: Option<u64>,
}

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub name: Option<String>,
    pub max_seats: Option<usize>,
    pub small_blind: Option<Chips>,
    pub big_blind: Option<Chips>,
    pub seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable that has no default is malformed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration through `lookup` instead of the process environment
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: CliOverrides,
    ) -> Result<Self, ConfigError> {
        let defaults = TableConfig::default();

        let table = TableConfig {
            name: overrides
                .name
                .or_else(|| lookup("TABLE_NAME"))
                .unwrap_or(defaults.name),
            max_seats: overrides
                .max_seats
                .unwrap_or_else(|| parse_env_or(&lookup, "TABLE_MAX_SEATS", defaults.max_seats)),
            small_blind: overrides.small_blind.unwrap_or_else(|| {
                parse_env_or(&lookup, "TABLE_SMALL_BLIND", defaults.small_blind)
            }),
            big_blind: overrides
                .big_blind
                .unwrap_or_else(|| parse_env_or(&lookup, "TABLE_BIG_BLIND", defaults.big_blind)),
            max_buy_in: parse_env_or(&lookup, "TABLE_MAX_BUY_IN", defaults.max_buy_in),
            action_timeout_secs: parse_env_or(
                &lookup,
                "TABLE_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            ),
            cleanup_delay_ms: parse_env_or(
                &lookup,
                "TABLE_CLEANUP_DELAY_MS",
                defaults.cleanup_delay_ms,
            ),
            replay_capacity: parse_env_or(
                &lookup,
                "TABLE_REPLAY_CAPACITY",
                defaults.replay_capacity,
            ),
            replay_threshold: parse_env_or(
                &lookup,
                "TABLE_REPLAY_THRESHOLD",
                defaults.replay_threshold,
            ),
            snapshot_every: parse_env_or(&lookup, "TABLE_SNAPSHOT_EVERY", defaults.snapshot_every),
            subscriber_buffer: parse_env_or(
                &lookup,
                "TABLE_SUBSCRIBER_BUFFER",
                defaults.subscriber_buffer,
            ),
        };

        // A seed that silently fell back to random would defeat its purpose.
        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => match lookup("TABLE_SEED") {
                Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "TABLE_SEED".to_string(),
                    reason: format!("'{raw}' is not an unsigned integer"),
                })?),
                None => None,
            },
        };

        Ok(ServerConfig {
            table_id: parse_env_or(&lookup, "TABLE_ID", 1),
            table,
            seed,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.table.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Table(#[from] TableConfigError),
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], overrides: CliOverrides) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned(), overrides)
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load(&[], CliOverrides::default()).unwrap();
        assert_eq!(config.table_id, 1);
        assert_eq!(config.table, TableConfig::default());
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_values() {
        let config = load(
            &[
                ("TABLE_ID", "12"),
                ("TABLE_NAME", "High Stakes"),
                ("TABLE_MAX_SEATS", "6"),
                ("TABLE_SMALL_BLIND", "25"),
                ("TABLE_BIG_BLIND", "50"),
                ("TABLE_MAX_BUY_IN", "20000"),
                ("TABLE_ACTION_TIMEOUT_SECS", "30"),
                ("TABLE_SEED", "99"),
            ],
            CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.table_id, 12);
        assert_eq!(config.table.name, "High Stakes");
        assert_eq!(config.table.max_seats, 6);
        assert_eq!(config.table.small_blind, 25);
        assert_eq!(config.table.big_blind, 50);
        assert_eq!(config.table.max_buy_in, 20_000);
        assert_eq!(config.table.action_timeout_secs, 30);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = CliOverrides {
            name: Some("Cli Table".to_string()),
            max_seats: Some(2),
            seed: Some(5),
            ..CliOverrides::default()
        };
        let config = load(
            &[("TABLE_MAX_SEATS", "6"), ("TABLE_SEED", "not-used")],
            overrides,
        )
        .unwrap();
        assert_eq!(config.table.name, "Cli Table");
        assert_eq!(config.table.max_seats, 2);
        assert_eq!(config.seed, Some(5));
    }

    #[test]
    fn test_malformed_number_falls_back_to_default() {
        let config = load(&[("TABLE_BIG_BLIND", "lots")], CliOverrides::default()).unwrap();
        assert_eq!(config.table.big_blind, TableConfig::default().big_blind);
    }

    #[test]
    fn test_malformed_seed_is_an_error() {
        let err = load(&[("TABLE_SEED", "abc")], CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TABLE_SEED"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let config = load(
            &[("TABLE_SMALL_BLIND", "20"), ("TABLE_BIG_BLIND", "10")],
            CliOverrides::default(),
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Table(TableConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_validation_too_many_seats() {
        let config = load(&[("TABLE_MAX_SEATS", "40")], CliOverrides::default()).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_buy_in_overflows_table() {
        let config = load(
            &[("TABLE_MAX_SEATS", "9"), ("TABLE_MAX_BUY_IN", "3000000000")],
            CliOverrides::default(),
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Table(TableConfigError::Invalid(_)))
        ));
    }
}
