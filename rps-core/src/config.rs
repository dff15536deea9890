use crate::error::{Result, RpsError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service configuration, passed explicitly into constructors at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpsConfig {
    pub game_state_table: String,
    pub lock_table: String,
    /// When false the matchmaker skips lock acquisition entirely. Two
    /// concurrent first throws can then overwrite each other (lost update).
    pub locking: bool,
    pub lock: LockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// A lease older than this is considered expired and free to take.
    pub expiration_ms: i64,
    pub backoff_multiplier: f64,
    pub initial_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RpsConfig {
    fn default() -> Self {
        Self {
            game_state_table: "game_state".to_string(),
            lock_table: "lock_table".to_string(),
            locking: true,
            lock: LockConfig::default(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            expiration_ms: 5_000,
            backoff_multiplier: 2.0,
            initial_wait: Duration::from_millis(50),
            max_wait: Duration::from_secs(6),
        }
    }
}

impl RpsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.game_state_table.is_empty() {
            return Err(RpsError::config("Game state table name cannot be empty"));
        }

        if self.lock_table.is_empty() {
            return Err(RpsError::config("Lock table name cannot be empty"));
        }

        self.lock.validate()
    }
}

impl LockConfig {
    pub fn validate(&self) -> Result<()> {
        if self.expiration_ms <= 0 {
            return Err(RpsError::config("Lock expiration must be greater than 0"));
        }

        if self.backoff_multiplier <= 1.0 {
            return Err(RpsError::config(
                "Backoff multiplier must be greater than 1.0",
            ));
        }

        if self.initial_wait.is_zero() {
            return Err(RpsError::config("Initial lock wait must be greater than 0"));
        }

        if self.max_wait < self.initial_wait {
            return Err(RpsError::config(
                "Max lock wait must be at least the initial wait",
            ));
        }

        Ok(())
    }
}
