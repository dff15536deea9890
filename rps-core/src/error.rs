use thiserror::Error;

pub type Result<T> = std::result::Result<T, RpsError>;

#[derive(Error, Debug)]
pub enum RpsError {
    #[error("Failed to acquire lock '{lock_name}' after {waited_ms}ms")]
    LockAcquireTimeout { lock_name: String, waited_ms: u64 },

    #[error("Failed to release lock '{lock_name}' held as '{holder}'")]
    LockReleaseFailure { lock_name: String, holder: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RpsError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
