//! Core library for the rock-paper-scissors messaging game.
//!
//! Provides the key-value store abstraction with conditional writes, the
//! lease-based distributed lock built on top of it, the messaging-gateway
//! trait and the service configuration. Game logic lives in `rps-game`.

pub mod config;
pub mod error;
pub mod lock;
pub mod notify;
pub mod store;

pub use config::{LockConfig, RpsConfig};
pub use error::{Result, RpsError};
pub use lock::{now_ms, DistributedLock, LockRecord};
pub use notify::Notifier;
pub use store::{Condition, KeyValueStore, MemoryStore, SqliteStore};
