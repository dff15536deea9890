//! Two-player rock-paper-scissors over asynchronous text messages.
//!
//! Inbound throws arrive on concurrent, stateless invocations. Each one
//! acquires a lease-based distributed lock, then either stores the throw as
//! the waiting opponent or pairs it against the stored one and reports the
//! winner. All durable state lives in the external key-value store.

pub mod error;
pub mod matchmaker;
pub mod throw;
pub mod winner;

pub use error::{GameError, Result};
pub use matchmaker::{Matchmaker, PendingThrow, ThrowOutcome, MATCHMAKING_LOCK};
pub use throw::Throw;
pub use winner::{determine_winner, RoundOutcome};
