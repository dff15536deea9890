use crate::error::{GameError, Result};
use crate::throw::Throw;
use crate::winner::{determine_winner, RoundOutcome};
use rps_core::{DistributedLock, KeyValueStore, Notifier, RpsConfig, RpsError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Single lock name guarding all matchmaking mutations.
pub const MATCHMAKING_LOCK: &str = "matchmaking";

/// Partition key of the one waiting-opponent slot in the game state table.
const PENDING_STATE_KEY: &str = "pending_throw";

const WAITING_MESSAGE: &str = "Waiting for other player";

/// The sole "waiting opponent" record. Zero or one exists at any time:
/// created by the first throw of a round, read and deleted by the second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingThrow {
    pub state: String,
    pub throw: Throw,
    pub phone_number: String,
}

/// What a single invocation did with an inbound throw.
#[derive(Debug, Clone, PartialEq)]
pub enum ThrowOutcome {
    /// Stored as the new pending throw; waiting on a second player.
    Waiting,
    /// Paired against the pending throw; round complete.
    Played(RoundOutcome),
}

/// Turn-pairing state machine over the shared store.
///
/// Each inbound message may be processed by an independently scheduled,
/// concurrently running invocation; the only coordination is the store.
/// In locking mode every read or write of the pending record happens under
/// a live lease, giving linearizable ordering of pairing decisions. With
/// `locking` disabled two concurrent first throws can both observe "no
/// pending record" and overwrite each other; that lost update is inherent
/// to the unlocked mode and intentionally left as-is.
pub struct Matchmaker {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    lock: DistributedLock,
    config: RpsConfig,
}

impl Matchmaker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        config: RpsConfig,
    ) -> Result<Self> {
        config.validate()?;

        let lock = DistributedLock::new(
            store.clone(),
            config.lock_table.clone(),
            config.lock.clone(),
        );

        Ok(Self {
            store,
            notifier,
            lock,
            config,
        })
    }

    /// Handle one inbound message: validate the throw text, then run the
    /// pairing transition. Rejected text never touches game state.
    pub async fn handle_message(&self, message_text: &str, player: &str) -> Result<ThrowOutcome> {
        let throw: Throw = message_text.parse()?;
        self.process_throw(throw, player).await
    }

    /// Record or pair one throw.
    ///
    /// A fresh holder id is generated per invocation, not per process; the
    /// lock is acquired with retry-and-backoff before the pending record is
    /// touched and released afterwards. An exhausted acquire budget is fatal
    /// for this invocation and leaves game state untouched.
    pub async fn process_throw(&self, throw: Throw, player: &str) -> Result<ThrowOutcome> {
        if !self.config.locking {
            return self.run_transition(throw, player).await;
        }

        let holder = Uuid::new_v4().to_string();

        let acquired = self
            .lock
            .acquire_with_retry(MATCHMAKING_LOCK, &holder)
            .await?;
        if !acquired {
            return Err(GameError::Core(RpsError::LockAcquireTimeout {
                lock_name: MATCHMAKING_LOCK.to_string(),
                waited_ms: self.config.lock.max_wait.as_millis() as u64,
            }));
        }

        let outcome = self.run_transition(throw, player).await;

        // Release even after a failed transition so an intact lease is not
        // leaked until expiry. The transition error wins over any release
        // problem.
        let released = self
            .lock
            .release_with_retry(MATCHMAKING_LOCK, &holder)
            .await;

        let outcome = outcome?;
        match released {
            Ok(true) => Ok(outcome),
            Ok(false) => {
                // The lease expired mid-critical-section and someone else
                // took over. The round already committed and players were
                // notified, but this is a correctness alert, not noise.
                tracing::error!(
                    "Lock '{}' was not released by {}; lease expired during the round",
                    MATCHMAKING_LOCK,
                    holder
                );
                Err(GameError::Core(RpsError::LockReleaseFailure {
                    lock_name: MATCHMAKING_LOCK.to_string(),
                    holder,
                }))
            }
            Err(e) => Err(GameError::Core(e)),
        }
    }

    /// The critical section: read the pending slot, then either store this
    /// throw as the new waiting entry or pair it against the stored one.
    /// Store errors propagate; retry is the lock's responsibility, not ours.
    async fn run_transition(&self, throw: Throw, player: &str) -> Result<ThrowOutcome> {
        let existing = self
            .store
            .get(&self.config.game_state_table, PENDING_STATE_KEY)
            .await?;

        match existing {
            None => {
                let pending = PendingThrow {
                    state: PENDING_STATE_KEY.to_string(),
                    throw,
                    phone_number: player.to_string(),
                };

                self.store
                    .put(
                        &self.config.game_state_table,
                        PENDING_STATE_KEY,
                        serde_json::to_value(&pending)?,
                        None,
                    )
                    .await?;

                tracing::info!("Player {} threw {}; waiting for an opponent", player, throw);
                self.send(player, WAITING_MESSAGE).await;

                Ok(ThrowOutcome::Waiting)
            }
            Some(item) => {
                let pending: PendingThrow = serde_json::from_value(item)?;

                let outcome =
                    determine_winner(pending.throw, &pending.phone_number, throw, player);
                let message = outcome.message();

                tracing::info!(
                    "Round complete: {} ({}) vs {} ({}) -> {}",
                    pending.phone_number,
                    pending.throw,
                    player,
                    throw,
                    message
                );

                self.send(&pending.phone_number, &message).await;
                self.send(player, &message).await;

                self.store
                    .delete(&self.config.game_state_table, PENDING_STATE_KEY, None)
                    .await?;

                Ok(ThrowOutcome::Played(outcome))
            }
        }
    }

    /// Fire-and-forget delivery; failures are logged, never retried.
    async fn send(&self, recipient: &str, message: &str) {
        if let Err(e) = self.notifier.notify(recipient, message).await {
            tracing::warn!("Failed to notify {}: {}", recipient, e);
        }
    }

    /// Current pending throw, if any. Read-only peek for status displays;
    /// mutation stays inside the lock-protected transition.
    pub async fn pending_throw(&self) -> Result<Option<PendingThrow>> {
        let item = self
            .store
            .get(&self.config.game_state_table, PENDING_STATE_KEY)
            .await?;

        match item {
            Some(item) => Ok(Some(serde_json::from_value(item)?)),
            None => Ok(None),
        }
    }

    /// Clear the pending slot and the matchmaking lock record.
    pub async fn reset(&self) -> Result<()> {
        self.store
            .delete(&self.config.game_state_table, PENDING_STATE_KEY, None)
            .await?;
        self.store
            .delete(&self.config.lock_table, MATCHMAKING_LOCK, None)
            .await?;

        tracing::info!("Game state reset");
        Ok(())
    }
}
