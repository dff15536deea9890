use crate::config::LockConfig;
use crate::error::Result;
use crate::store::{Condition, KeyValueStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A lease entry in the lock table. At most one live (non-expired) record
/// exists per `lock_name`; the record is free for acquisition when absent or
/// when `time_acquired` is older than `now - expiration_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub lock_name: String,
    pub holder: String,
    /// Milliseconds since epoch at the moment the record was written.
    pub time_acquired: i64,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Mutual exclusion across stateless, concurrently invoked handlers.
///
/// The store's conditional write is the only atomicity primitive used: two
/// invocations racing on the same lock name have exactly one conditional put
/// succeed. Leases expire rather than being held forever so a holder that
/// crashes mid-critical-section cannot deadlock the game permanently.
///
/// All invocations compare wall-clock time fetched independently; a shared,
/// reasonably synchronised clock source is assumed.
pub struct DistributedLock {
    store: Arc<dyn KeyValueStore>,
    table: String,
    config: LockConfig,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KeyValueStore>, table: impl Into<String>, config: LockConfig) -> Self {
        Self {
            store,
            table: table.into(),
            config,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Single conditional attempt to take the lease.
    ///
    /// Returns `Ok(true)` if this holder now owns the lock, `Ok(false)` if a
    /// live lease exists. Store failures other than the condition check
    /// propagate untouched.
    pub async fn acquire(&self, lock_name: &str, holder: &str) -> Result<bool> {
        let now = now_ms();
        let record = LockRecord {
            lock_name: lock_name.to_string(),
            holder: holder.to_string(),
            time_acquired: now,
        };

        let free = Condition::Absent.or(Condition::FieldLessThan {
            field: "time_acquired".to_string(),
            value: now - self.config.expiration_ms,
        });

        let acquired = self
            .store
            .put(
                &self.table,
                lock_name,
                serde_json::to_value(&record)?,
                Some(free),
            )
            .await?;

        if acquired {
            tracing::debug!("Lock '{}' acquired by {}", lock_name, holder);
        }

        Ok(acquired)
    }

    /// Conditionally delete the lease, only if still held by `holder`.
    ///
    /// `Ok(false)` means the record is gone or owned by someone else, which
    /// happens when the lease expired mid-critical-section and another
    /// invocation took it over. Callers must surface that, not swallow it.
    pub async fn release(&self, lock_name: &str, holder: &str) -> Result<bool> {
        let held_by_us = Condition::FieldEquals {
            field: "holder".to_string(),
            value: json!(holder),
        };

        let released = self
            .store
            .delete(&self.table, lock_name, Some(held_by_us))
            .await?;

        if released {
            tracing::debug!("Lock '{}' released by {}", lock_name, holder);
        } else {
            tracing::warn!(
                "Lock '{}' no longer held by {}; lease may have expired",
                lock_name,
                holder
            );
        }

        Ok(released)
    }

    pub async fn acquire_with_retry(&self, lock_name: &str, holder: &str) -> Result<bool> {
        self.retry_with_backoff(|| self.acquire(lock_name, holder))
            .await
    }

    pub async fn release_with_retry(&self, lock_name: &str, holder: &str) -> Result<bool> {
        self.retry_with_backoff(|| self.release(lock_name, holder))
            .await
    }

    /// Repeat `operation` with exponentially growing sleeps until it returns
    /// `true` or the cumulative wait reaches `max_wait`. Returns the final
    /// result; exhausting the budget is `Ok(false)`, never an endless loop.
    pub async fn retry_with_backoff<F, Fut>(&self, mut operation: F) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut delay = self.config.initial_wait;
        let mut waited = Duration::ZERO;

        loop {
            if operation().await? {
                return Ok(true);
            }

            if waited >= self.config.max_wait {
                return Ok(false);
            }

            tokio::time::sleep(delay).await;
            waited += delay;
            delay = delay.mul_f64(self.config.backoff_multiplier);
        }
    }
}
