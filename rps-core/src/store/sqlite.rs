use crate::error::{Result, RpsError};
use crate::store::{Condition, KeyValueStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, TransactionBehavior};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

/// Durable store backed by a single SQLite file.
///
/// Conditional writes run inside an immediate transaction, so evaluating the
/// condition and mutating the row are atomic across every connection to the
/// file, not just within one process's handle. Cross-process contention
/// waits on the busy timeout instead of surfacing as a fatal error. Items
/// are stored as JSON bodies keyed by logical table name plus partition key.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RpsError::store(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS items (
                table_name TEXT NOT NULL,
                item_key TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (table_name, item_key)
            )",
            [],
        )?;

        Ok(())
    }

    fn read_item(conn: &Connection, table: &str, key: &str) -> Result<Option<Value>> {
        let result = conn.query_row(
            "SELECT body FROM items WHERE table_name = ?1 AND item_key = ?2",
            params![table, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RpsError::Storage(e)),
        }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().await;
        Self::read_item(&conn, table, key)
    }

    async fn put(
        &self,
        table: &str,
        key: &str,
        item: Value,
        condition: Option<Condition>,
    ) -> Result<bool> {
        let mut conn = self.conn.lock().await;

        // Immediate transaction takes the write lock up front: between the
        // condition check and the insert no other connection can slip in a
        // write, which is what makes this a compare-and-swap.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(condition) = condition {
            let existing = Self::read_item(&tx, table, key)?;
            if !condition.holds(existing.as_ref()) {
                return Ok(false);
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO items (table_name, item_key, body) VALUES (?1, ?2, ?3)",
            params![table, key, serde_json::to_string(&item)?],
        )?;
        tx.commit()?;

        Ok(true)
    }

    async fn delete(&self, table: &str, key: &str, condition: Option<Condition>) -> Result<bool> {
        let mut conn = self.conn.lock().await;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(condition) = condition {
            let existing = Self::read_item(&tx, table, key)?;
            if !condition.holds(existing.as_ref()) {
                return Ok(false);
            }
        }

        tx.execute(
            "DELETE FROM items WHERE table_name = ?1 AND item_key = ?2",
            params![table, key],
        )?;
        tx.commit()?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn persists_items_across_handles() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rps.db");

        {
            let store = SqliteStore::new(&db_path).await.unwrap();
            store
                .put(
                    "game_state",
                    "pending",
                    json!({"throw": "paper", "phone_number": "+15555550100"}),
                    None,
                )
                .await
                .unwrap();
        }

        // reopen, as a second process invocation would
        let store = SqliteStore::new(&db_path).await.unwrap();
        let item = store.get("game_state", "pending").await.unwrap().unwrap();
        assert_eq!(item["throw"], "paper");
    }

    #[tokio::test]
    async fn conditional_put_fails_on_live_item() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteStore::new(&temp_dir.path().join("rps.db")).await.unwrap();

        assert!(store
            .put("locks", "rps", json!({"holder": "a"}), Some(Condition::Absent))
            .await
            .unwrap());
        assert!(!store
            .put("locks", "rps", json!({"holder": "b"}), Some(Condition::Absent))
            .await
            .unwrap());

        let item = store.get("locks", "rps").await.unwrap().unwrap();
        assert_eq!(item["holder"], "a");
    }

    #[tokio::test]
    async fn conditional_put_is_atomic_across_handles() {
        use std::sync::Arc;

        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("rps.db");

        // two connections to the same file, as two CLI invocations would be
        let first = Arc::new(SqliteStore::new(&db_path).await.unwrap());
        let second = Arc::new(SqliteStore::new(&db_path).await.unwrap());

        for round in 0..100 {
            let key = format!("round-{}", round);

            let a = {
                let store = first.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .put("locks", &key, json!({"holder": "a"}), Some(Condition::Absent))
                        .await
                        .unwrap()
                })
            };
            let b = {
                let store = second.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .put("locks", &key, json!({"holder": "b"}), Some(Condition::Absent))
                        .await
                        .unwrap()
                })
            };

            let outcomes = [a.await.unwrap(), b.await.unwrap()];
            let wins = outcomes.iter().filter(|won| **won).count();
            assert_eq!(wins, 1, "round {}: exactly one racer may win the slot", round);
        }
    }

    #[tokio::test]
    async fn conditional_delete_requires_matching_holder() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteStore::new(&temp_dir.path().join("rps.db")).await.unwrap();

        store
            .put("locks", "rps", json!({"holder": "a"}), None)
            .await
            .unwrap();

        let wrong = Condition::FieldEquals {
            field: "holder".to_string(),
            value: json!("b"),
        };
        assert!(!store.delete("locks", "rps", Some(wrong)).await.unwrap());

        let right = Condition::FieldEquals {
            field: "holder".to_string(),
            value: json!("a"),
        };
        assert!(store.delete("locks", "rps", Some(right)).await.unwrap());
        assert!(store.get("locks", "rps").await.unwrap().is_none());
    }
}
