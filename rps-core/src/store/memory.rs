use crate::error::Result;
use crate::store::{Condition, KeyValueStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory store for tests and ephemeral runs.
///
/// A single mutex over the map gives every conditional write exclusive
/// access between condition check and mutation, matching the atomicity the
/// lock requires from a real backend.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        let items = self.items.lock();
        Ok(items.get(&(table.to_string(), key.to_string())).cloned())
    }

    async fn put(
        &self,
        table: &str,
        key: &str,
        item: Value,
        condition: Option<Condition>,
    ) -> Result<bool> {
        let mut items = self.items.lock();
        let entry_key = (table.to_string(), key.to_string());

        if let Some(condition) = condition {
            if !condition.holds(items.get(&entry_key)) {
                return Ok(false);
            }
        }

        items.insert(entry_key, item);
        Ok(true)
    }

    async fn delete(&self, table: &str, key: &str, condition: Option<Condition>) -> Result<bool> {
        let mut items = self.items.lock();
        let entry_key = (table.to_string(), key.to_string());

        if let Some(condition) = condition {
            if !condition.holds(items.get(&entry_key)) {
                return Ok(false);
            }
        }

        items.remove(&entry_key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryStore::new();

        assert!(store.get("game_state", "pending").await.unwrap().is_none());

        let stored = store
            .put("game_state", "pending", json!({"throw": "rock"}), None)
            .await
            .unwrap();
        assert!(stored);

        let item = store.get("game_state", "pending").await.unwrap().unwrap();
        assert_eq!(item["throw"], "rock");

        assert!(store.delete("game_state", "pending", None).await.unwrap());
        assert!(store.get("game_state", "pending").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_put_respects_absent() {
        let store = MemoryStore::new();

        let first = store
            .put("locks", "rps", json!({"holder": "a"}), Some(Condition::Absent))
            .await
            .unwrap();
        assert!(first);

        let second = store
            .put("locks", "rps", json!({"holder": "b"}), Some(Condition::Absent))
            .await
            .unwrap();
        assert!(!second);

        // losing writer must not have clobbered the item
        let item = store.get("locks", "rps").await.unwrap().unwrap();
        assert_eq!(item["holder"], "a");
    }

    #[tokio::test]
    async fn conditional_delete_checks_field() {
        let store = MemoryStore::new();
        store
            .put("locks", "rps", json!({"holder": "a"}), None)
            .await
            .unwrap();

        let wrong_holder = Condition::FieldEquals {
            field: "holder".to_string(),
            value: json!("b"),
        };
        assert!(!store.delete("locks", "rps", Some(wrong_holder)).await.unwrap());
        assert!(store.get("locks", "rps").await.unwrap().is_some());

        let right_holder = Condition::FieldEquals {
            field: "holder".to_string(),
            value: json!("a"),
        };
        assert!(store.delete("locks", "rps", Some(right_holder)).await.unwrap());
        assert!(store.get("locks", "rps").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tables_are_isolated() {
        let store = MemoryStore::new();
        store
            .put("locks", "key", json!({"a": 1}), None)
            .await
            .unwrap();
        assert!(store.get("game_state", "key").await.unwrap().is_none());
    }
}
