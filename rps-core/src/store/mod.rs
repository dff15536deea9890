pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Predicate over the item currently stored under a key (or its absence).
///
/// Conditions are evaluated by store implementations while they hold
/// exclusive access to the item, which is what turns `put`/`delete` into
/// compare-and-swap operations rather than read-then-write.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No item is stored under the key.
    Absent,
    /// The stored item has `field` equal to `value`. False if absent.
    FieldEquals { field: String, value: Value },
    /// The stored item has a numeric `field` less than `value`. False if absent.
    FieldLessThan { field: String, value: i64 },
    /// Either branch holds.
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn or(self, other: Condition) -> Condition {
        Condition::Or(Box::new(self), Box::new(other))
    }

    pub fn holds(&self, existing: Option<&Value>) -> bool {
        match self {
            Condition::Absent => existing.is_none(),
            Condition::FieldEquals { field, value } => existing
                .and_then(|item| item.get(field))
                .map_or(false, |found| found == value),
            Condition::FieldLessThan { field, value } => existing
                .and_then(|item| item.get(field))
                .and_then(|found| found.as_i64())
                .map_or(false, |found| found < *value),
            Condition::Or(left, right) => left.holds(existing) || right.holds(existing),
        }
    }
}

/// A table-and-key addressed store of JSON items with conditional writes.
///
/// `put` and `delete` return `Ok(false)` when the condition did not hold.
/// That outcome is expected and drives retry at the caller; any `Err` is a
/// fatal store failure and must propagate. Callers never have to inspect
/// error strings to tell the two apart.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Value>>;

    async fn put(
        &self,
        table: &str,
        key: &str,
        item: Value,
        condition: Option<Condition>,
    ) -> Result<bool>;

    async fn delete(&self, table: &str, key: &str, condition: Option<Condition>) -> Result<bool>;
}
