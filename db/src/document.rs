use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;

/// Schema-free JSON documents grouped into named collections.
///
/// Every document carries a numeric key, the primary key of the relational
/// record it annotates. Keys repeat freely except in
/// [`crate::repository::SINGLE_KEY_COLLECTIONS`], where a second insert fails
/// with a unique violation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `body` under `key` and returns the new document id.
    async fn insert(&self, collection: &str, key: i64, body: Value) -> StoreResult<Uuid>;

    /// All documents under `key`, oldest first.
    async fn find(&self, collection: &str, key: i64) -> StoreResult<Vec<Value>>;

    /// All documents of a collection, oldest first.
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Applies an RFC 7386 merge patch to the oldest document under `key` and
    /// returns the merged body, or `None` when no document exists.
    async fn merge(&self, collection: &str, key: i64, patch: &Value)
        -> StoreResult<Option<Value>>;

    async fn find_one(&self, collection: &str, key: i64) -> StoreResult<Option<Value>> {
        Ok(self.find(collection, key).await?.into_iter().next())
    }

    async fn close(&self) {}
}

/// Merge-patch shared by the backends. `null` members of the patch are
/// skipped instead of deleting the stored field.
pub(crate) fn apply_merge(body: &mut Value, patch: &Value) {
    match patch {
        Value::Object(fields) => {
            let present: serde_json::Map<String, Value> = fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            json_patch::merge(body, &Value::Object(present));
        }
        Value::Null => {}
        other => json_patch::merge(body, other),
    }
}
