//! In-process document store for dry runs and tests.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use super::{CollectionName, DocumentStore, StoredDocument};
use crate::error::MigrationError;

/// Document store held in memory.
///
/// Enforces unique ids per collection like a primary key would. Can be
/// told to reject every batch for chosen collections, which is how partial
/// persistence is exercised.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionName, Vec<StoredDocument>>>,
    failing: HashSet<CollectionName>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects all inserts into `collection`.
    #[must_use]
    pub fn failing_on(collection: CollectionName) -> Self {
        Self {
            failing: HashSet::from([collection]),
            ..Self::default()
        }
    }

    /// Returns a copy of everything stored in `collection`, in insertion
    /// order.
    pub async fn documents(&self, collection: CollectionName) -> Vec<StoredDocument> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn insert_many(
        &self,
        collection: CollectionName,
        docs: Vec<StoredDocument>,
    ) -> Result<u64, MigrationError> {
        if self.failing.contains(&collection) {
            return Err(MigrationError::Persistence(format!(
                "{collection}: batch rejected"
            )));
        }

        let mut map = self.collections.write().await;
        let stored = map.entry(collection).or_default();
        let mut seen: HashSet<&str> = stored.iter().map(|d| d.id.as_str()).collect();
        for doc in &docs {
            if !seen.insert(doc.id.as_str()) {
                return Err(MigrationError::Persistence(format!(
                    "{collection}: duplicate id {}",
                    doc.id
                )));
            }
        }

        let inserted = u64::try_from(docs.len()).unwrap_or(u64::MAX);
        stored.extend(docs);
        Ok(inserted)
    }

    async fn count(&self, collection: CollectionName) -> Result<u64, MigrationError> {
        let map = self.collections.read().await;
        let len = map.get(&collection).map_or(0, Vec::len);
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            doc: serde_json::json!({ "_id": id }),
        }
    }

    #[tokio::test]
    async fn insert_and_count() {
        let store = MemoryDocumentStore::new();
        let inserted = store
            .insert_many(CollectionName::Users, vec![doc("a"), doc("b")])
            .await;
        assert!(matches!(inserted, Ok(2)));
        assert!(matches!(store.count(CollectionName::Users).await, Ok(2)));
        assert!(matches!(store.count(CollectionName::Nfts).await, Ok(0)));
        assert_eq!(store.documents(CollectionName::Users).await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = MemoryDocumentStore::new();
        let nfts = CollectionName::Nfts;
        let first = store.insert_many(nfts, vec![doc("a")]).await;
        assert!(first.is_ok());
        let result = store.insert_many(nfts, vec![doc("a")]).await;
        assert!(matches!(result, Err(MigrationError::Persistence(_))));
        assert!(matches!(store.count(CollectionName::Nfts).await, Ok(1)));
    }

    #[tokio::test]
    async fn failing_collection_rejects_batches() {
        let store = MemoryDocumentStore::failing_on(CollectionName::Nfts);
        let (users, nfts) = (CollectionName::Users, CollectionName::Nfts);
        assert!(store.insert_many(users, vec![doc("a")]).await.is_ok());
        assert!(store.insert_many(nfts, vec![doc("b")]).await.is_err());
    }
}
