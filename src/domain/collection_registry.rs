//! Per-user default collections with per-collection locking.
//!
//! [`CollectionRegistry`] stores every user's default collection in a
//! `HashMap` keyed by legacy user id, where each entry is individually
//! protected by a [`tokio::sync::Mutex`]. Enrichment workers append NFT ids
//! concurrently; appends to different users never contend.
//!
//! Workers finish in arbitrary order, so every appended id carries its
//! [`DisplayKey`]. The final order is restored when the registry is
//! flattened with [`CollectionRegistry::into_collections`].

use std::collections::HashMap;

use tokio::sync::{Mutex, RwLock};

use super::DocId;
use super::documents::Collection;

/// Sort key of an NFT within its collection.
///
/// `position` is the legacy display position; `sequence` is the row's index
/// in the position-sorted dispatch order and breaks ties between equal
/// positions the same way the sort did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayKey {
    /// Legacy display position.
    pub position: i64,
    /// Index in dispatch order.
    pub sequence: usize,
}

#[derive(Debug)]
struct CollectionEntry {
    collection: Collection,
    members: Vec<(DisplayKey, DocId)>,
}

impl CollectionEntry {
    fn ordered(mut self) -> Collection {
        self.members.sort_by_key(|(key, _)| *key);
        self.collection.nfts = self.members.into_iter().map(|(_, id)| id).collect();
        self.collection
    }

    fn snapshot(&self) -> Collection {
        let mut members = self.members.clone();
        members.sort_by_key(|(key, _)| *key);
        let mut collection = self.collection.clone();
        collection.nfts = members.into_iter().map(|(_, id)| id).collect();
        collection
    }
}

/// Central store for the default collection of every migrated user.
///
/// # Concurrency
///
/// - Inserts happen during user ingestion, before any worker starts.
/// - Appends to different collections proceed concurrently.
/// - Appends to the same collection are serialized.
#[derive(Debug)]
pub struct CollectionRegistry {
    collections: RwLock<HashMap<String, Mutex<CollectionEntry>>>,
}

impl CollectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `collection` as the default collection of legacy user
    /// `old_id`. Any NFT ids already on the collection are discarded.
    ///
    /// Returns `false` without replacing anything if the id is taken.
    pub async fn insert(&self, old_id: &str, mut collection: Collection) -> bool {
        let mut map = self.collections.write().await;
        if map.contains_key(old_id) {
            return false;
        }
        collection.nfts.clear();
        map.insert(
            old_id.to_string(),
            Mutex::new(CollectionEntry {
                collection,
                members: Vec::new(),
            }),
        );
        true
    }

    /// Appends `nft_id` to the default collection of `old_id`.
    ///
    /// Returns `false` if no collection is registered for that user.
    pub async fn append(&self, old_id: &str, key: DisplayKey, nft_id: DocId) -> bool {
        let map = self.collections.read().await;
        let Some(entry) = map.get(old_id) else {
            return false;
        };
        entry.lock().await.members.push((key, nft_id));
        true
    }

    /// Returns an ordered copy of the collection registered for `old_id`.
    pub async fn get(&self, old_id: &str) -> Option<Collection> {
        let map = self.collections.read().await;
        let entry = map.get(old_id)?;
        let snapshot = entry.lock().await.snapshot();
        Some(snapshot)
    }

    /// Returns the number of registered collections.
    pub async fn len(&self) -> usize {
        self.collections.read().await.len()
    }

    /// Returns `true` if the registry contains no collections.
    pub async fn is_empty(&self) -> bool {
        self.collections.read().await.is_empty()
    }

    /// Flattens the registry into collection documents, each with `nfts`
    /// in [`DisplayKey`] order. The order of the returned list itself is
    /// unspecified.
    #[must_use]
    pub fn into_collections(self) -> Vec<Collection> {
        self.collections
            .into_inner()
            .into_values()
            .map(|entry| entry.into_inner().ordered())
            .collect()
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::domain::documents::User;
    use crate::domain::legacy::LegacyUser;

    fn make_collection() -> Collection {
        let legacy = LegacyUser {
            old_id: "1".to_string(),
            username: "alice".to_string(),
            wallet_address: "0xAAA".to_string(),
            created_at: Utc::now(),
        };
        Collection::default_for(&User::from_legacy(&legacy, Utc::now()))
    }

    fn key(position: i64, sequence: usize) -> DisplayKey {
        DisplayKey { position, sequence }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = CollectionRegistry::new();
        let collection = make_collection();
        let id = collection.id;

        assert!(registry.insert("1", collection).await);
        let fetched = registry.get("1").await;
        assert_eq!(fetched.map(|c| c.id), Some(id));
        assert!(registry.get("2").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_refused() {
        let registry = CollectionRegistry::new();
        let first = make_collection();
        let first_id = first.id;
        assert!(registry.insert("1", first).await);
        assert!(!registry.insert("1", make_collection()).await);
        assert_eq!(registry.get("1").await.map(|c| c.id), Some(first_id));
    }

    #[tokio::test]
    async fn append_to_unknown_owner_returns_false() {
        let registry = CollectionRegistry::new();
        assert!(!registry.append("404", key(0, 0), DocId::new()).await);
    }

    #[tokio::test]
    async fn out_of_order_appends_come_back_sorted() {
        let registry = CollectionRegistry::new();
        assert!(registry.insert("1", make_collection()).await);

        let a = DocId::new();
        let b = DocId::new();
        let c = DocId::new();
        assert!(registry.append("1", key(9, 2), c).await);
        assert!(registry.append("1", key(0, 0), a).await);
        assert!(registry.append("1", key(4, 1), b).await);

        let Some(snapshot) = registry.get("1").await else {
            panic!("collection missing");
        };
        assert_eq!(snapshot.nfts, vec![a, b, c]);

        let flattened = registry.into_collections();
        assert_eq!(flattened.len(), 1);
        let nfts = flattened.first().map(|c| c.nfts.clone());
        assert_eq!(nfts, Some(vec![a, b, c]));
    }

    #[tokio::test]
    async fn equal_positions_keep_dispatch_order() {
        let registry = CollectionRegistry::new();
        assert!(registry.insert("1", make_collection()).await);
        let first = DocId::new();
        let second = DocId::new();
        assert!(registry.append("1", key(3, 8), second).await);
        assert!(registry.append("1", key(3, 5), first).await);

        let collections = registry.into_collections();
        let nfts = collections.first().map(|c| c.nfts.clone());
        assert_eq!(nfts, Some(vec![first, second]));
    }

    #[tokio::test]
    async fn concurrent_appends_across_users() {
        let registry = Arc::new(CollectionRegistry::new());
        for user in 0..4 {
            assert!(registry.insert(&user.to_string(), make_collection()).await);
        }

        let mut handles = Vec::new();
        for seq in 0..200usize {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let owner = (seq % 4).to_string();
                let position = i64::try_from(seq).unwrap_or(i64::MAX);
                let id = DocId::new();
                registry.append(&owner, key(position, seq), id).await
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await, Ok(true)));
        }

        assert_eq!(registry.len().await, 4);
        let Ok(registry) = Arc::try_unwrap(registry) else {
            panic!("registry still shared");
        };
        let total: usize = registry
            .into_collections()
            .iter()
            .map(|c| c.nfts.len())
            .sum();
        assert_eq!(total, 200);
    }
}
