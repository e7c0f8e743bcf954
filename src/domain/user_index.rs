//! Read-only lookup from legacy user id to the migrated account.
//!
//! Built completely during user ingestion, then shared by reference with
//! every enrichment worker. Nothing mutates it after construction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::DocId;
use super::documents::User;

/// What an NFT row needs to know about its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Migrated user id.
    pub user_id: DocId,
    /// Lower-cased wallet address.
    pub address: String,
    /// Owner's legacy creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for Owner {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            address: user.primary_address().to_string(),
            created_at: user.created_at,
        }
    }
}

/// Immutable legacy-id → [`Owner`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct UserIndex {
    owners: HashMap<String, Owner>,
}

impl UserIndex {
    /// Returns the owner registered under `old_id`.
    #[must_use]
    pub fn get(&self, old_id: &str) -> Option<&Owner> {
        self.owners.get(old_id)
    }

    /// Number of indexed users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns `true` if no users are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Builder used by user ingestion; the only way to populate a
/// [`UserIndex`].
#[derive(Debug, Default)]
pub struct UserIndexBuilder {
    owners: HashMap<String, Owner>,
}

impl UserIndexBuilder {
    /// Registers `user` under its legacy id. Returns `false` and leaves the
    /// index untouched if the id is already taken.
    pub fn insert(&mut self, old_id: &str, user: &User) -> bool {
        if self.owners.contains_key(old_id) {
            return false;
        }
        self.owners.insert(old_id.to_string(), Owner::from(user));
        true
    }

    /// Freezes the index.
    #[must_use]
    pub fn build(self) -> UserIndex {
        UserIndex {
            owners: self.owners,
        }
    }
}
