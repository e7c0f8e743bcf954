//! Opaque document identifier.
//!
//! [`DocId`] is a newtype wrapper around [`uuid::Uuid`] (v4). Every output
//! document gets a fresh one at creation time; nothing about the legacy row
//! is encoded in it, so two runs over the same export never share ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a migrated document (user, nonce, gallery, collection or
/// NFT).
///
/// Serialized as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(uuid::Uuid);

impl DocId {
    /// Creates a new random `DocId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
