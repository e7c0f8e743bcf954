//! Stored document shape and the mapping from domain records to
//! collections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Collection, DocId, Gallery, Nft, Nonce, User};

/// The five output collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionName {
    /// User accounts.
    Users,
    /// Galleries.
    Galleries,
    /// NFT collections.
    Collections,
    /// NFTs.
    Nfts,
    /// Login nonces.
    Nonces,
}

impl CollectionName {
    /// Every collection, in insertion order.
    pub const ALL: [Self; 5] = [
        Self::Users,
        Self::Galleries,
        Self::Collections,
        Self::Nfts,
        Self::Nonces,
    ];

    /// Storage name of the collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Galleries => "galleries",
            Self::Collections => "collections",
            Self::Nfts => "nfts",
            Self::Nonces => "nonces",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that is stored as a document in one fixed collection.
pub trait Document: Serialize {
    /// Destination collection.
    const COLLECTION: CollectionName;

    /// Document id (`_id`).
    fn doc_id(&self) -> DocId;
}

impl Document for User {
    const COLLECTION: CollectionName = CollectionName::Users;

    fn doc_id(&self) -> DocId {
        self.id
    }
}

impl Document for Gallery {
    const COLLECTION: CollectionName = CollectionName::Galleries;

    fn doc_id(&self) -> DocId {
        self.id
    }
}

impl Document for Collection {
    const COLLECTION: CollectionName = CollectionName::Collections;

    fn doc_id(&self) -> DocId {
        self.id
    }
}

impl Document for Nft {
    const COLLECTION: CollectionName = CollectionName::Nfts;

    fn doc_id(&self) -> DocId {
        self.id
    }
}

impl Document for Nonce {
    const COLLECTION: CollectionName = CollectionName::Nonces;

    fn doc_id(&self) -> DocId {
        self.id
    }
}

/// A document ready for insertion: its id plus the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document id, duplicated out of the body for keyed storage.
    pub id: String,
    /// Full JSON body, including `_id`.
    pub doc: serde_json::Value,
}

impl StoredDocument {
    /// Serializes a domain record.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the record cannot be represented as JSON.
    pub fn encode<T: Document>(record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: record.doc_id().to_string(),
            doc: serde_json::to_value(record)?,
        })
    }
}
