//! Output documents written to the document store.
//!
//! Field names follow the Gallery backend's stored shape (`_id`,
//! `created_at`, `owner_user_id`, ...). Every document starts at schema
//! `version` 0 and `deleted = false`.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::DocId;
use super::legacy::LegacyUser;

/// Smallest 19-digit number.
const NONCE_MIN: u64 = 1_000_000_000_000_000_000;
/// One past the largest 19-digit number.
const NONCE_MAX: u64 = 10_000_000_000_000_000_000;

/// A migrated user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Schema version.
    pub version: i64,
    /// Creation time carried over from the legacy account.
    pub created_at: DateTime<Utc>,
    /// Time of the migration run.
    pub last_updated: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Display name, original casing.
    pub username: String,
    /// Lower-cased username used for uniqueness lookups.
    pub username_idempotent: String,
    /// Lower-cased wallet addresses.
    pub addresses: Vec<String>,
    /// Profile text; the legacy site had none.
    pub bio: String,
}

impl User {
    /// Builds the user document for a legacy row.
    #[must_use]
    pub fn from_legacy(legacy: &LegacyUser, migrated_at: DateTime<Utc>) -> Self {
        Self {
            id: DocId::new(),
            version: 0,
            created_at: legacy.created_at,
            last_updated: migrated_at,
            deleted: false,
            username: legacy.username.clone(),
            username_idempotent: legacy.username.to_lowercase(),
            addresses: vec![legacy.wallet_address.to_lowercase()],
            bio: String::new(),
        }
    }

    /// The address the account signs in with.
    #[must_use]
    pub fn primary_address(&self) -> &str {
        self.addresses.first().map_or("", String::as_str)
    }
}

/// Login nonce for wallet-signature authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Schema version.
    pub version: i64,
    /// Creation time (owner's legacy creation time).
    pub created_at: DateTime<Utc>,
    /// Time of the migration run.
    pub last_updated: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Owning user.
    pub user_id: DocId,
    /// Lower-cased wallet address the nonce is issued for.
    pub address: String,
    /// Random 19-digit decimal string.
    pub value: String,
}

impl Nonce {
    /// Issues a fresh nonce for `user`.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            id: DocId::new(),
            version: 0,
            created_at: user.created_at,
            last_updated: user.last_updated,
            deleted: false,
            user_id: user.id,
            address: user.primary_address().to_string(),
            value: generate_nonce_value(),
        }
    }
}

/// Returns a uniformly random 19-digit decimal string.
#[must_use]
pub fn generate_nonce_value() -> String {
    rand::thread_rng()
        .gen_range(NONCE_MIN..NONCE_MAX)
        .to_string()
}

/// An ordered group of NFTs owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Schema version.
    pub version: i64,
    /// Creation time (owner's legacy creation time).
    pub created_at: DateTime<Utc>,
    /// Time of the migration run.
    pub last_updated: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Display name. Default collections are unnamed.
    pub name: String,
    /// Owner's note on the collection.
    pub collectors_note: String,
    /// Owning user.
    pub owner_user_id: DocId,
    /// NFT ids in display order.
    pub nfts: Vec<DocId>,
    /// Hidden from public view.
    pub hidden: bool,
}

impl Collection {
    /// The empty, visible default collection every migrated user gets.
    #[must_use]
    pub fn default_for(user: &User) -> Self {
        Self {
            id: DocId::new(),
            version: 0,
            created_at: user.created_at,
            last_updated: user.last_updated,
            deleted: false,
            name: String::new(),
            collectors_note: String::new(),
            owner_user_id: user.id,
            nfts: Vec::new(),
            hidden: false,
        }
    }
}

/// A user's gallery: the list of their collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Schema version.
    pub version: i64,
    /// Creation time (owner's legacy creation time).
    pub created_at: DateTime<Utc>,
    /// Time of the migration run.
    pub last_updated: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Owning user.
    pub owner_user_id: DocId,
    /// Collection ids in display order.
    pub collections: Vec<DocId>,
}

impl Gallery {
    /// Gallery holding exactly `collection`.
    #[must_use]
    pub fn for_user(user: &User, collection: &Collection) -> Self {
        Self {
            id: DocId::new(),
            version: 0,
            created_at: user.created_at,
            last_updated: user.last_updated,
            deleted: false,
            owner_user_id: user.id,
            collections: vec![collection.id],
        }
    }
}

/// Token contract reference embedded in an [`Nft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract address.
    pub contract_address: String,
}

/// A migrated, marketplace-enriched NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nft {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Schema version.
    pub version: i64,
    /// Creation time (owner's legacy creation time).
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Owner's note on the token.
    pub collectors_note: String,
    /// Project URL.
    pub external_url: String,
    /// Token metadata URI reported by the marketplace.
    pub token_metadata_url: String,
    /// Creator wallet address.
    pub creator_address: String,
    /// Creator marketplace username.
    pub creator_name: String,
    /// Lower-cased wallet of the owning user.
    pub owner_address: String,
    /// Owning user.
    pub owner_user_id: DocId,
    /// Token contract.
    pub contract: Contract,
    /// Name of the marketplace collection the token belongs to.
    pub token_collection_name: String,
    /// Marketplace asset id.
    pub opensea_id: i64,
    /// Token id within the contract.
    pub opensea_token_id: String,
    /// Main image URL.
    pub image_url: String,
    /// Thumbnail URL.
    pub image_thumbnail_url: String,
    /// Preview URL.
    pub image_preview_url: String,
    /// Original-resolution image URL.
    pub image_original_url: String,
    /// Animation URL.
    pub animation_url: String,
    /// Original animation URL.
    pub animation_original_url: String,
    /// When the owner acquired the token; not known at migration time.
    pub acquisition_date: String,
}
