//! Marketplace enrichment: asset metadata lookup by contract and token id.
//!
//! [`AssetSource`] is the seam between the ingestion stage and the outside
//! world. [`OpenSeaClient`] is the production implementation; tests plug in
//! in-process stubs.

pub mod opensea;

pub use opensea::OpenSeaClient;

use std::future::Future;

use crate::error::EnrichmentError;

/// Asset fields the migration takes from the marketplace.
///
/// Only `id` is guaranteed; the marketplace returns `null` freely for the
/// rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Marketplace asset id.
    pub id: i64,
    /// Token id as reported by the marketplace.
    pub token_id: Option<String>,
    /// Asset name.
    pub name: Option<String>,
    /// Asset description.
    pub description: Option<String>,
    /// Project link.
    pub external_link: Option<String>,
    /// Main image.
    pub image_url: Option<String>,
    /// Preview image.
    pub image_preview_url: Option<String>,
    /// Thumbnail image.
    pub image_thumbnail_url: Option<String>,
    /// Original-resolution image.
    pub image_original_url: Option<String>,
    /// Animation.
    pub animation_url: Option<String>,
    /// Original animation.
    pub animation_original_url: Option<String>,
    /// Token metadata URI.
    pub token_metadata_url: Option<String>,
    /// Marketplace collection name.
    pub collection_name: Option<String>,
    /// Creator wallet address.
    pub creator_address: Option<String>,
    /// Creator marketplace username.
    pub creator_username: Option<String>,
}

/// Source of asset metadata keyed by `(contract_address, token_id)`.
///
/// Implementations make a single attempt; the caller owns timeouts and
/// never retries.
pub trait AssetSource: Send + Sync {
    /// Looks up one asset.
    ///
    /// # Errors
    ///
    /// Returns an [`EnrichmentError`] describing why no usable metadata was
    /// obtained.
    fn fetch_asset(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> impl Future<Output = Result<AssetMetadata, EnrichmentError>> + Send;
}
