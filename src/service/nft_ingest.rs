//! Stage 2: validate, enrich and collect NFT rows.
//!
//! Rows are sorted by display position and dispatched to at most
//! `concurrency` in-flight enrichment requests. Workers finish in any order;
//! each collection append carries the row's [`DisplayKey`] so the final
//! order does not depend on completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use crate::domain::{
    Accumulator, CollectionRegistry, Contract, DisplayKey, DocId, ErrorRecord, LegacyNft, Nft,
    Owner, UserIndex,
};
use crate::enrichment::{AssetMetadata, AssetSource};
use crate::error::{EnrichmentError, RejectReason};

/// Everything NFT ingestion produces.
#[derive(Debug, Default)]
pub struct IngestedNfts {
    /// Successfully enriched NFTs, hidden ones included.
    pub nfts: Vec<Nft>,
    /// How many of `nfts` were left out of their owner's collection.
    pub hidden: usize,
    /// Rows rejected during validation or enrichment.
    pub errors: Vec<ErrorRecord>,
}

/// One NFT ingestion run over a frozen user index.
#[derive(Debug)]
pub struct NftIngest<'a, S> {
    source: &'a S,
    index: &'a UserIndex,
    registry: &'a CollectionRegistry,
    concurrency: usize,
    timeout: Duration,
}

impl<'a, S: AssetSource> NftIngest<'a, S> {
    /// Creates an ingestion run. A `concurrency` of zero is treated as one.
    #[must_use]
    pub fn new(
        source: &'a S,
        index: &'a UserIndex,
        registry: &'a CollectionRegistry,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            index,
            registry,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Processes every row. Per-row failures end up in
    /// [`IngestedNfts::errors`]; this never fails as a whole.
    pub async fn run(&self, mut rows: Vec<LegacyNft>) -> IngestedNfts {
        rows.sort_by_key(|row| row.position);
        let total = rows.len();
        tracing::info!(total, concurrency = self.concurrency, "enriching nfts");

        let nfts = Accumulator::new();
        let errors = Accumulator::new();
        let hidden = AtomicUsize::new(0);
        let done = AtomicUsize::new(0);
        let (nfts_ref, errors_ref, hidden_ref, done_ref) = (&nfts, &errors, &hidden, &done);

        stream::iter(rows.into_iter().enumerate())
            .for_each_concurrent(self.concurrency, |(sequence, row)| async move {
                let key = DisplayKey {
                    position: row.position,
                    sequence,
                };
                match self.process(&row, key).await {
                    Ok(nft) => {
                        if row.hidden {
                            hidden_ref.fetch_add(1, Ordering::Relaxed);
                        }
                        nfts_ref.push(nft).await;
                    }
                    Err(reason) => {
                        tracing::warn!(
                            contract = %row.contract_address,
                            token_id = %row.token_id,
                            category = reason.category(),
                            error = %reason,
                            "skipping nft"
                        );
                        errors_ref.push(ErrorRecord::new(&row, &reason)).await;
                    }
                }
                let finished = done_ref.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::info!(finished, total, "nft processed");
            })
            .await;

        IngestedNfts {
            nfts: nfts.into_inner(),
            hidden: hidden.into_inner(),
            errors: errors.into_inner(),
        }
    }

    async fn process(&self, row: &LegacyNft, key: DisplayKey) -> Result<Nft, RejectReason> {
        let owner = validate(row, self.index)?;
        let source = self.source;
        let fetch = source.fetch_asset(&row.contract_address, &row.token_id);
        let asset = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| EnrichmentError::Timeout(self.timeout))??;

        let nft = build_nft(row, owner, asset);
        tracing::debug!(
            nft_id = %nft.id,
            opensea_id = nft.opensea_id,
            position = key.position,
            "enriched nft"
        );
        if !row.hidden && !self.registry.append(&row.user_id, key, nft.id).await {
            return Err(RejectReason::UnknownOwner(row.user_id.clone()));
        }
        Ok(nft)
    }
}

/// Checks the required columns and resolves the owner.
///
/// # Errors
///
/// Returns [`RejectReason::MissingField`] for an empty `user_id`,
/// `contract_address` or `token_id`, and [`RejectReason::UnknownOwner`]
/// when the owner was not migrated.
pub fn validate<'i>(row: &LegacyNft, index: &'i UserIndex) -> Result<&'i Owner, RejectReason> {
    if row.user_id.is_empty() {
        return Err(RejectReason::MissingField("user_id"));
    }
    if row.contract_address.is_empty() {
        return Err(RejectReason::MissingField("contract_address"));
    }
    if row.token_id.is_empty() {
        return Err(RejectReason::MissingField("token_id"));
    }
    index
        .get(&row.user_id)
        .ok_or_else(|| RejectReason::UnknownOwner(row.user_id.clone()))
}

/// Legacy value unless empty, then the fetched one.
fn prefer(legacy: &str, fetched: Option<String>) -> String {
    if legacy.is_empty() {
        fetched.unwrap_or_default()
    } else {
        legacy.to_string()
    }
}

/// Merges a legacy row with its marketplace metadata into an NFT document.
#[must_use]
pub fn build_nft(row: &LegacyNft, owner: &Owner, asset: AssetMetadata) -> Nft {
    Nft {
        id: DocId::new(),
        version: 0,
        created_at: owner.created_at,
        deleted: false,
        name: prefer(&row.name, asset.name),
        description: prefer(&row.description, asset.description),
        collectors_note: String::new(),
        external_url: prefer(&row.external_url, asset.external_link),
        token_metadata_url: asset.token_metadata_url.unwrap_or_default(),
        creator_address: prefer(&row.creator_address, asset.creator_address),
        creator_name: prefer(&row.creator_name, asset.creator_username),
        owner_address: owner.address.clone(),
        owner_user_id: owner.user_id,
        contract: Contract {
            contract_address: row.contract_address.clone(),
        },
        token_collection_name: asset.collection_name.unwrap_or_default(),
        opensea_id: asset.id,
        opensea_token_id: prefer(&row.token_id, asset.token_id),
        image_url: asset.image_url.unwrap_or_default(),
        image_thumbnail_url: prefer(&row.image_thumbnail_url, asset.image_thumbnail_url),
        image_preview_url: prefer(&row.image_preview_url, asset.image_preview_url),
        image_original_url: asset.image_original_url.unwrap_or_default(),
        animation_url: asset.animation_url.unwrap_or_default(),
        animation_original_url: asset.animation_original_url.unwrap_or_default(),
        acquisition_date: String::new(),
    }
}
