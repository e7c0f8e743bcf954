//! The full migration: ingest users, enrich NFTs, aggregate collections,
//! then persist.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::nft_ingest::NftIngest;
use super::user_ingest::ingest_users;
use crate::config::MigrationConfig;
use crate::domain::{
    Collection, CollectionRegistry, ErrorRecord, Gallery, LegacyUser, Nft, Nonce, User,
};
use crate::enrichment::AssetSource;
use crate::error::MigrationError;
use crate::persistence::{CollectionName, Document, DocumentStore, StoredDocument, write_error_log};
use crate::source::NftExport;

/// Counts logged at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Users created.
    pub users: usize,
    /// Nonces created.
    pub nonces: usize,
    /// Galleries created.
    pub galleries: usize,
    /// Collections created.
    pub collections: usize,
    /// NFTs created, hidden ones included.
    pub nfts: usize,
    /// NFTs kept out of their owner's collection.
    pub hidden_nfts: usize,
    /// Rows written to the error log.
    pub rejected: usize,
}

/// In-memory result of stages 1 to 3, ready to persist.
#[derive(Debug)]
pub struct MigrationOutput {
    /// Migrated users.
    pub users: Vec<User>,
    /// One nonce per user.
    pub nonces: Vec<Nonce>,
    /// One gallery per user.
    pub galleries: Vec<Gallery>,
    /// One default collection per user, NFTs in display order.
    pub collections: Vec<Collection>,
    /// Enriched NFTs.
    pub nfts: Vec<Nft>,
    /// Rejected rows.
    pub errors: Vec<ErrorRecord>,
    /// Summary counts.
    pub report: MigrationReport,
}

/// Documents written per collection by [`persist`].
pub type PersistSummary = BTreeMap<CollectionName, u64>;

/// Runs stages 1 to 3 against an [`AssetSource`].
#[derive(Debug)]
pub struct MigrationPipeline<S> {
    source: S,
    concurrency: usize,
    timeout: Duration,
}

impl<S: AssetSource> MigrationPipeline<S> {
    /// Creates a pipeline with the enrichment limits from `config`.
    #[must_use]
    pub fn new(source: S, config: &MigrationConfig) -> Self {
        Self::with_limits(
            source,
            config.enrichment_concurrency,
            config.enrichment_timeout(),
        )
    }

    /// Creates a pipeline with explicit enrichment limits.
    #[must_use]
    pub const fn with_limits(source: S, concurrency: usize, timeout: Duration) -> Self {
        Self {
            source,
            concurrency,
            timeout,
        }
    }

    /// The asset source in use.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Transforms the legacy exports into output documents.
    ///
    /// Rows the reader already rejected are carried into
    /// [`MigrationOutput::errors`] ahead of the ingestion rejections.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError`] only for user-level problems; NFT row
    /// failures are collected instead.
    pub async fn run(
        &self,
        users: &[LegacyUser],
        nfts: NftExport,
    ) -> Result<MigrationOutput, MigrationError> {
        let migrated_at = Utc::now();

        tracing::info!(users = users.len(), "stage 1: ingesting users");
        let ingested = ingest_users(users, migrated_at).await?;

        tracing::info!(
            rows = nfts.rows.len(),
            rejected_on_read = nfts.rejected.len(),
            "stage 2: ingesting nfts"
        );
        let enriched = NftIngest::new(
            &self.source,
            &ingested.index,
            &ingested.collections,
            self.concurrency,
            self.timeout,
        )
        .run(nfts.rows)
        .await;

        tracing::info!("stage 3: aggregating collections");
        let collections = aggregate(ingested.collections);

        let mut errors = nfts.rejected;
        errors.extend(enriched.errors);

        let report = MigrationReport {
            users: ingested.users.len(),
            nonces: ingested.nonces.len(),
            galleries: ingested.galleries.len(),
            collections: collections.len(),
            nfts: enriched.nfts.len(),
            hidden_nfts: enriched.hidden,
            rejected: errors.len(),
        };

        Ok(MigrationOutput {
            users: ingested.users,
            nonces: ingested.nonces,
            galleries: ingested.galleries,
            collections,
            nfts: enriched.nfts,
            errors,
            report,
        })
    }
}

/// Flattens the registry into collection documents with ordered `nfts`.
#[must_use]
pub fn aggregate(registry: CollectionRegistry) -> Vec<Collection> {
    registry.into_collections()
}

/// Writes the error log, then inserts every collection in order.
///
/// Collections go in as users, galleries, collections, nfts, nonces, each
/// in chunks of `batch_size`. Nothing is rolled back: when a collection
/// fails, the ones before it stay written.
///
/// # Errors
///
/// Returns [`MigrationError::ErrorLog`] if the side file cannot be written
/// and the store's error for the first rejected batch.
pub async fn persist<D: DocumentStore>(
    store: &D,
    output: &MigrationOutput,
    batch_size: usize,
    error_log: &Path,
) -> Result<PersistSummary, MigrationError> {
    write_error_log(error_log, &output.errors).await?;

    let mut summary = PersistSummary::new();
    for collection in CollectionName::ALL {
        let written = match collection {
            CollectionName::Users => insert_all(store, &output.users, batch_size).await?,
            CollectionName::Galleries => insert_all(store, &output.galleries, batch_size).await?,
            CollectionName::Collections => {
                insert_all(store, &output.collections, batch_size).await?
            }
            CollectionName::Nfts => insert_all(store, &output.nfts, batch_size).await?,
            CollectionName::Nonces => insert_all(store, &output.nonces, batch_size).await?,
        };
        tracing::info!(%collection, written, "collection persisted");
        summary.insert(collection, written);
    }
    Ok(summary)
}

async fn insert_all<D: DocumentStore, T: Document>(
    store: &D,
    records: &[T],
    batch_size: usize,
) -> Result<u64, MigrationError> {
    let mut written = 0;
    for chunk in records.chunks(batch_size.max(1)) {
        let docs = chunk
            .iter()
            .map(StoredDocument::encode)
            .collect::<Result<Vec<_>, _>>()?;
        written += store.insert_many(T::COLLECTION, docs).await?;
    }
    Ok(written)
}
