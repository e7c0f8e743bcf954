//! Persistence layer: document collections and the error side log.
//!
//! Provides the [`DocumentStore`] trait for batch inserts into the five
//! output collections. [`PostgresDocumentStore`] keeps each collection as a
//! JSONB table behind `sqlx::PgPool`; [`MemoryDocumentStore`] backs dry
//! runs and tests.

pub mod error_log;
pub mod memory;
pub mod models;
pub mod postgres;

pub use error_log::write_error_log;
pub use memory::MemoryDocumentStore;
pub use models::{CollectionName, Document, StoredDocument};
pub use postgres::PostgresDocumentStore;

use std::future::Future;

use crate::error::MigrationError;

/// Append-only, schema-less document collections.
///
/// There is no foreign-key enforcement and no transaction spanning more
/// than one call.
pub trait DocumentStore: Send + Sync {
    /// Inserts `docs` into `collection`, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Persistence`] if the batch is rejected.
    fn insert_many(
        &self,
        collection: CollectionName,
        docs: Vec<StoredDocument>,
    ) -> impl Future<Output = Result<u64, MigrationError>> + Send;

    /// Number of documents currently in `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Persistence`] on storage failure.
    fn count(
        &self,
        collection: CollectionName,
    ) -> impl Future<Output = Result<u64, MigrationError>> + Send;
}
