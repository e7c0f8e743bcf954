//! Service layer: the migration stages.
//!
//! [`ingest_users`] builds accounts and the frozen user index,
//! [`NftIngest`] enriches NFT rows concurrently, and
//! [`MigrationPipeline`] runs both, aggregates the collections and hands
//! the result to [`persist`].

pub mod nft_ingest;
pub mod pipeline;
pub mod user_ingest;

pub use nft_ingest::{IngestedNfts, NftIngest};
pub use pipeline::{MigrationOutput, MigrationPipeline, MigrationReport, PersistSummary, persist};
pub use user_ingest::{IngestedUsers, ingest_users};
