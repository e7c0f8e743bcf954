//! Domain layer: legacy rows, output documents, and shared run state.
//!
//! This module contains the typed legacy export rows, the documents the
//! migration produces, the rejected-row record, and the structures shared
//! between enrichment workers (the read-only user index, the collection
//! registry, and append-only accumulators).

pub mod accumulator;
pub mod collection_registry;
pub mod doc_id;
pub mod documents;
pub mod error_record;
pub mod legacy;
pub mod user_index;

pub use accumulator::Accumulator;
pub use collection_registry::{CollectionRegistry, DisplayKey};
pub use doc_id::DocId;
pub use documents::{Collection, Contract, Gallery, Nft, Nonce, User};
pub use error_record::ErrorRecord;
pub use legacy::{LegacyNft, LegacyUser};
pub use user_index::{Owner, UserIndex, UserIndexBuilder};
