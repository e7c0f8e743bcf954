//! # gallery-migrate
//!
//! One-shot migration of the legacy Gallery exports into the document store.
//!
//! Users and NFTs are read from two CSV exports. Every user gets an account,
//! a login nonce, an empty default collection and a gallery holding it.
//! Every NFT is enriched from the OpenSea asset API with bounded
//! concurrency and appended to its owner's collection in display order.
//! Rows that cannot be migrated are written to a JSON side file instead of
//! failing the run.
//!
//! ## Architecture
//!
//! ```text
//! glry-users.csv ──┐
//! glry-nfts.csv  ──┤  CSV readers (source/)
//!                  │
//!                  ├── ingest_users (service/)  ─► UserIndex, CollectionRegistry (domain/)
//!                  ├── NftIngest (service/)     ─► OpenSeaClient (enrichment/)
//!                  ├── aggregate (service/)
//!                  │
//!                  └── persist ─► error log + DocumentStore (persistence/)
//!                                   ├── PostgreSQL JSONB tables
//!                                   └── in-memory (dry run)
//! ```

pub mod config;
pub mod domain;
pub mod enrichment;
pub mod error;
pub mod persistence;
pub mod service;
pub mod source;
