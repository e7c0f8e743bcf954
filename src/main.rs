//! gallery-migrate entry point.
//!
//! Reads the legacy exports, runs the migration and writes the result to
//! PostgreSQL, or to memory with `--dry-run`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gallery_migrate::config::MigrationConfig;
use gallery_migrate::enrichment::OpenSeaClient;
use gallery_migrate::persistence::{
    CollectionName, DocumentStore, MemoryDocumentStore, PostgresDocumentStore,
};
use gallery_migrate::service::{MigrationPipeline, persist};
use gallery_migrate::source::{read_nfts, read_users};

/// Migrate legacy Gallery users and NFTs into the document store.
#[derive(Debug, Parser)]
#[command(name = "gallery-migrate", version, about)]
struct Cli {
    /// Legacy users export.
    #[arg(long, default_value = "glry-users.csv")]
    users: PathBuf,

    /// Legacy NFTs export.
    #[arg(long, default_value = "glry-nfts.csv")]
    nfts: PathBuf,

    /// Where rejected rows are written.
    #[arg(long, default_value = "migration-errors.json")]
    error_log: PathBuf,

    /// Run every stage but keep the documents in memory.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = MigrationConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        users = %cli.users.display(),
        nfts = %cli.nfts.display(),
        dry_run = cli.dry_run,
        "starting gallery-migrate"
    );

    // Read exports
    let users = read_users(&cli.users)?;
    let nfts = read_nfts(&cli.nfts)?;

    // Open the document store before any enrichment request
    let database = if cli.dry_run {
        None
    } else {
        let store = PostgresDocumentStore::connect(&config)
            .await
            .context("connecting to the document store")?;
        store.ensure_collections().await?;
        Some(store)
    };

    // Stages 1-3
    let client = OpenSeaClient::new(&config)?;
    let pipeline = MigrationPipeline::new(client, &config);
    let output = pipeline.run(&users, nfts).await?;

    // Stage 4
    if let Some(store) = database {
        persist(&store, &output, config.insert_batch_size, &cli.error_log).await?;
    } else {
        let store = MemoryDocumentStore::new();
        persist(&store, &output, config.insert_batch_size, &cli.error_log).await?;
        for collection in CollectionName::ALL {
            let count = store.count(collection).await?;
            tracing::info!(%collection, count, "dry run: documents held in memory");
        }
    }

    let report = &output.report;
    tracing::info!(
        users = report.users,
        nonces = report.nonces,
        galleries = report.galleries,
        collections = report.collections,
        nfts = report.nfts,
        hidden_nfts = report.hidden_nfts,
        rejected = report.rejected,
        error_log = %cli.error_log.display(),
        "migration complete"
    );

    Ok(())
}
