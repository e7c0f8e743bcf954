//! PostgreSQL implementation of the document store.
//!
//! Each collection is a table `(id TEXT PRIMARY KEY, doc JSONB NOT NULL,
//! inserted_at TIMESTAMPTZ)`. Tables are created on demand; table names come
//! only from [`CollectionName`], never from input data.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CollectionName, DocumentStore, StoredDocument};
use crate::config::MigrationConfig;
use crate::error::MigrationError;

/// PostgreSQL-backed document store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using `DATABASE_URL` and the pool settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Config`] if no connection string is set and
    /// [`MigrationError::Persistence`] if the database is unreachable.
    pub async fn connect(config: &MigrationConfig) -> Result<Self, MigrationError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(missing_database_url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| MigrationError::Persistence(e.to_string()))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to document database"
        );
        Ok(Self::new(pool))
    }

    /// Creates any missing collection table.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError::Persistence`] on database failure.
    pub async fn ensure_collections(&self) -> Result<(), MigrationError> {
        for collection in CollectionName::ALL {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {collection} (\
                 id TEXT PRIMARY KEY, \
                 doc JSONB NOT NULL, \
                 inserted_at TIMESTAMPTZ NOT NULL DEFAULT now())"
            );
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| store_error(collection, &e))?;
        }
        Ok(())
    }
}

fn missing_database_url() -> MigrationError {
    MigrationError::Config("DATABASE_URL must be set".to_string())
}

fn store_error(collection: CollectionName, err: &sqlx::Error) -> MigrationError {
    MigrationError::Persistence(format!("{collection}: {err}"))
}

impl DocumentStore for PostgresDocumentStore {
    async fn insert_many(
        &self,
        collection: CollectionName,
        docs: Vec<StoredDocument>,
    ) -> Result<u64, MigrationError> {
        if docs.is_empty() {
            return Ok(0);
        }

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("INSERT INTO {collection} (id, doc) "));
        builder.push_values(docs, |mut row, stored| {
            row.push_bind(stored.id).push_bind(stored.doc);
        });

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(collection, &e))?;

        Ok(result.rows_affected())
    }

    async fn count(&self, collection: CollectionName) -> Result<u64, MigrationError> {
        let sql = format!("SELECT COUNT(*) FROM {collection}");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(collection, &e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
