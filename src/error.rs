//! Migration error types.
//!
//! Two tiers of failure exist:
//!
//! | Type                | Scope      | Effect                                   |
//! |---------------------|------------|------------------------------------------|
//! | [`MigrationError`]  | Whole run  | Aborts the migration                     |
//! | [`RejectReason`]    | One NFT row| Row is skipped and logged to the side file |
//!
//! [`EnrichmentError`] is the marketplace-specific subset of
//! [`RejectReason`].

use std::path::PathBuf;
use std::time::Duration;

/// Fatal error that aborts the migration run.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An input file could not be opened or read.
    #[error("failed to read {}: {source}", .path.display())]
    Input {
        /// File that failed.
        path: PathBuf,
        /// Underlying CSV / IO error.
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from an export's header.
    #[error("{} has no `{column}` column", .path.display())]
    MissingColumn {
        /// File that failed.
        path: PathBuf,
        /// Missing header name.
        column: &'static str,
    },

    /// A legacy user row is malformed. User rows have no partial-failure
    /// path, so any bad row stops the run.
    #[error("malformed user row at line {line}: {reason}")]
    MalformedUserRow {
        /// 1-based line in the users export (header is line 1).
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// The HTTP client for the marketplace could not be built.
    #[error("http client error: {0}")]
    HttpClient(String),

    /// Document store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Writing the error side log failed.
    #[error("failed to write error log {}: {source}", .path.display())]
    ErrorLog {
        /// Destination of the side log.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized to a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single NFT row was excluded from the output.
///
/// Rendered with `Display` into [`crate::domain::ErrorRecord::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// A required column is empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// Row has a different number of fields than the header.
    #[error("schema mismatch: expected {expected} fields, found {found}")]
    SchemaMismatch {
        /// Number of header columns.
        expected: usize,
        /// Number of fields in the row.
        found: usize,
    },

    /// The CSV reader could not decode the row (bad quoting, invalid
    /// UTF-8).
    #[error("unreadable row: {0}")]
    Unreadable(String),

    /// A column could not be parsed into its typed value.
    #[error("invalid value {value:?} for field `{field}`")]
    InvalidField {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },

    /// The row references a legacy user that is not in the users export.
    #[error("owner {0} not found among migrated users")]
    UnknownOwner(String),

    /// Marketplace enrichment failed.
    #[error("enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),
}

/// Failure while fetching asset metadata from the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The marketplace answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The body was not valid asset JSON.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The body did not contain the asset identifier.
    #[error("response is missing the asset id")]
    MissingAssetId,
}

impl RejectReason {
    /// Short category tag used in log fields.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MissingField(_)
            | Self::SchemaMismatch { .. }
            | Self::Unreadable(_)
            | Self::InvalidField { .. } => "schema",
            Self::UnknownOwner(_) => "referential",
            Self::Enrichment(_) => "enrichment",
        }
    }
}
