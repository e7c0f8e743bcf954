//! JSON side log of rejected rows.

use std::path::Path;

use crate::domain::ErrorRecord;
use crate::error::MigrationError;

/// Writes `records` to `path` as a pretty-printed JSON array, replacing any
/// previous file. An empty run still writes `[]` so a stale log from an
/// earlier run is never mistaken for this one.
///
/// # Errors
///
/// Returns [`MigrationError::ErrorLog`] if the file cannot be written.
pub async fn write_error_log(path: &Path, records: &[ErrorRecord]) -> Result<(), MigrationError> {
    let body = serde_json::to_vec_pretty(records)?;
    tokio::fs::write(path, body)
        .await
        .map_err(|source| MigrationError::ErrorLog {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %path.display(), records = records.len(), "wrote error log");
    Ok(())
}
