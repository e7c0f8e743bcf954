//! Legacy users export (`glry-users.csv`).

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{input_error, line_of, open, reader_builder, require_columns};
use crate::domain::LegacyUser;
use crate::domain::legacy::parse_legacy_timestamp;
use crate::error::{MigrationError, RejectReason};

/// Columns the users export must carry. Others (`profile_slug`, `email`)
/// are ignored.
pub const USER_COLUMNS: [&str; 4] = ["id", "username", "wallet_address", "created_at"];

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    username: String,
    wallet_address: String,
    created_at: String,
}

impl UserRecord {
    fn into_legacy(self) -> Result<LegacyUser, String> {
        let old_id = self.id.trim();
        if old_id.is_empty() {
            return Err(RejectReason::MissingField("id").to_string());
        }
        let wallet_address = self.wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(RejectReason::MissingField("wallet_address").to_string());
        }
        if self.created_at.trim().is_empty() {
            return Err(RejectReason::MissingField("created_at").to_string());
        }
        let created_at = parse_legacy_timestamp(&self.created_at)
            .map_err(|e| format!("invalid created_at {:?}: {e}", self.created_at))?;

        Ok(LegacyUser {
            old_id: old_id.to_string(),
            username: self.username.trim().to_string(),
            wallet_address: wallet_address.to_string(),
            created_at,
        })
    }
}

/// Reads every user from the export at `path`.
///
/// # Errors
///
/// Returns [`MigrationError::Input`] if the file cannot be read,
/// [`MigrationError::MissingColumn`] if the header lacks a required column,
/// and [`MigrationError::MalformedUserRow`] for the first bad row.
pub fn read_users(path: &Path) -> Result<Vec<LegacyUser>, MigrationError> {
    parse_users(open(path)?, path)
}

/// Reads every user from `input`. `origin` only labels errors.
///
/// # Errors
///
/// Same as [`read_users`].
pub fn parse_users<R: Read>(input: R, origin: &Path) -> Result<Vec<LegacyUser>, MigrationError> {
    let mut reader = reader_builder().from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| input_error(origin, e))?
        .clone();
    require_columns(&headers, &USER_COLUMNS, origin)?;

    let mut users = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(input_error(origin, e)),
            Err(e) => {
                return Err(MigrationError::MalformedUserRow {
                    line: e.position().map_or(0, csv::Position::line),
                    reason: e.to_string(),
                });
            }
        };
        let line = line_of(record.position(), index);

        if record.len() != headers.len() {
            let reason = RejectReason::SchemaMismatch {
                expected: headers.len(),
                found: record.len(),
            };
            return Err(MigrationError::MalformedUserRow {
                line,
                reason: reason.to_string(),
            });
        }

        let user = record
            .deserialize::<UserRecord>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(UserRecord::into_legacy)
            .map_err(|reason| MigrationError::MalformedUserRow { line, reason })?;

        tracing::debug!(line, old_id = %user.old_id, username = %user.username, "read user");
        users.push(user);
    }

    tracing::info!(path = %origin.display(), count = users.len(), "read users export");
    Ok(users)
}
