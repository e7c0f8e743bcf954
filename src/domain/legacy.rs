//! Typed rows of the legacy (alpha) exports.
//!
//! These are what the CSV readers in [`crate::source`] produce once a row
//! has passed field-level parsing. Both are immutable once read.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Timestamp layout of `created_at` in the users export.
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One row of the legacy users export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyUser {
    /// Legacy user id. NFT rows reference users by this value.
    pub old_id: String,
    /// Display name, original casing.
    pub username: String,
    /// Wallet address as exported (casing not normalized).
    pub wallet_address: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

/// One row of the legacy NFT export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyNft {
    /// Owning legacy user id ([`LegacyUser::old_id`]).
    pub user_id: String,
    /// Token contract address.
    pub contract_address: String,
    /// Token id within the contract.
    pub token_id: String,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Project URL.
    pub external_url: String,
    /// Creator wallet address.
    pub creator_address: String,
    /// Creator marketplace username.
    pub creator_name: String,
    /// Cached thumbnail URL.
    pub image_thumbnail_url: String,
    /// Cached preview URL.
    pub image_preview_url: String,
    /// Global display position.
    pub position: i64,
    /// Hidden from the owner's public gallery.
    pub hidden: bool,
}

/// Parses a legacy `created_at` value (`2021-05-01T12:30:00.123456Z`).
///
/// # Errors
///
/// Returns the chrono parse error when the value does not match
/// [`LEGACY_TIMESTAMP_FORMAT`].
pub fn parse_legacy_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), LEGACY_TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Parses the `hidden` flag. The export writes Postgres booleans, so both
/// `t`/`f` and `true`/`false` appear. Empty means not hidden.
#[must_use]
pub fn parse_hidden_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" => Some(true),
        "" | "f" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
