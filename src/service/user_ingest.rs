//! Stage 1: legacy users → users, nonces, default collections, galleries.

use chrono::{DateTime, Utc};

use crate::domain::{
    Collection, CollectionRegistry, Gallery, LegacyUser, Nonce, User, UserIndex, UserIndexBuilder,
};
use crate::error::MigrationError;

/// Everything user ingestion produces.
#[derive(Debug)]
pub struct IngestedUsers {
    /// One per legacy user.
    pub users: Vec<User>,
    /// One per user.
    pub nonces: Vec<Nonce>,
    /// One per user, each holding exactly that user's default collection.
    pub galleries: Vec<Gallery>,
    /// Legacy id → owner, frozen before NFT ingestion starts.
    pub index: UserIndex,
    /// Legacy id → default collection, filled during NFT ingestion.
    pub collections: CollectionRegistry,
}

/// Creates the account documents for every legacy user.
///
/// Runs single-threaded; nothing else touches the outputs until it returns.
///
/// # Errors
///
/// Returns [`MigrationError::MalformedUserRow`] if two rows share a legacy
/// id. User rows have no partial-failure path.
pub async fn ingest_users(
    legacy_users: &[LegacyUser],
    migrated_at: DateTime<Utc>,
) -> Result<IngestedUsers, MigrationError> {
    let mut users = Vec::with_capacity(legacy_users.len());
    let mut nonces = Vec::with_capacity(legacy_users.len());
    let mut galleries = Vec::with_capacity(legacy_users.len());
    let mut index = UserIndexBuilder::default();
    let collections = CollectionRegistry::new();

    for (row, legacy) in legacy_users.iter().enumerate() {
        let user = User::from_legacy(legacy, migrated_at);
        let nonce = Nonce::for_user(&user);
        let collection = Collection::default_for(&user);
        let gallery = Gallery::for_user(&user, &collection);

        if !index.insert(&legacy.old_id, &user)
            || !collections.insert(&legacy.old_id, collection).await
        {
            return Err(MigrationError::MalformedUserRow {
                line: u64::try_from(row).unwrap_or(u64::MAX).saturating_add(2),
                reason: format!("duplicate legacy user id {}", legacy.old_id),
            });
        }

        tracing::info!(
            old_id = %legacy.old_id,
            user_id = %user.id,
            username = %user.username,
            "migrated user"
        );
        users.push(user);
        nonces.push(nonce);
        galleries.push(gallery);
    }

    Ok(IngestedUsers {
        users,
        nonces,
        galleries,
        index: index.build(),
        collections,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::legacy::parse_legacy_timestamp;

    fn legacy(old_id: &str, username: &str, wallet: &str) -> LegacyUser {
        let Ok(created_at) = parse_legacy_timestamp("2021-06-01T00:00:00.000Z") else {
            panic!("valid timestamp");
        };
        LegacyUser {
            old_id: old_id.to_string(),
            username: username.to_string(),
            wallet_address: wallet.to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn one_of_each_document_per_user() {
        let rows = vec![legacy("1", "Alice", "0xAAA"), legacy("2", "bob", "0xBBB")];
        let Ok(out) = ingest_users(&rows, Utc::now()).await else {
            panic!("ingest failed");
        };

        assert_eq!(out.users.len(), 2);
        assert_eq!(out.nonces.len(), 2);
        assert_eq!(out.galleries.len(), 2);
        assert_eq!(out.collections.len().await, 2);
        assert_eq!(out.index.len(), 2);

        for (old_id, user) in ["1", "2"].into_iter().zip(&out.users) {
            let Some(collection) = out.collections.get(old_id).await else {
                panic!("collection missing for {old_id}");
            };
            let gallery = out.galleries.iter().find(|g| g.owner_user_id == user.id);
            let expected = Some(vec![collection.id]);
            assert_eq!(gallery.map(|g| g.collections.clone()), expected);
            assert_eq!(collection.owner_user_id, user.id);
            assert!(collection.nfts.is_empty());
            assert!(out.nonces.iter().any(|n| n.user_id == user.id));
            assert_eq!(out.index.get(old_id).map(|o| o.user_id), Some(user.id));
        }
    }

    #[tokio::test]
    async fn lookup_fields_are_lowercased() {
        let Ok(out) = ingest_users(&[legacy("1", "Alice", "0xAbC")], Utc::now()).await else {
            panic!("ingest failed");
        };
        let Some(user) = out.users.first() else {
            panic!("no user");
        };
        assert_eq!(user.username, "Alice");
        assert_eq!(user.username_idempotent, "alice");
        assert_eq!(user.addresses, vec!["0xabc".to_string()]);
        let nonce_address = out.nonces.first().map(|n| n.address.as_str());
        assert_eq!(nonce_address, Some("0xabc"));
    }

    #[tokio::test]
    async fn duplicate_legacy_id_is_fatal() {
        let rows = vec![legacy("1", "alice", "0xAAA"), legacy("1", "bob", "0xBBB")];
        let result = ingest_users(&rows, Utc::now()).await;
        let Err(MigrationError::MalformedUserRow { line, reason }) = result else {
            panic!("expected malformed row");
        };
        assert_eq!(line, 3);
        assert!(reason.contains("duplicate"));
    }
}
