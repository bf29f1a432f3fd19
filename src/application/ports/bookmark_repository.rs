use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::bookmarks::bookmark::Bookmark;

/// Failure kinds the storage adapter is required to distinguish. The sync
/// service maps each kind to a fixed user-facing hint, so adapters classify
/// driver errors here instead of leaking raw messages upward.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("bookmarks relation does not exist")]
    SchemaMissing,
    #[error("access denied by the store's row policy")]
    AccessDenied,
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Newest-first list of every bookmark owned by `owner_id`.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError>;

    /// Inserts a row for `owner_id`; id and created_at come back assigned by
    /// the store. `url` and `title` are expected to be normalized already.
    async fn insert(&self, owner_id: &str, url: &str, title: &str)
    -> Result<Bookmark, StoreError>;

    /// Scoped to (id, owner): deleting another user's id is a no-op.
    /// Returns true if a row was actually deleted.
    async fn delete_owned(&self, id: Uuid, owner_id: &str) -> Result<bool, StoreError>;
}
