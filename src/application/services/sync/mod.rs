use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::bookmark_repository::{BookmarkRepository, StoreError};
use crate::application::ports::change_feed::{ChangeFeedPublisher, ChangeNotification};
use crate::domain::bookmarks::bookmark::{self, Bookmark};

pub const MISSING_SCHEMA_HINT: &str =
    "Bookmark storage has not been initialized. Run the database migrations and reload.";
pub const ACCESS_DENIED_HINT: &str =
    "You do not have access to these bookmarks. Check the store's row policy for your account.";

/// Maps a structured store failure to its fixed user-facing hint.
pub fn remediation(err: &StoreError) -> String {
    match err {
        StoreError::SchemaMissing => MISSING_SCHEMA_HINT.to_string(),
        StoreError::AccessDenied => ACCESS_DENIED_HINT.to_string(),
        StoreError::Unavailable(e) => format!("Failed to load bookmarks: {e}"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error("URL is required")]
    EmptyUrl,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One user's live bookmark list: an initial owner-scoped read kept current
/// by reconciling pushed change notifications with locally issued edits.
/// Reconciliation is keyed by id so insert and delete stay idempotent no
/// matter how deliveries interleave with optimistic local state.
pub struct BookmarkFeed {
    repo: Arc<dyn BookmarkRepository>,
    changes: Arc<dyn ChangeFeedPublisher>,
    owner_id: String,
    items: Vec<Bookmark>,
    loading: bool,
    error: Option<String>,
}

impl BookmarkFeed {
    pub fn new(
        repo: Arc<dyn BookmarkRepository>,
        changes: Arc<dyn ChangeFeedPublisher>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            changes,
            owner_id: owner_id.into(),
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn items(&self) -> &[Bookmark] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Full resync: replaces local state with the store's current view.
    pub async fn load(&mut self) {
        self.loading = true;
        match self.repo.list_for_owner(&self.owner_id).await {
            Ok(rows) => {
                self.items = rows;
                self.error = None;
            }
            Err(err) => {
                warn!(owner = %self.owner_id, error = %err, "bookmark_load_failed");
                self.error = Some(remediation(&err));
            }
        }
        self.loading = false;
    }

    /// Validates and normalizes the URL before any I/O, inserts, publishes
    /// the insert notification, and prepends the created row locally. The
    /// prepend is deduplicated against a notification for the same row that
    /// may already have been reconciled in.
    pub async fn add(&mut self, url: &str, title: &str) -> Result<Bookmark, AddError> {
        let url = bookmark::normalize_url(url).ok_or(AddError::EmptyUrl)?;
        let title = bookmark::title_or_url(title, &url);
        let row = self.repo.insert(&self.owner_id, &url, &title).await?;
        self.publish(ChangeNotification::Insert { row: row.clone() })
            .await;
        self.upsert_front(row.clone());
        Ok(row)
    }

    /// Optimistically drops the row, then issues the owner-scoped delete.
    /// A failed delete (or one that touched nothing) forces a resync so the
    /// local list converges back to the store's state.
    pub async fn remove(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.items.retain(|b| b.id != id);
        match self.repo.delete_owned(id, &self.owner_id).await {
            Ok(true) => {
                self.publish(ChangeNotification::Delete {
                    id,
                    owner_id: self.owner_id.clone(),
                })
                .await;
                Ok(true)
            }
            Ok(false) => {
                self.load().await;
                Ok(false)
            }
            Err(err) => {
                self.load().await;
                Err(err)
            }
        }
    }

    /// Reconciles one pushed notification: inserts are deduplicated by id,
    /// deletes drop the matching row, and anything the incremental path
    /// cannot express (updates, unknown kinds) falls back to a full resync.
    pub async fn apply(&mut self, note: ChangeNotification) {
        match note {
            ChangeNotification::Insert { row } => self.upsert_front(row),
            ChangeNotification::Delete { id, .. } => self.items.retain(|b| b.id != id),
            other => {
                debug!(owner = %self.owner_id, kind = ?other, "unreconcilable_change_resync");
                self.load().await;
            }
        }
    }

    fn upsert_front(&mut self, row: Bookmark) {
        if self.items.iter().any(|b| b.id == row.id) {
            return;
        }
        self.items.insert(0, row);
    }

    async fn publish(&self, note: ChangeNotification) {
        // No subscribers (or a detached feed transport) never fails the edit.
        if let Err(err) = self.changes.publish(&note).await {
            debug!(error = ?err, "change_publish_failed");
        }
    }
}
