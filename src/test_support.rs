use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::application::ports::bookmark_repository::{BookmarkRepository, StoreError};
use crate::application::ports::change_feed::{ChangeFeedPublisher, ChangeNotification};
use crate::application::ports::identity::{AuthUser, IdentityProvider, OauthSession};
use crate::bootstrap::config::Config;
use crate::domain::bookmarks::bookmark::Bookmark;

/// Baseline configuration for handler tests; override fields as needed.
pub fn test_config() -> Config {
    Config {
        api_port: 0,
        public_base_url: None,
        database_url: String::new(),
        database_max_connections: 10,
        oauth_client_id: "client".into(),
        oauth_client_secret: "secret".into(),
        oauth_authorize_url: "https://id.example.com/authorize".into(),
        oauth_token_url: "https://id.example.com/token".into(),
        oauth_userinfo_url: "https://id.example.com/userinfo".into(),
        oauth_revoke_url: None,
        oauth_scopes: "openid".into(),
        session_max_age_secs: 3600,
        is_production: false,
    }
}

#[derive(Clone, Copy)]
pub enum FailKind {
    SchemaMissing,
    AccessDenied,
    Unavailable,
}

impl FailKind {
    fn to_error(self) -> StoreError {
        match self {
            FailKind::SchemaMissing => StoreError::SchemaMissing,
            FailKind::AccessDenied => StoreError::AccessDenied,
            FailKind::Unavailable => StoreError::Unavailable(anyhow::anyhow!("connection reset")),
        }
    }
}

/// In-memory stand-in for the Postgres store. `seed` backdates rows by
/// insertion order so newest-first ordering is deterministic in tests.
#[derive(Default)]
pub struct MemStore {
    pub rows: Mutex<Vec<Bookmark>>,
    pub fail_list: Mutex<Option<FailKind>>,
    pub fail_delete: Mutex<bool>,
    seq: Mutex<i64>,
}

impl MemStore {
    pub fn seed(&self, owner: &str, url: &str, title: &str) -> Bookmark {
        let mut seq = self.seq.lock().unwrap();
        *seq += 1;
        let row = Bookmark {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: title.to_string(),
            owner_id: owner.to_string(),
            created_at: Utc::now() + Duration::milliseconds(*seq),
        };
        self.rows.lock().unwrap().push(row.clone());
        row
    }
}

#[async_trait]
impl BookmarkRepository for MemStore {
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        if let Some(kind) = *self.fail_list.lock().unwrap() {
            return Err(kind.to_error());
        }
        let mut rows: Vec<Bookmark> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(
        &self,
        owner_id: &str,
        url: &str,
        title: &str,
    ) -> Result<Bookmark, StoreError> {
        Ok(self.seed(owner_id, url, title))
    }

    async fn delete_owned(&self, id: Uuid, owner_id: &str) -> Result<bool, StoreError> {
        if *self.fail_delete.lock().unwrap() {
            return Err(StoreError::Unavailable(anyhow::anyhow!("connection reset")));
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| !(b.id == id && b.owner_id == owner_id));
        Ok(rows.len() != before)
    }
}

/// Captures published notifications for assertions.
#[derive(Default)]
pub struct RecordingFeed {
    pub notes: Mutex<Vec<ChangeNotification>>,
}

#[async_trait]
impl ChangeFeedPublisher for RecordingFeed {
    async fn publish(&self, note: &ChangeNotification) -> anyhow::Result<()> {
        self.notes.lock().unwrap().push(note.clone());
        Ok(())
    }
}

/// Scripted identity provider: `session: None` fails the exchange, `user:
/// None` makes every token resolve to nobody.
pub struct StubIdentity {
    pub session: Option<OauthSession>,
    pub user: Option<AuthUser>,
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    fn authorize_url(&self, redirect_uri: &str) -> String {
        format!("https://id.example.com/authorize?redirect_uri={redirect_uri}")
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> anyhow::Result<OauthSession> {
        self.session
            .clone()
            .ok_or_else(|| anyhow::anyhow!("exchange rejected"))
    }

    async fn fetch_user(&self, _access_token: &str) -> anyhow::Result<Option<AuthUser>> {
        Ok(self.user.clone())
    }

    async fn revoke(&self, _access_token: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
