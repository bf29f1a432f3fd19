use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::bookmarks::bookmark::Bookmark;

/// One row-level mutation reported by the store. Deliveries are unordered
/// with respect to local edits and may duplicate; consumers reconcile by id.
/// `Other` stands in for kinds this build does not understand; consumers
/// resync rather than guess.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeNotification {
    Insert { row: Bookmark },
    Update { row: Bookmark },
    Delete { id: Uuid, owner_id: String },
    Other,
}

impl ChangeNotification {
    /// Owner the notification is scoped to; `None` means every subscriber
    /// should see it.
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::Insert { row } | Self::Update { row } => Some(&row.owner_id),
            Self::Delete { owner_id, .. } => Some(owner_id),
            Self::Other => None,
        }
    }
}

#[async_trait]
pub trait ChangeFeedPublisher: Send + Sync {
    async fn publish(&self, note: &ChangeNotification) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn notifications_are_tagged_by_kind_on_the_wire() {
        let row = Bookmark {
            id: Uuid::new_v4(),
            url: "https://example.com".into(),
            title: "example".into(),
            owner_id: "alice".into(),
            created_at: Utc::now(),
        };
        let wire = serde_json::to_value(ChangeNotification::Insert { row: row.clone() }).unwrap();
        assert_eq!(wire["kind"], "insert");
        assert_eq!(wire["row"]["owner_id"], "alice");

        let wire = serde_json::to_value(ChangeNotification::Delete {
            id: row.id,
            owner_id: row.owner_id.clone(),
        })
        .unwrap();
        assert_eq!(wire["kind"], "delete");

        let back: ChangeNotification =
            serde_json::from_value(serde_json::json!({"kind": "other"})).unwrap();
        assert!(back.owner_id().is_none());
    }
}
