use std::sync::Arc;

use futures_util::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::application::ports::bookmark_repository::BookmarkRepository;
use crate::application::ports::change_feed::{ChangeFeedPublisher, ChangeNotification};
use crate::application::ports::identity::IdentityProvider;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    bookmark_repo: Arc<dyn BookmarkRepository>,
    identity: Arc<dyn IdentityProvider>,
    change_publisher: Arc<dyn ChangeFeedPublisher>,
    changes: broadcast::Sender<ChangeNotification>,
}

impl AppServices {
    pub fn new(
        bookmark_repo: Arc<dyn BookmarkRepository>,
        identity: Arc<dyn IdentityProvider>,
        change_publisher: Arc<dyn ChangeFeedPublisher>,
        changes: broadcast::Sender<ChangeNotification>,
    ) -> Self {
        Self {
            bookmark_repo,
            identity,
            change_publisher,
            changes,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn bookmark_repo(&self) -> Arc<dyn BookmarkRepository> {
        self.services.bookmark_repo.clone()
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        self.services.identity.clone()
    }

    pub fn change_publisher(&self) -> Arc<dyn ChangeFeedPublisher> {
        self.services.change_publisher.clone()
    }

    /// One fresh subscription to the change feed per call; the subscription
    /// ends when the returned stream is dropped. A lagged receiver has lost
    /// notifications it can never replay, so the lag surfaces as the
    /// unclassifiable kind and the consumer resyncs.
    pub fn subscribe_changes(&self) -> BoxStream<'static, ChangeNotification> {
        BroadcastStream::new(self.services.changes.subscribe())
            .map(|evt| match evt {
                Ok(note) => note,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "change_feed_lagged");
                    ChangeNotification::Other
                }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::test_support::{MemStore, RecordingFeed, StubIdentity, test_config};

    fn ctx_with_capacity(
        capacity: usize,
    ) -> (AppContext, broadcast::Sender<ChangeNotification>) {
        let (tx, _) = broadcast::channel(capacity);
        let services = AppServices::new(
            Arc::new(MemStore::default()),
            Arc::new(StubIdentity {
                session: None,
                user: None,
            }),
            Arc::new(RecordingFeed::default()),
            tx.clone(),
        );
        (AppContext::new(test_config(), services), tx)
    }

    fn delete_note() -> ChangeNotification {
        ChangeNotification::Delete {
            id: Uuid::new_v4(),
            owner_id: "alice".into(),
        }
    }

    #[tokio::test]
    async fn subscription_delivers_published_notifications() {
        let (ctx, tx) = ctx_with_capacity(8);
        let mut changes = ctx.subscribe_changes();

        tx.send(delete_note()).unwrap();

        assert!(matches!(
            changes.next().await,
            Some(ChangeNotification::Delete { .. })
        ));
    }

    #[tokio::test]
    async fn lagged_subscription_yields_a_resync_marker() {
        let (ctx, tx) = ctx_with_capacity(1);
        let mut changes = ctx.subscribe_changes();

        // Overflow the single-slot channel so the first notification is lost.
        tx.send(delete_note()).unwrap();
        tx.send(delete_note()).unwrap();

        assert!(matches!(
            changes.next().await,
            Some(ChangeNotification::Other)
        ));
        assert!(matches!(
            changes.next().await,
            Some(ChangeNotification::Delete { .. })
        ));
    }
}
