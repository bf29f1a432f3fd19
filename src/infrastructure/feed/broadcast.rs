use async_trait::async_trait;

use crate::application::ports::change_feed::{ChangeFeedPublisher, ChangeNotification};

/// Fans change notifications out to every in-process subscriber (one SSE
/// connection each).
#[derive(Clone)]
pub struct BroadcastChangeFeed {
    sender: tokio::sync::broadcast::Sender<ChangeNotification>,
}

impl BroadcastChangeFeed {
    pub fn new(sender: tokio::sync::broadcast::Sender<ChangeNotification>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ChangeFeedPublisher for BroadcastChangeFeed {
    async fn publish(&self, note: &ChangeNotification) -> anyhow::Result<()> {
        match self.sender.send(note.clone()) {
            Ok(_) => Ok(()),
            // No active subscribers is harmless; don't propagate a failure to the caller.
            Err(tokio::sync::broadcast::error::SendError(_)) => Ok(()),
        }
    }
}
