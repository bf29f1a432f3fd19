use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures_util::stream::{self, Stream, StreamExt};

use crate::application::services::sync::BookmarkFeed;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::auth::{self, SessionToken};
use crate::presentation::http::pages;

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/bookmarks/updates", get(sse_updates))
        .with_state(ctx)
}

fn list_event(feed: &BookmarkFeed) -> Event {
    Event::default().event("bookmarks").data(
        pages::render_bookmark_section(feed.items(), feed.error(), feed.is_loading()),
    )
}

/// Per-user live feed. Each connection owns one subscription and one
/// `BookmarkFeed`; every relevant notification is reconciled into the feed
/// and the re-rendered list state is pushed as a `bookmarks` event. Dropping
/// the connection drops both the subscription and the feed, so nothing
/// outlives the session it belongs to.
pub async fn sse_updates(
    State(ctx): State<AppContext>,
    token: SessionToken,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let user = auth::require_user(&ctx, &token).await?;

    let mut feed = BookmarkFeed::new(ctx.bookmark_repo(), ctx.change_publisher(), user.id);
    feed.load().await;

    let ready = Event::default().event("ready").data("{}");
    let snapshot = list_event(&feed);
    let initial = stream::iter([Ok(ready), Ok(snapshot)]);

    let rx = ctx.subscribe_changes();
    let live = stream::unfold((feed, rx), |(mut feed, mut rx)| async move {
        loop {
            let note = rx.next().await?;
            // Ownerless notifications (unknown kinds) reach every subscriber;
            // everything else is scoped to this connection's user.
            if note.owner_id().is_some_and(|o| o != feed.owner_id()) {
                continue;
            }
            feed.apply(note).await;
            let event = list_event(&feed);
            return Some((Ok(event), (feed, rx)));
        }
    });

    let keepalive = KeepAlive::new()
        .interval(Duration::from_secs(25))
        .text(":");
    Ok(Sse::new(initial.chain(live)).keep_alive(keepalive))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tokio::sync::broadcast;
    use tower::util::ServiceExt;

    use super::*;
    use crate::application::ports::change_feed::ChangeNotification;
    use crate::application::ports::identity::AuthUser;
    use crate::bootstrap::app_context::AppServices;
    use crate::test_support::{MemStore, RecordingFeed, StubIdentity, test_config};

    fn test_ctx(store: Arc<MemStore>) -> (AppContext, broadcast::Sender<ChangeNotification>) {
        let identity = StubIdentity {
            session: None,
            user: Some(AuthUser {
                id: "alice".into(),
                email: None,
                display_name: None,
            }),
        };
        let (tx, _) = broadcast::channel(8);
        let services = AppServices::new(
            store,
            Arc::new(identity),
            Arc::new(RecordingFeed::default()),
            tx.clone(),
        );
        (AppContext::new(test_config(), services), tx)
    }

    async fn connect(ctx: AppContext) -> Body {
        let res = routes(ctx)
            .oneshot(
                Request::builder()
                    .uri("/bookmarks/updates")
                    .header(header::COOKIE, "access_token=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.into_body()
    }

    /// Accumulates SSE frames until `needle` shows up; the keep-alive period
    /// is far beyond the timeout, so only real events are ever read.
    async fn read_until(body: &mut Body, needle: &str) -> String {
        let mut buf = String::new();
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
                .await
                .expect("no event arrived in time")
                .expect("feed ended early")
                .expect("feed body error");
            if let Some(data) = frame.data_ref() {
                buf.push_str(std::str::from_utf8(data).unwrap());
            }
            if buf.contains(needle) {
                return buf;
            }
        }
    }

    #[tokio::test]
    async fn feed_is_scoped_to_the_connected_user() {
        let store = Arc::new(MemStore::default());
        store.seed("alice", "https://mine.example", "mine");
        let (ctx, tx) = test_ctx(store.clone());

        let mut body = connect(ctx).await;
        let snapshot = read_until(&mut body, "mine.example").await;
        assert!(snapshot.contains("event: ready"));
        assert!(snapshot.contains("event: bookmarks"));

        // A foreign insert produces no event; the user's own insert does.
        let foreign = store.seed("bob", "https://theirs.example", "theirs");
        tx.send(ChangeNotification::Insert { row: foreign }).unwrap();
        let ours = store.seed("alice", "https://added.example", "added");
        tx.send(ChangeNotification::Insert { row: ours }).unwrap();

        let update = read_until(&mut body, "added.example").await;
        assert!(!update.contains("theirs.example"));
    }

    #[tokio::test]
    async fn ownerless_notifications_trigger_a_resync_for_everyone() {
        let store = Arc::new(MemStore::default());
        let (ctx, tx) = test_ctx(store.clone());

        let mut body = connect(ctx).await;
        read_until(&mut body, "No bookmarks yet").await;

        // The row appeared behind the feed's back; the unclassifiable
        // notification forces the reload that picks it up.
        store.seed("alice", "https://late.example", "late");
        tx.send(ChangeNotification::Other).unwrap();

        let update = read_until(&mut body, "late.example").await;
        assert!(update.contains("event: bookmarks"));
    }
}
