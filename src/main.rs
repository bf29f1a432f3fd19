use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use linkbox::bootstrap::app_context::{AppContext, AppServices};
use linkbox::bootstrap::config::Config;
use linkbox::infrastructure::db::repositories::bookmark_repository_sqlx::SqlxBookmarkRepository;
use linkbox::infrastructure::feed::broadcast::BroadcastChangeFeed;
use linkbox::infrastructure::identity::oauth_client::ReqwestIdentityProvider;
use linkbox::presentation::http::{auth, bookmarks, events, health, pages};

#[derive(OpenApi)]
#[openapi(
    paths(
        linkbox::presentation::http::bookmarks::list_bookmarks,
        linkbox::presentation::http::bookmarks::create_bookmark,
        linkbox::presentation::http::bookmarks::delete_bookmark,
        linkbox::presentation::http::health::health,
    ),
    components(schemas(
        linkbox::presentation::http::bookmarks::BookmarkItem,
        linkbox::presentation::http::bookmarks::BookmarkListResponse,
        linkbox::presentation::http::bookmarks::CreateBookmarkRequest,
        linkbox::presentation::http::bookmarks::ApiError,
        linkbox::presentation::http::health::HealthResponse,
    )),
    tags(
        (name = "Bookmarks", description = "Bookmark management"),
        (name = "Health", description = "System health checks")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "linkbox=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(port = cfg.api_port, base_url = %cfg.base_url(), "Starting linkbox backend");

    // Database
    let pool = linkbox::infrastructure::db::connect_pool(&cfg).await?;
    linkbox::infrastructure::db::migrate(&pool).await?;

    let bookmark_repo = Arc::new(SqlxBookmarkRepository::new(pool.clone()));
    let identity = Arc::new(ReqwestIdentityProvider::new(&cfg));
    let (changes_tx, _) = broadcast::channel(256);
    let change_publisher = Arc::new(BroadcastChangeFeed::new(changes_tx.clone()));

    let services = AppServices::new(bookmark_repo, identity, change_publisher, changes_tx);
    let ctx = AppContext::new(cfg.clone(), services);

    let app = Router::new()
        .merge(pages::routes(ctx.clone()))
        .nest("/auth", auth::routes(ctx.clone()))
        .nest("/api", bookmarks::routes(ctx.clone()))
        .nest("/api", events::routes(ctx.clone()))
        .nest("/api", health::routes(pool.clone()))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.cfg.api_port));
    info!(%addr, "HTTP listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
