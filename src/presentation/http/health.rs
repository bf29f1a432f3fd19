use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::ports::bookmark_repository::StoreError;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::repositories::bookmark_repository_sqlx::map_store_error;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

fn store_label(err: StoreError) -> &'static str {
    match err {
        StoreError::SchemaMissing => "missing_schema",
        StoreError::AccessDenied => "access_denied",
        StoreError::Unavailable(_) => "unreachable",
    }
}

/// Probes the bookmarks relation itself, so an unapplied migration is
/// reported distinctly from an unreachable database.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health(State(pool): State<PgPool>) -> Json<HealthResponse> {
    let store = match sqlx::query("SELECT id FROM bookmarks LIMIT 1")
        .fetch_optional(&pool)
        .await
    {
        Ok(_) => "ready",
        Err(err) => store_label(map_store_error(err)),
    };
    let status = if store == "ready" { "ok" } else { "unavailable" };
    Json(HealthResponse { status, store })
}

pub fn routes(pool: PgPool) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}
