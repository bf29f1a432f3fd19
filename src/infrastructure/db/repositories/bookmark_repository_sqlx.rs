use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::bookmark_repository::{BookmarkRepository, StoreError};
use crate::domain::bookmarks::bookmark::Bookmark;
use crate::infrastructure::db::PgPool;

pub struct SqlxBookmarkRepository {
    pub pool: PgPool,
}

impl SqlxBookmarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translates driver failures into the port's structured kinds. The message
/// heuristics back up the SQLSTATE checks for drivers/proxies that only
/// relay text.
pub(crate) fn map_store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            // undefined_table
            Some("42P01") => return StoreError::SchemaMissing,
            // insufficient_privilege
            Some("42501") => return StoreError::AccessDenied,
            _ => {}
        }
        let message = db.message().to_ascii_lowercase();
        if message.contains("does not exist") {
            return StoreError::SchemaMissing;
        }
        if message.contains("permission denied") || message.contains("row-level security") {
            return StoreError::AccessDenied;
        }
    }
    StoreError::Unavailable(err.into())
}

fn row_to_bookmark(r: &PgRow) -> Bookmark {
    Bookmark {
        id: r.get("id"),
        url: r.get("url"),
        title: r.get("title"),
        owner_id: r.get("owner_id"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl BookmarkRepository for SqlxBookmarkRepository {
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Bookmark>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, url, title, owner_id, created_at
               FROM bookmarks WHERE owner_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_error)?;
        Ok(rows.iter().map(row_to_bookmark).collect())
    }

    async fn insert(
        &self,
        owner_id: &str,
        url: &str,
        title: &str,
    ) -> Result<Bookmark, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO bookmarks (owner_id, url, title) VALUES ($1, $2, $3)
               RETURNING id, url, title, owner_id, created_at"#,
        )
        .bind(owner_id)
        .bind(url)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_error)?;
        Ok(row_to_bookmark(&row))
    }

    async fn delete_owned(&self, id: Uuid, owner_id: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(map_store_error)?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_stay_unclassified() {
        let err = map_store_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
