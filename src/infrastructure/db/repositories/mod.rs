pub mod bookmark_repository_sqlx;
