use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::bootstrap::config::Config;

pub type PgPool = Pool<Postgres>;

fn pool_options(cfg: &Config) -> PgPoolOptions {
    PgPoolOptions::new().max_connections(cfg.database_max_connections)
}

pub async fn connect_pool(cfg: &Config) -> anyhow::Result<PgPool> {
    let pool = pool_options(cfg).connect(&cfg.database_url).await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Uses compile-time embedded migrations under ./migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub mod repositories;
