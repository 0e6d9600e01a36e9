use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Creates the `users` table if needed. Safe to run on every start.
pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}

/// SQLSTATE for a unique constraint violation (Postgres 23505).
pub fn is_unique_violation_code(code: &str) -> bool {
    code == "23505"
}

pub fn is_unique_violation(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.code()
        .map(|c| is_unique_violation_code(c.as_ref()))
        .unwrap_or(false)
}
