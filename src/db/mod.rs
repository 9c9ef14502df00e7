//! Database module
//!
//! This module handles database connections, migrations, and the PostgreSQL
//! rule store.

pub mod connection;
pub mod rule_repo;

use sqlx::PgPool;

use crate::error::AppResult;

pub use connection::*;
pub use rule_repo::PgRuleStore;

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
