//! Schema migrations embedded from `migrations/` (sqlx reversible migrations).

use crate::error::AppError;
use sqlx::migrate::{Migrate, Migrator};
use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every pending migration.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR.run(pool).await?;
    tracing::info!(available = MIGRATOR.iter().count(), "migrations applied");
    Ok(())
}

/// Revert the most recently applied migration. Returns its version, or `None` when
/// nothing is applied.
pub async fn revert_latest(pool: &PgPool) -> Result<Option<i64>, AppError> {
    let applied = {
        let mut conn = pool.acquire().await?;
        conn.ensure_migrations_table().await?;
        conn.list_applied_migrations().await?
    };
    let mut versions: Vec<i64> = applied.iter().map(|m| m.version).collect();
    versions.sort_unstable();
    let Some(latest) = versions.pop() else {
        tracing::info!("no applied migrations to revert");
        return Ok(None);
    };
    let target = versions.last().copied().unwrap_or(0);
    MIGRATOR.undo(pool, target).await?;
    tracing::info!(version = latest, "migration reverted");
    Ok(Some(latest))
}
