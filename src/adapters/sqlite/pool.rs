use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use tracing::info;

use super::schema;
use crate::error::SweepError;

// Shorthand so callers never spell out the full manager type.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Create the process-wide connection pool and initialize the schema.
///
/// Called once at startup; the pool is then passed by reference into every
/// store function. Nothing in the crate reaches for it as a global.
pub fn create_pool(db_path: &Path, max_size: u32) -> Result<DbPool, SweepError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| SweepError::Persistence(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder().max_size(max_size).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;
         PRAGMA foreign_keys = ON;",
    )?;
    schema::initialize_schema(&conn)?;

    info!(path = %db_path.display(), "Database pool ready");
    Ok(pool)
}
