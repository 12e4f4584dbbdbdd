use rusqlite::params;

use super::DbPool;
use crate::error::SweepError;
use crate::types::{ConnectionParams, MailboxProfile};

/// Save a connection profile for reuse. Everything except the secret.
pub fn save_profile(pool: &DbPool, name: &str, params_in: &ConnectionParams) -> Result<i64, SweepError> {
    let conn = pool.get()?;
    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO mailboxes (name, host, port, username, secure, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            params_in.host,
            params_in.port,
            params_in.user,
            params_in.secure as i32,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_profiles(pool: &DbPool) -> Result<Vec<MailboxProfile>, SweepError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, host, port, username, secure, created_at
         FROM mailboxes ORDER BY created_at",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(MailboxProfile {
            id: row.get(0)?,
            name: row.get(1)?,
            host: row.get(2)?,
            port: row.get(3)?,
            username: row.get(4)?,
            secure: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
        })
    })?;

    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(row?);
    }
    Ok(profiles)
}
