use rusqlite::{params, params_from_iter, Row};
use tracing::debug;

use super::DbPool;
use crate::error::SweepError;
use crate::types::{MessageRecord, StoredMessage};

/// One row of a duplicate query: the stored message plus the size of the
/// fingerprint group it belongs to within the query scope.
#[derive(Debug, Clone)]
pub struct DuplicateRow {
    pub message: StoredMessage,
    pub duplicate_count: i64,
}

/// Insert-or-update a scan's records as one transaction.
///
/// Keyed on `message_id`: a rescan overwrites every other field of an
/// existing row (last scan wins) instead of creating a second one. Any
/// failure rolls the whole batch back, so a scan either persists completely
/// or not at all.
pub fn upsert_batch(pool: &DbPool, records: &[MessageRecord]) -> Result<usize, SweepError> {
    let conn = pool.get()?;
    let tx = conn.unchecked_transaction()?;
    let now = chrono::Utc::now().timestamp_millis();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO emails (
                message_id, subject, from_address, to_address, date,
                folder_name, mailbox_id, content_hash, uid, size, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(message_id) DO UPDATE SET
                subject      = excluded.subject,
                from_address = excluded.from_address,
                to_address   = excluded.to_address,
                date         = excluded.date,
                folder_name  = excluded.folder_name,
                mailbox_id   = excluded.mailbox_id,
                content_hash = excluded.content_hash,
                uid          = excluded.uid,
                size         = excluded.size",
        )?;

        for record in records {
            stmt.execute(params![
                record.message_id,
                record.subject,
                record.from,
                record.to,
                record.date,
                record.folder_name,
                record.mailbox_id,
                record.content_hash,
                record.uid,
                record.size,
                now,
            ])?;
        }
    }

    tx.commit()?;
    debug!(records = records.len(), "Upserted scan batch");
    Ok(records.len())
}

/// Rows sharing a fingerprint more than once, optionally scoped to one
/// mailbox label, ordered by fingerprint then date descending.
pub fn query_duplicates(
    pool: &DbPool,
    mailbox_id: Option<&str>,
) -> Result<Vec<DuplicateRow>, SweepError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "WITH duplicate_groups AS (
            SELECT content_hash, COUNT(*) AS duplicate_count
            FROM emails
            WHERE (?1 IS NULL OR mailbox_id = ?1)
            GROUP BY content_hash
            HAVING COUNT(*) > 1
        )
        SELECT e.id, e.message_id, e.subject, e.from_address, e.to_address,
               e.date, e.folder_name, e.mailbox_id, e.content_hash, e.uid,
               e.size, dg.duplicate_count
        FROM emails e
        JOIN duplicate_groups dg ON e.content_hash = dg.content_hash
        WHERE (?1 IS NULL OR e.mailbox_id = ?1)
        ORDER BY e.content_hash, e.date DESC",
    )?;

    let rows = stmt.query_map(params![mailbox_id], duplicate_row)?;
    collect_rows(rows)
}

/// Cross-mailbox duplicates: fingerprints present in BOTH labels' record
/// sets, with every record from either label and the combined count.
///
/// A single copy in each mailbox (1+1) qualifies: the query answers "this
/// message exists in both places", not "one mailbox holds it twice".
pub fn query_cross_duplicates(
    pool: &DbPool,
    mailbox_a: &str,
    mailbox_b: &str,
) -> Result<Vec<DuplicateRow>, SweepError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "WITH mailbox_a AS (
            SELECT content_hash, COUNT(*) AS count_a
            FROM emails WHERE mailbox_id = ?1
            GROUP BY content_hash
        ),
        mailbox_b AS (
            SELECT content_hash, COUNT(*) AS count_b
            FROM emails WHERE mailbox_id = ?2
            GROUP BY content_hash
        ),
        cross_duplicates AS (
            SELECT a.content_hash, a.count_a + b.count_b AS duplicate_count
            FROM mailbox_a a
            JOIN mailbox_b b ON a.content_hash = b.content_hash
        )
        SELECT e.id, e.message_id, e.subject, e.from_address, e.to_address,
               e.date, e.folder_name, e.mailbox_id, e.content_hash, e.uid,
               e.size, cd.duplicate_count
        FROM emails e
        JOIN cross_duplicates cd ON e.content_hash = cd.content_hash
        WHERE e.mailbox_id IN (?1, ?2)
        ORDER BY e.content_hash, e.date DESC",
    )?;

    let rows = stmt.query_map(params![mailbox_a, mailbox_b], duplicate_row)?;
    collect_rows(rows)
}

pub fn delete_by_id(pool: &DbPool, id: i64) -> Result<usize, SweepError> {
    let conn = pool.get()?;
    let deleted = conn.execute("DELETE FROM emails WHERE id = ?1", params![id])?;
    Ok(deleted)
}

pub fn delete_by_ids(pool: &DbPool, ids: &[i64]) -> Result<usize, SweepError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let conn = pool.get()?;
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
    let sql = format!("DELETE FROM emails WHERE id IN ({})", placeholders);
    let deleted = conn.execute(&sql, params_from_iter(ids.iter()))?;
    debug!(requested = ids.len(), deleted = deleted, "Deleted records");
    Ok(deleted)
}

fn duplicate_row(row: &Row) -> rusqlite::Result<DuplicateRow> {
    Ok(DuplicateRow {
        message: StoredMessage {
            id: row.get(0)?,
            message_id: row.get(1)?,
            subject: row.get(2)?,
            from: row.get(3)?,
            to: row.get(4)?,
            date: row.get(5)?,
            folder_name: row.get(6)?,
            mailbox_id: row.get(7)?,
            content_hash: row.get(8)?,
            uid: row.get(9)?,
            size: row.get(10)?,
        },
        duplicate_count: row.get(11)?,
    })
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<DuplicateRow>>,
) -> Result<Vec<DuplicateRow>, SweepError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
