use rusqlite::Connection;

use crate::error::SweepError;

pub fn initialize_schema(conn: &Connection) -> Result<(), SweepError> {
    conn.execute_batch(
        "
        -- Scanned message metadata. One row per message identifier;
        -- a rescan upserts into the same row (last scan wins).
        CREATE TABLE IF NOT EXISTS emails (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id      TEXT NOT NULL UNIQUE,   -- RFC 5322 Message-ID, or synthesized uid-<uid>-<ts>
            subject         TEXT NOT NULL DEFAULT '',
            from_address    TEXT NOT NULL DEFAULT '',
            to_address      TEXT NOT NULL DEFAULT '',
            date            INTEGER NOT NULL,       -- unix epoch ms
            folder_name     TEXT NOT NULL,
            mailbox_id      TEXT NOT NULL,          -- caller-supplied account label
            content_hash    TEXT NOT NULL,          -- duplicate-grouping fingerprint
            uid             INTEGER NOT NULL,
            size            INTEGER NOT NULL,
            created_at      INTEGER NOT NULL        -- unix epoch ms
        );

        CREATE INDEX IF NOT EXISTS idx_emails_content_hash ON emails(content_hash);
        CREATE INDEX IF NOT EXISTS idx_emails_folder       ON emails(folder_name);
        CREATE INDEX IF NOT EXISTS idx_emails_mailbox      ON emails(mailbox_id);

        -- Saved connection profiles. The secret is never stored.
        CREATE TABLE IF NOT EXISTS mailboxes (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            host            TEXT NOT NULL,
            port            INTEGER NOT NULL,
            username        TEXT NOT NULL,
            secure          INTEGER NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL
        );
        ",
    )?;
    Ok(())
}
