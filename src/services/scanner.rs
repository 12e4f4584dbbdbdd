use chrono::Utc;
use tracing::{debug, info, warn};

use crate::adapters::imap::{MailboxSession, ParsedEmail};
use crate::adapters::sqlite::{records, DbPool};
use crate::error::SweepError;
use crate::services::{fingerprint, walker};
use crate::services::progress::ProgressChannel;
use crate::types::progress::ProgressEvent;
use crate::types::{ConnectionParams, FolderDescriptor, MessageRecord};

/// Per-message progress cadence within one folder.
const PROGRESS_EVERY: usize = 25;

/// Scan one mailbox end to end: connect, enumerate folders, fetch and
/// fingerprint every message, persist the lot as one batch.
///
/// One folder failing to open or fetch is skipped with a warning; the scan
/// continues. Connection, listing and persistence failures are fatal and
/// produce the terminal `error` progress event. The session is logged out
/// on every exit path.
pub async fn scan_mailbox(
    pool: &DbPool,
    params: &ConnectionParams,
    mailbox_id: &str,
    progress: Option<&ProgressChannel>,
) -> Result<Vec<MessageRecord>, SweepError> {
    if let Some(p) = progress {
        p.connecting(&params.host);
    }

    let mut session = match MailboxSession::connect(params).await {
        Ok(session) => session,
        Err(e) => return Err(fail(progress, e)),
    };

    let scanned = scan_folders(&mut session, mailbox_id, progress).await;
    session.logout().await;

    let records_out = match scanned {
        Ok(records_out) => records_out,
        Err(e) => return Err(fail(progress, e)),
    };

    if let Some(p) = progress {
        p.saving(records_out.len());
    }
    if let Err(e) = records::upsert_batch(pool, &records_out) {
        return Err(fail(progress, e));
    }

    if let Some(p) = progress {
        p.complete(records_out.len());
    }
    info!(mailbox = %mailbox_id, records = records_out.len(), "Mailbox scan complete");
    Ok(records_out)
}

/// Enumerate folders with message counts, without touching persistence.
/// Same progress lifecycle as a scan; the terminal `complete` summarizes
/// the structure.
pub async fn scan_folder_structure(
    params: &ConnectionParams,
    progress: Option<&ProgressChannel>,
) -> Result<Vec<FolderDescriptor>, SweepError> {
    if let Some(p) = progress {
        p.connecting(&params.host);
    }

    let mut session = match MailboxSession::connect(params).await {
        Ok(session) => session,
        Err(e) => return Err(fail(progress, e)),
    };

    let walked = walk_structure(&mut session, progress).await;
    session.logout().await;

    match walked {
        Ok(folders) => {
            if let Some(p) = progress {
                let total: u32 = folders.iter().map(|f| f.email_count).sum();
                p.emit(ProgressEvent::Complete {
                    message: format!(
                        "Found {} folders with {} total emails",
                        folders.len(),
                        total
                    ),
                    total: total as usize,
                });
            }
            Ok(folders)
        }
        Err(e) => Err(fail(progress, e)),
    }
}

async fn scan_folders(
    session: &mut MailboxSession,
    mailbox_id: &str,
    progress: Option<&ProgressChannel>,
) -> Result<Vec<MessageRecord>, SweepError> {
    let folders = walker::discover_folders(session).await?;
    if let Some(p) = progress {
        p.folders_found(folders.len());
    }

    let mut all_records = Vec::new();
    let total = folders.len();

    for (index, folder) in folders.iter().enumerate() {
        if let Some(p) = progress {
            p.scanning_folder(&folder.path, index + 1, total);
        }

        let exists = match session.select_folder(&folder.path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(folder = %folder.path, error = %e, "Skipping inaccessible folder");
                continue;
            }
        };
        if exists == 0 {
            debug!(folder = %folder.path, "Folder is empty");
            continue;
        }

        // Accumulate per folder so a fetch that dies midway contributes
        // nothing, matching the skip-whole-folder recovery policy.
        let mut folder_records = Vec::new();
        let fetched = session
            .fetch_folder(&folder.path, &mut |parsed| {
                folder_records.push(build_record(parsed, &folder.path, mailbox_id));
                if let Some(p) = progress {
                    if folder_records.len() % PROGRESS_EVERY == 0 {
                        p.processing(folder_records.len(), exists as usize);
                    }
                }
            })
            .await;

        match fetched {
            Ok(count) => {
                debug!(folder = %folder.path, messages = count, "Folder scanned");
                all_records.append(&mut folder_records);
            }
            Err(e) => {
                warn!(folder = %folder.path, error = %e, "Folder fetch failed, continuing scan");
            }
        }
    }

    Ok(all_records)
}

async fn walk_structure(
    session: &mut MailboxSession,
    progress: Option<&ProgressChannel>,
) -> Result<Vec<FolderDescriptor>, SweepError> {
    let mut folders = walker::discover_folders(session).await?;
    if let Some(p) = progress {
        p.folders_found(folders.len());
    }

    let total = folders.len();
    for (index, folder) in folders.iter_mut().enumerate() {
        if let Some(p) = progress {
            p.scanning_folder(&folder.path, index + 1, total);
        }
        folder.email_count = session.count_messages(&folder.path).await;
    }

    Ok(folders)
}

/// Fingerprint a parsed message and attach its scan context.
///
/// Messages without a Message-ID get a `uid-<uid>-<timestamp>` identifier;
/// those are not stable across rescans, so they upsert as fresh rows each
/// time.
fn build_record(parsed: ParsedEmail, folder: &str, mailbox_id: &str) -> MessageRecord {
    let content_hash = fingerprint::fingerprint(
        &parsed.subject,
        &parsed.from,
        &parsed.to,
        &parsed.body_text,
    );
    let message_id = parsed
        .message_id
        .unwrap_or_else(|| format!("uid-{}-{}", parsed.uid, Utc::now().timestamp_millis()));

    MessageRecord {
        message_id,
        subject: parsed.subject,
        from: parsed.from,
        to: parsed.to,
        date: parsed.date,
        folder_name: folder.to_string(),
        mailbox_id: mailbox_id.to_string(),
        content_hash,
        uid: parsed.uid,
        size: parsed.size,
    }
}

/// Emit the terminal `error` event and hand the error back to the caller.
fn fail(progress: Option<&ProgressChannel>, error: SweepError) -> SweepError {
    if let Some(p) = progress {
        p.error(&error.to_string());
    }
    error
}
