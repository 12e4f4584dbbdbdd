pub mod progress;

use serde::{Deserialize, Serialize};

/// Parameters for one IMAP session. Supplied by the caller per scan and
/// never persisted by the engine; the saved-mailbox table stores everything
/// here except `password`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Wrap the TCP stream in TLS before the IMAP handshake.
    pub secure: bool,
}

/// One node of the canonical folder tree.
///
/// The IMAP LIST response arrives as a flat list of delimited paths; the
/// protocol adapter normalizes it into this tree once, so everything above
/// the adapter works with a single representation.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    /// Leaf segment, e.g. "Work" for "INBOX/Work".
    pub name: String,
    /// Full path as addressed on the server.
    pub path: String,
    /// Hierarchy delimiter reported by the server for this mailbox.
    pub delimiter: Option<String>,
    pub children: Vec<FolderNode>,
}

/// Flattened, addressable folder with its message count.
/// Rebuilt on every scan; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDescriptor {
    pub name: String,
    pub path: String,
    pub email_count: u32,
}

/// One scanned message, ready for persistence.
///
/// `message_id` comes from the Message-ID header. When the header is absent
/// a `uid-<uid>-<timestamp>` identifier is synthesized; those are not stable
/// across rescans, so such messages can upsert into fresh rows instead of
/// overwriting their previous ones. Known identity-fidelity gap, kept to
/// match the recorded behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub message_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    /// Date header as unix epoch milliseconds; scan time when unparseable.
    pub date: i64,
    pub folder_name: String,
    /// Caller-supplied label distinguishing scanned accounts. Not a server
    /// concept.
    pub mailbox_id: String,
    pub content_hash: String,
    pub uid: u32,
    pub size: u32,
}

/// A persisted message row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: i64,
    pub message_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: i64,
    pub folder_name: String,
    pub mailbox_id: String,
    pub content_hash: String,
    pub uid: u32,
    pub size: u32,
}

/// Messages sharing one content fingerprint within a query scope.
///
/// Only exists for counts of two or more; members are ordered newest first,
/// so `messages[0]` is the representative copy. Recomputed on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCluster {
    pub content_hash: String,
    pub duplicate_count: i64,
    pub messages: Vec<StoredMessage>,
}

/// A saved connection profile. The secret is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxProfile {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secure: bool,
    pub created_at: i64,
}
