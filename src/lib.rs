//! mailsweep - IMAP mailbox scanner and duplicate email finder
//!
//! Scans every folder of an IMAP mailbox, fingerprints each message by
//! content, persists the metadata to SQLite, and answers which messages are
//! duplicated - within one mailbox or across two. Transports (HTTP, SSE,
//! whatever frames the progress events) live outside this crate.
//!
//! ## Module Organization
//!
//! - `adapters/imap`: protocol sessions, folder-tree normalization, fetch
//! - `adapters/sqlite`: connection pool, schema, record store
//! - `services/`: fingerprinting, folder walking, the scan engine, the
//!   duplicate index, progress pub/sub
//! - `types/`: boundary data structures and progress events
//! - `config/`: process-level configuration (database path, pool size)
//!
//! A scan is strictly sequential: one session, one folder at a time, one
//! message at a time. Persistence of a scan is one all-or-nothing batch.

pub mod adapters;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use adapters::imap::MailboxSession;
pub use adapters::sqlite::pool::create_pool;
pub use adapters::sqlite::DbPool;
pub use error::SweepError;
pub use services::duplicates::{delete_record, delete_records, find_cross_duplicates, find_duplicates};
pub use services::fingerprint::fingerprint;
pub use services::progress::ProgressChannel;
pub use services::scanner::{scan_folder_structure, scan_mailbox};
pub use types::progress::ProgressEvent;
pub use types::{
    ConnectionParams, DuplicateCluster, FolderDescriptor, FolderNode, MailboxProfile,
    MessageRecord, StoredMessage,
};

use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber for binaries that want the engine's logs.
///
/// Debug builds default to debug-level output for this crate; `RUST_LOG`
/// overrides. Library users with their own subscriber skip this entirely.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("mailsweep=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
