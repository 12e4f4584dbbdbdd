use async_imap::Session;
use async_native_tls::{TlsConnector, TlsStream};
use futures::TryStreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::{folders, messages};
use crate::error::SweepError;
use crate::types::{ConnectionParams, FolderNode};

/// Stream bounds required by `async_imap::Session`. Blanket-implemented so
/// the generic helpers below work over both session flavors.
pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + std::fmt::Debug + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + std::fmt::Debug + Send> ImapStream for T {}

// These aliases save us from writing the full generic types everywhere.
// An IMAP session is generic over the stream type: TLS-encrypted TCP or
// bare TCP, both wrapped in the tokio compat layer.
pub type TlsSession = Session<TlsStream<TcpStream>>;
pub type PlainSession = Session<TcpStream>;

/// One authenticated IMAP session, owned for the lifetime of a scan.
///
/// The two stream flavors are the arms of this enum so nothing above the
/// adapter ever branches on transport security.
pub enum MailboxSession {
    Tls(TlsSession),
    Plain(PlainSession),
}

impl MailboxSession {
    /// Establish a transport and authenticate.
    ///
    /// Fails with [`SweepError::Connection`] on any network, TLS or login
    /// failure. Never retries internally; retry policy belongs to the
    /// caller.
    pub async fn connect(params: &ConnectionParams) -> Result<Self, SweepError> {
        info!(host = %params.host, port = params.port, secure = params.secure,
            "Connecting to IMAP server");

        let tcp = TcpStream::connect((params.host.as_str(), params.port))
            .await
            .map_err(|e| SweepError::Connection(format!("TCP connection failed: {}", e)))?;

        if params.secure {
            let tls = TlsConnector::new();
            let tls_stream = tls
                .connect(&params.host, tcp)
                .await
                .map_err(|e| SweepError::Connection(format!("TLS handshake failed: {}", e)))?;

            let client = async_imap::Client::new(tls_stream);
            let session = client
                .login(&params.user, &params.password)
                .await
                .map_err(|(e, _)| SweepError::Connection(format!("Login failed: {}", e)))?;
            Ok(MailboxSession::Tls(session))
        } else {
            let client = async_imap::Client::new(tcp);
            let session = client
                .login(&params.user, &params.password)
                .await
                .map_err(|(e, _)| SweepError::Connection(format!("Login failed: {}", e)))?;
            Ok(MailboxSession::Plain(session))
        }
    }

    /// The full folder hierarchy, normalized into the canonical tree.
    pub async fn list_folders(&mut self) -> Result<Vec<FolderNode>, SweepError> {
        match self {
            MailboxSession::Tls(s) => folders::list_folders(s).await,
            MailboxSession::Plain(s) => folders::list_folders(s).await,
        }
    }

    /// SELECT a folder for subsequent reads and return its message count.
    ///
    /// Fails with [`SweepError::FolderAccess`]; scan loops treat that as
    /// "skip this folder, continue", never as fatal.
    pub async fn select_folder(&mut self, folder: &str) -> Result<u32, SweepError> {
        let mailbox = match self {
            MailboxSession::Tls(s) => s.select(folder).await,
            MailboxSession::Plain(s) => s.select(folder).await,
        }
        .map_err(|e| SweepError::FolderAccess(format!("SELECT {} failed: {}", folder, e)))?;

        Ok(mailbox.exists)
    }

    /// Message count for a folder, without fetching bodies.
    ///
    /// Degrades to 0 on any error so one noisy folder cannot abort a
    /// structure preview. Callers that must tell "empty" from
    /// "inaccessible" call [`Self::select_folder`] instead.
    pub async fn count_messages(&mut self, folder: &str) -> u32 {
        match self.select_folder(folder).await {
            Ok(count) => count,
            Err(e) => {
                debug!(folder = %folder, error = %e, "Count failed, reporting folder as empty");
                0
            }
        }
    }

    /// Fetch every message of the currently selected folder in one pass,
    /// handing each parsed message to `on_message` as it arrives. Returns
    /// the number of messages delivered.
    pub async fn fetch_folder(
        &mut self,
        folder: &str,
        on_message: &mut dyn FnMut(messages::ParsedEmail),
    ) -> Result<usize, SweepError> {
        match self {
            MailboxSession::Tls(s) => messages::fetch_folder(s, folder, on_message).await,
            MailboxSession::Plain(s) => messages::fetch_folder(s, folder, on_message).await,
        }
    }

    /// Flag one message `\Deleted`. First phase of the two-phase delete.
    pub async fn mark_deleted(&mut self, folder: &str, uid: u32) -> Result<(), SweepError> {
        self.select_folder(folder).await?;

        let uid_set = uid.to_string();
        match self {
            MailboxSession::Tls(s) => store_deleted(s, &uid_set).await,
            MailboxSession::Plain(s) => store_deleted(s, &uid_set).await,
        }
    }

    /// EXPUNGE the selected folder. Second phase of the two-phase delete.
    ///
    /// A failure here after a successful [`Self::mark_deleted`] leaves the
    /// message flagged but present (hidden in most clients, recoverable)
    /// and is surfaced as [`SweepError::Expunge`], distinct from a flagging
    /// failure.
    pub async fn expunge(&mut self) -> Result<(), SweepError> {
        match self {
            MailboxSession::Tls(s) => run_expunge(s).await,
            MailboxSession::Plain(s) => run_expunge(s).await,
        }
    }

    /// Remove one message from the live mailbox: flag, then compact.
    pub async fn delete_message(&mut self, folder: &str, uid: u32) -> Result<(), SweepError> {
        self.mark_deleted(folder, uid).await?;
        self.expunge().await
    }

    /// Release the session. Safe to call after a prior failure; a LOGOUT
    /// rejected by a half-dead server is not worth surfacing.
    pub async fn logout(&mut self) {
        let result = match self {
            MailboxSession::Tls(s) => s.logout().await,
            MailboxSession::Plain(s) => s.logout().await,
        };
        if let Err(e) = result {
            warn!(error = %e, "LOGOUT failed, dropping session anyway");
        }
    }
}

async fn store_deleted<T: ImapStream>(
    session: &mut Session<T>,
    uid_set: &str,
) -> Result<(), SweepError> {
    let updates: Vec<_> = session
        .uid_store(uid_set, "+FLAGS (\\Deleted)")
        .await
        .map_err(|e| SweepError::Protocol(format!("STORE failed: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| SweepError::Protocol(format!("STORE response failed: {}", e)))?;
    debug!(uid = %uid_set, responses = updates.len(), "Marked message deleted");
    Ok(())
}

async fn run_expunge<T: ImapStream>(session: &mut Session<T>) -> Result<(), SweepError> {
    let expunged: Vec<u32> = session
        .expunge()
        .await
        .map_err(|e| SweepError::Expunge(format!("EXPUNGE failed: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| SweepError::Expunge(format!("EXPUNGE response failed: {}", e)))?;
    debug!(expunged = expunged.len(), "Expunge complete");
    Ok(())
}
