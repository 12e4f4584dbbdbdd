use serde::Serialize;

/// Error taxonomy for a mailbox scan.
///
/// Connection, protocol and persistence failures abort the scan that raised
/// them. Folder-access and parse failures are absorbed at the folder or
/// message scope by the scan loop. An expunge failure is its own variant
/// because it describes a partial success: the message is flagged `\Deleted`
/// but still present on the server.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Folder access error: {0}")]
    FolderAccess(String),

    #[error("Message parse error: {0}")]
    Parse(String),

    #[error("Expunge error: {0}")]
    Expunge(String),

    #[error("Database error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),
}

// Serialize as a plain string so transports can pass the message through
// without knowing the variant structure.
impl Serialize for SweepError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<r2d2::Error> for SweepError {
    fn from(e: r2d2::Error) -> Self {
        SweepError::Persistence(e.to_string())
    }
}

impl From<rusqlite::Error> for SweepError {
    fn from(e: rusqlite::Error) -> Self {
        SweepError::Persistence(e.to_string())
    }
}
