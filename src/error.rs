use thiserror::Error;

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Survey record not found: {0}")]
    NotFound(i64),

    #[error("Survey record {0} is already synced and can no longer be modified")]
    AlreadySynced(i64),

    #[error("Storage corruption in survey {id}: failed to parse \"{field}\" column")]
    Corruption {
        id: i64,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transaction error: {message}")]
    Transaction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Failure talking to the survey server.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed server response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// SequenceError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SequenceError {
    /// No cached cursor exists and the remote index is unreachable. Record
    /// creation is blocked until the device regains connectivity.
    #[error(
        "No serial number available: no cached cursor and the server index is \
         unreachable. Connect to the internet and reopen the app."
    )]
    NoConnectivityNoCache,

    #[error("Persisted serial cursor \"{0}\" is not a number")]
    BadCursor(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// SyncError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot sync while offline")]
    NoConnectivity,

    #[error("No work assignment id is configured. Restart the app after logging in.")]
    ConfigurationMissing,

    #[error("Server rejected the batch with status {status}: {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Rejected { status, message } => {
                SyncError::ServerRejected { status, message }
            }
            RemoteError::Transport(msg) | RemoteError::Malformed(msg) => {
                SyncError::Transport(msg)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SurveyError, the top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias; the default error type is `SurveyError`.
pub type Result<T, E = SurveyError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
