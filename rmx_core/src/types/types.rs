use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code a homeserver returns when the access token is no longer valid.
pub const M_UNKNOWN_TOKEN: &str = "M_UNKNOWN_TOKEN";

// ---------------------------------------------------------------------------
// Sign-out
// ---------------------------------------------------------------------------

/// Parameters for a single sign-out invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOutParams {
    /// When false only the local session data is removed.
    pub sign_out_from_homeserver: bool,
}

/// Standard Matrix error body (`{"errcode": "...", "error": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerErrorBody {
    pub errcode: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Failure of a remote call against the homeserver.
#[derive(Debug, Error)]
pub enum RemoteFailure {
    /// The homeserver answered with a non-2xx status and a Matrix error body.
    #[error("homeserver returned {http_status} ({errcode}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        http_status: u16,
        errcode: String,
        message: Option<String>,
    },

    /// Non-2xx status whose body is not a Matrix error.
    #[error("homeserver returned {http_status}: {body}")]
    OtherServer { http_status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl RemoteFailure {
    pub fn server(http_status: u16, errcode: impl Into<String>) -> Self {
        RemoteFailure::Server {
            http_status,
            errcode: errcode.into(),
            message: None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            RemoteFailure::Server { http_status, .. } | RemoteFailure::OtherServer { http_status, .. } => {
                Some(*http_status)
            }
            RemoteFailure::Network(e) => e.status().map(|s| s.as_u16()),
        }
    }

    pub fn errcode(&self) -> Option<&str> {
        match self {
            RemoteFailure::Server { errcode, .. } => Some(errcode),
            _ => None,
        }
    }
}

/// How a remote failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Known server defect, safe to treat as success.
    Ignorable,
    Fatal,
}

/// Invalid configuration for the homeserver client.
#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("invalid homeserver url '{url}': {reason}")]
    InvalidHomeserver { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to remove session data at {path}: {source}")]
    RemoveDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cleanup job panicked or was cancelled before finishing.
    #[error("cleanup did not run to completion: {0}")]
    Aborted(#[from] tokio::task::JoinError),

    #[error("cleanup failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum SignOutError {
    /// The homeserver rejected the sign-out; local data was left untouched.
    #[error("remote sign-out failed: {0}")]
    Remote(#[from] RemoteFailure),

    #[error("session cleanup failed: {0}")]
    Cleanup(#[from] CleanupError),

    /// Remote sign-out was requested from a task built without a homeserver.
    #[error("no homeserver configured for remote sign-out")]
    NoHomeserver,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// Opaque identifier of an in-flight upload, supplied by the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransferId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransferId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Cause carried by a failed upload.
pub type TransferFailure = Arc<dyn std::error::Error + Send + Sync>;

/// One point in the lifecycle of an upload.
///
/// `Success` and `Failure` are terminal. `current <= total` is expected for
/// the two uploading variants but not relied upon by the projector.
#[derive(Debug, Clone)]
pub enum TransferState {
    Idle,
    EncryptingThumbnail,
    UploadingThumbnail { current: u64, total: u64 },
    Encrypting,
    Uploading { current: u64, total: u64 },
    Success,
    Failure { cause: TransferFailure },
}

impl TransferState {
    pub fn failure(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransferState::Failure {
            cause: Arc::new(cause),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Success | TransferState::Failure { .. })
    }
}

/// Where the media being rendered currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    /// Local file that has not been uploaded yet.
    Local,
    Remote,
}
