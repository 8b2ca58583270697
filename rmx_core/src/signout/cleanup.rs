use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::types::types::CleanupError;

/// Removes everything the client stored locally for a session.
///
/// Called from `SignOutTask::execute` after the remote stage has resolved.
/// Implementations may block: the task runs them on tokio's blocking pool
/// and waits for them before returning.
pub trait CleanupSession: Send + Sync + 'static {
    fn handle(&self) -> Result<(), CleanupError>;
}

/// Deletes the session's data directory (store, caches, media).
///
/// A directory that is already gone counts as cleaned, so a sign-out that is
/// retried after a partial failure can run this again.
pub struct FileSessionCleanup {
    session_dir: PathBuf,
}

impl FileSessionCleanup {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }
}

impl CleanupSession for FileSessionCleanup {
    fn handle(&self) -> Result<(), CleanupError> {
        log::info!("[FileSessionCleanup] removing {}", self.session_dir.display());
        match std::fs::remove_dir_all(&self.session_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(
                    "[FileSessionCleanup] {} already removed",
                    self.session_dir.display()
                );
                Ok(())
            }
            Err(source) => Err(CleanupError::RemoveDir {
                path: self.session_dir.clone(),
                source,
            }),
        }
    }
}
