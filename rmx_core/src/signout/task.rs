use std::sync::Arc;

use crate::signout::api::SignOutApi;
use crate::signout::classifier::classify;
use crate::signout::cleanup::CleanupSession;
use crate::types::types::{Classification, CleanupError, SignOutError, SignOutParams};

/// Tears down a session: optional remote logout, then local cleanup.
///
/// | Remote stage                         | Cleanup | Result              |
/// |--------------------------------------|---------|---------------------|
/// | skipped (`sign_out_from_homeserver`) | yes     | `Ok(())`            |
/// | succeeded                            | yes     | `Ok(())`            |
/// | failed, `Ignorable`                  | yes     | `Ok(())`            |
/// | failed, `Fatal`                      | **no**  | `Err(Remote(..))`   |
///
/// A fatal rejection leaves local data untouched so the whole sign-out can be
/// retried while the server may still consider the session live.
///
/// One invocation at a time per session; callers serialize concurrent attempts.
pub struct SignOutTask {
    api: Option<Arc<dyn SignOutApi>>,
    cleanup: Arc<dyn CleanupSession>,
}

impl SignOutTask {
    pub fn new(api: Arc<dyn SignOutApi>, cleanup: Arc<dyn CleanupSession>) -> Self {
        Self {
            api: Some(api),
            cleanup,
        }
    }

    /// A task that can only remove local data; asking it to contact the
    /// homeserver fails with `SignOutError::NoHomeserver`.
    pub fn local_only(cleanup: Arc<dyn CleanupSession>) -> Self {
        Self { api: None, cleanup }
    }

    pub async fn execute(&self, params: SignOutParams) -> Result<(), SignOutError> {
        // Also after a soft logout, so the device gets deleted on the homeserver.
        if params.sign_out_from_homeserver {
            let api = self.api.as_ref().ok_or(SignOutError::NoHomeserver)?;
            log::debug!("[SignOutTask] sending logout request");
            if let Err(failure) = api.sign_out().await {
                match classify(&failure) {
                    Classification::Ignorable => {
                        log::warn!(
                            "[SignOutTask] ignoring logout failure caused by token invalidation race: {}",
                            failure
                        );
                    }
                    Classification::Fatal => {
                        log::error!("[SignOutTask] logout failed, keeping local session: {}", failure);
                        return Err(SignOutError::Remote(failure));
                    }
                }
            }
        }

        log::debug!("[SignOutTask] cleaning up session");
        // Cleanup blocks on disk I/O; keep it off the async workers.
        let cleanup = Arc::clone(&self.cleanup);
        tokio::task::spawn_blocking(move || cleanup.handle())
            .await
            .map_err(CleanupError::from)??;
        Ok(())
    }
}
