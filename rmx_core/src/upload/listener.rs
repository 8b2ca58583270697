use async_trait::async_trait;

use crate::types::types::TransferState;

/// Anything that wants to follow the upload of one transfer.
///
/// The `UploadStateTracker` calls `on_update` for every state published for
/// the transfer the listener is currently bound to, in emission order. The
/// tracker holds no lock while calling in, so a listener may unbind itself
/// from inside `on_update`.
#[async_trait]
pub trait UploadProgressListener: Send + Sync + 'static {
    async fn on_update(&self, state: &TransferState);
}
