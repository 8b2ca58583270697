use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::listener::UploadProgressListener;
use crate::types::types::{TransferId, TransferState};

/// Routes upload states to whichever listener is bound to each transfer.
///
/// Each transfer id has a single slot holding at most one listener. Bindings
/// live independently of the transfer: a transfer may run with nobody bound,
/// and a listener may be bound before the first state arrives. States
/// published while the slot is empty are dropped; nothing is replayed to a
/// listener bound later.
///
/// `bind`, `unbind` and the slot lookup in `publish` are serialized by one
/// mutex. The mutex is released before a listener is called.
pub struct UploadStateTracker {
    listeners: Mutex<HashMap<TransferId, Arc<dyn UploadProgressListener>>>,
}

impl Default for UploadStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadStateTracker {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Binds `listener` to `id`, replacing any listener bound before.
    pub fn bind(&self, id: TransferId, listener: Arc<dyn UploadProgressListener>) {
        if self.slots().insert(id.clone(), listener).is_some() {
            log::debug!("[UploadStateTracker] transfer={}: replaced bound listener", id);
        }
    }

    /// Removes the binding for `id` only if `listener` is the one bound.
    ///
    /// Returns whether a binding was removed. A mismatch means a newer
    /// listener took over the slot (e.g. a recycled view) and is left alone.
    pub fn unbind(&self, id: &TransferId, listener: &Arc<dyn UploadProgressListener>) -> bool {
        let mut slots = self.slots();
        match slots.get(id) {
            Some(bound) if Arc::ptr_eq(bound, listener) => {
                slots.remove(id);
                true
            }
            Some(_) => {
                log::debug!(
                    "[UploadStateTracker] transfer={}: unbind ignored, another listener is bound",
                    id
                );
                false
            }
            None => false,
        }
    }

    pub fn is_bound(&self, id: &TransferId) -> bool {
        self.slots().contains_key(id)
    }

    /// Number of transfers that currently have a listener.
    pub fn bound_count(&self) -> usize {
        self.slots().len()
    }

    /// Forwards `state` to the listener bound to `id`, if any.
    pub async fn publish(&self, id: &TransferId, state: TransferState) {
        let listener = self.slots().get(id).cloned();
        match listener {
            Some(listener) => listener.on_update(&state).await,
            None => log::trace!("[UploadStateTracker] transfer={}: no listener, dropping {:?}", id, state),
        }
    }

    /// Drains states emitted by the upload pipeline until every sender is
    /// dropped, publishing each one in the order it was received.
    pub async fn run(self: Arc<Self>, mut state_rx: mpsc::Receiver<(TransferId, TransferState)>) {
        while let Some((id, state)) = state_rx.recv().await {
            self.publish(&id, state).await;
        }
        log::debug!("[UploadStateTracker] upload pipeline closed");
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<TransferId, Arc<dyn UploadProgressListener>>> {
        // Slots stay consistent even if a holder panicked: every critical
        // section is a single map operation.
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
