use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::listener::UploadProgressListener;
use super::projector::{project, RenderDirective};
use super::tracker::UploadStateTracker;
use crate::types::types::{MediaSource, TransferId, TransferState};

/// The progress area of one media item on screen.
pub trait ProgressView: Send + Sync + 'static {
    fn render(&self, directive: &RenderDirective);
}

/// Listener that projects each upload state and renders it on a view.
///
/// Once `Success` or `Failure` has been rendered, later states for the same
/// transfer are logged and dropped so a stray event cannot resurrect the
/// progress indicator.
pub struct MediaProgressUpdater {
    media: MediaSource,
    view: Arc<dyn ProgressView>,
    finished: AtomicBool,
}

impl MediaProgressUpdater {
    pub fn new(media: MediaSource, view: Arc<dyn ProgressView>) -> Self {
        Self {
            media,
            view,
            finished: AtomicBool::new(false),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[async_trait]
impl UploadProgressListener for MediaProgressUpdater {
    async fn on_update(&self, state: &TransferState) {
        if self.is_finished() {
            log::warn!("[MediaProgressUpdater] state after terminal state dropped: {:?}", state);
            return;
        }
        if state.is_terminal() {
            self.finished.store(true, Ordering::Release);
        }
        self.view.render(&project(state, self.media));
    }
}

/// Connects on-screen media items to the upload tracker of a session.
///
/// The tracker is handed in at construction. The binder remembers the
/// updater it created for each transfer so `unbind` only ever removes its
/// own binding.
pub struct UploadProgressBinder {
    tracker: Arc<UploadStateTracker>,
    updaters: Mutex<HashMap<TransferId, Arc<dyn UploadProgressListener>>>,
}

impl UploadProgressBinder {
    pub fn new(tracker: Arc<UploadStateTracker>) -> Self {
        Self {
            tracker,
            updaters: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracker(&self) -> &Arc<UploadStateTracker> {
        &self.tracker
    }

    /// Starts rendering the upload of `id` on `view`.
    pub fn bind(&self, id: TransferId, media: MediaSource, view: Arc<dyn ProgressView>) {
        let updater: Arc<dyn UploadProgressListener> = Arc::new(MediaProgressUpdater::new(media, view));
        // Held across the tracker call so the binder and tracker agree on
        // the bound updater. Lock order is always binder, then tracker.
        let mut updaters = self.updaters();
        updaters.insert(id.clone(), Arc::clone(&updater));
        self.tracker.bind(id, updater);
    }

    /// Stops rendering the upload of `id`. No-op when nothing is bound.
    pub fn unbind(&self, id: &TransferId) {
        let mut updaters = self.updaters();
        if let Some(updater) = updaters.remove(id) {
            self.tracker.unbind(id, &updater);
        }
    }

    fn updaters(&self) -> MutexGuard<'_, HashMap<TransferId, Arc<dyn UploadProgressListener>>> {
        self.updaters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
