//! Single-flight background saving for [`AttributeMap`]s with auto-save enabled.
//!
//! Each map owns one [`AutoSaver`]. At most one save is in flight at a time. Requests that arrive
//! while a save is running replace whatever request is already queued, so after a burst of
//! changes the worker writes the newest snapshot once and then goes idle. Writes from the same
//! map never interleave at the storage boundary.
//!
//! The worker is a tokio task when a runtime is available and a plain thread otherwise. Failures
//! are logged and dropped; callers that need to see storage errors use `AttributeMap::save`.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use super::{AttributeMap, lock};
use crate::{events::SaveMotive, storage::Storage};

/// A snapshot waiting to be written.
pub(crate) struct SaveRequest {
    pub(crate) map: AttributeMap,
    pub(crate) motive: SaveMotive,
    pub(crate) storage: Arc<dyn Storage>,
}

#[derive(Default)]
struct SaverState {
    pending: Option<SaveRequest>,
    running: bool,
}

#[derive(Default)]
pub(crate) struct AutoSaver {
    state: Mutex<SaverState>,
    idle: Notify,
}

impl AutoSaver {
    /// Queue `request` and start the worker if it isn't already running.
    pub(crate) fn schedule(self: &Arc<Self>, request: SaveRequest) {
        let mut state = lock(&self.state);
        if let Some(superseded) = state.pending.replace(request) {
            tracing::trace!(motive = ?superseded.motive, "Superseded queued auto-save");
        }
        if state.running {
            return;
        }
        state.running = true;
        drop(state);

        let saver = Arc::clone(self);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { saver.run_async().await });
            return;
        }

        let spawned = std::thread::Builder::new()
            .name("dynattr-autosave".to_string())
            .spawn(move || saver.run_blocking());
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Failed to start auto-save thread; dropping queued save");
            let mut state = lock(&self.state);
            state.pending = None;
            state.running = false;
            drop(state);
            self.idle.notify_waiters();
        }
    }

    /// Take the next request, or mark the worker idle if there is none.
    fn next(&self) -> Option<SaveRequest> {
        let mut state = lock(&self.state);
        let next = state.pending.take();
        if next.is_none() {
            state.running = false;
            drop(state);
            self.idle.notify_waiters();
        }
        next
    }

    async fn run_async(&self) {
        while let Some(request) = self.next() {
            let result = request
                .storage
                .save_async(&request.map, request.motive)
                .await;
            log_outcome(&request, result);
        }
    }

    fn run_blocking(&self) {
        while let Some(request) = self.next() {
            let result = request.storage.save(&request.map, request.motive);
            log_outcome(&request, result);
        }
    }

    fn is_idle(&self) -> bool {
        let state = lock(&self.state);
        !state.running && state.pending.is_none()
    }

    /// Resolves once nothing is queued or being written.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a notification between the check and the await
            // isn't lost.
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

fn log_outcome(request: &SaveRequest, result: crate::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(
            motive = ?request.motive,
            location = %request.storage.location(),
            keys = request.map.len(),
            "Auto-save completed"
        ),
        Err(e) => tracing::warn!(
            motive = ?request.motive,
            location = %request.storage.location(),
            error = %e,
            "Auto-save failed"
        ),
    }
}
