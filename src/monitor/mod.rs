//! Background refresh engine. Each monitored view runs one refresh loop on
//! its own timer and publishes ordered snapshots through a single-slot
//! channel; the [`MonitorHandle`] is how the owning view steers the loop
//! (viewport, filter) and shuts it down deterministically.

pub mod groups;
pub mod metrics;
pub mod policy;
pub(crate) mod sample;
pub mod topics;
pub mod view;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::models::{Entity, EntityCache};
use view::{matches_filter, ViewControls};

pub use groups::GroupMonitor;
pub use topics::TopicMonitor;
pub use view::Viewport;

/// State a refresh loop shares with its handle. The loop is the only
/// writer of `state`; the handle reads it for on-demand snapshots, so both
/// sides go through the mutex.
pub(crate) struct SharedView<T> {
    pub(crate) controls: Mutex<ViewControls>,
    pub(crate) state: Mutex<ViewState<T>>,
}

impl<T> SharedView<T>
where
    T: Entity + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            controls: Mutex::new(ViewControls::default()),
            state: Mutex::new(ViewState {
                cache: EntityCache::new(),
                surfaced: Vec::new(),
            }),
        }
    }
}

pub(crate) struct ViewState<T> {
    pub(crate) cache: EntityCache<T>,
    /// Names the last completed cycle decided to surface, in display order.
    /// Cached entries outside this list (deleted topics, unsubscribed
    /// groups) stay in the cache but are not published.
    pub(crate) surfaced: Vec<String>,
}

impl<T> ViewState<T>
where
    T: Entity + Clone,
{
    /// Surfaced entries passing the filter, in name order.
    pub(crate) fn snapshot(&self, filter: &str) -> Vec<T> {
        self.surfaced
            .iter()
            .filter(|name| matches_filter(name, filter))
            .filter_map(|name| self.cache.get(name).cloned())
            .collect()
    }
}

/// Owning handle for one refresh loop. Dropping it without calling
/// [`stop`](MonitorHandle::stop) leaves the task running until its snapshot
/// consumer goes away, so views should stop explicitly on close.
pub struct MonitorHandle<T> {
    pub(crate) label: &'static str,
    pub(crate) shared: Arc<SharedView<T>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl<T> MonitorHandle<T>
where
    T: Entity + Clone,
{
    /// Updates the visible row range the fetch policy works from. `None`
    /// marks the view unmeasured, so only never-fetched entities refresh.
    pub fn set_viewport(&self, viewport: Option<Viewport>) {
        self.shared.controls.lock().viewport = viewport;
    }

    pub fn set_filter(&self, filter: impl Into<String>) {
        self.shared.controls.lock().filter = filter.into();
    }

    /// Recomputes the published view right now, with the current filter,
    /// without waiting for the next cycle. Used by filter-change handlers.
    pub fn filtered_snapshot(&self) -> Vec<T> {
        let filter = self.shared.controls.lock().filter.clone();
        self.shared.state.lock().snapshot(&filter)
    }

    /// Cancels the refresh loop and waits for it to acknowledge, so no
    /// task outlives the view that started it.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!("[{}] refresh task ended abnormally: {err}", self.label);
        }
    }
}
