/// Inactive-tab tracking: which tabs lost focus and when
///
/// The tracker is driven by the background process. Browser events and timer
/// ticks call into it one at a time; between them it may only suspend while
/// waiting on the tab or storage APIs. The map is never borrowed across such
/// a wait: each handler reads first, mutates synchronously, then persists a
/// snapshot.

use crate::config::{Threshold, TrackerConfig};
use crate::error::Result;
use crate::storage::{Persistence, Storage};
use crate::tab_data::{TabId, TabInfo, TrackingMap};
use log::{debug, error, info};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// Enumerates every open tab across all windows
#[allow(async_fn_in_trait)]
pub trait TabSource {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>>;
}

/// Wall clock in milliseconds since the Unix epoch
pub trait Clock {
    fn now_ms(&self) -> f64;
}

pub struct Tracker<T, S, C> {
    tabs: T,
    persistence: Persistence<S>,
    clock: C,
    entries: RefCell<TrackingMap>,
    threshold: Cell<Threshold>,
    restored: Cell<bool>,
}

impl<T: TabSource, S: Storage, C: Clock> Tracker<T, S, C> {
    /// A tracker with nothing loaded yet; see [`Tracker::restore`]
    pub fn new(tabs: T, storage: S, clock: C, config: &TrackerConfig) -> Self {
        Tracker {
            tabs,
            persistence: Persistence::new(storage),
            clock,
            entries: RefCell::new(TrackingMap::new()),
            threshold: Cell::new(config.default_threshold),
            restored: Cell::new(false),
        }
    }

    /// Load whatever an earlier run of the background process left in
    /// storage. Runs once; every handler awaits it before touching the map so
    /// events delivered while the service worker wakes up are not lost. A
    /// failed read starts from an empty map.
    pub async fn restore(&self) {
        if self.restored.get() {
            return;
        }

        let loaded = self.persistence.load_state().await;
        // Another handler may have finished restoring while we waited
        if self.restored.replace(true) {
            return;
        }

        match loaded {
            Ok(state) => {
                if let Some(tracking) = state.tracking {
                    info!("Restored inactive tabs data from storage: {} tabs", tracking.len());
                    *self.entries.borrow_mut() = tracking;
                }
                if let Some(threshold) = state.threshold {
                    info!("Restored inactive threshold: {} seconds", threshold.secs());
                    self.threshold.set(threshold);
                }
            }
            Err(e) => error!("Failed to restore state from storage: {}", e),
        }
    }

    /// Snapshot of the tracked entries
    pub fn entries(&self) -> TrackingMap {
        self.entries.borrow().clone()
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold.get()
    }

    /// Adopt a threshold written to storage by someone else (the popup).
    /// Invalid values leave the current threshold in place.
    pub fn apply_threshold_value(&self, value: &Value) -> Result<Threshold> {
        let threshold = Threshold::from_value(value)?;
        self.threshold.set(threshold);
        debug!("Inactive threshold changed to {} seconds", threshold.secs());
        Ok(threshold)
    }

    /// Focus moved to `activated_id`: every other open tab becomes inactive
    /// (keeping an earlier timestamp if it already had one) and the activated
    /// tab stops being tracked.
    pub async fn handle_activated(&self, activated_id: TabId) {
        if let Err(e) = self.try_handle_activated(activated_id).await {
            error!("Failed to handle activation of tab {}: {}", activated_id, e);
        }
    }

    async fn try_handle_activated(&self, activated_id: TabId) -> Result<()> {
        self.restore().await;
        let tabs = self.tabs.query_tabs().await?;
        let now = self.clock.now_ms();

        {
            let mut entries = self.entries.borrow_mut();
            for tab in &tabs {
                if tab.id != activated_id {
                    entries.mark_inactive(tab, now);
                }
            }
            // The activated tab may be missing from the enumeration if it
            // closed in the meantime; clear it regardless.
            entries.remove(activated_id);
        }

        debug!("Tab {} activated, tracking {} inactive tabs", activated_id, self.entries.borrow().len());
        self.persist().await
    }

    /// Tab `tab_id` was closed. Returns true if it was being tracked.
    pub async fn handle_removed(&self, tab_id: TabId) -> bool {
        self.restore().await;
        let removed = self.entries.borrow_mut().remove(tab_id).is_some();
        if removed {
            self.persist_or_log().await;
            info!("Removed closed tab from tracking: {}", tab_id);
        }
        removed
    }

    /// Drop entries for tabs that no longer exist, covering removal events
    /// the background process never saw. Returns how many were dropped.
    pub async fn run_sweep(&self) -> usize {
        match self.try_run_sweep().await {
            Ok(removed) => removed,
            Err(e) => {
                error!("Failed to clean up stale tabs: {}", e);
                0
            }
        }
    }

    async fn try_run_sweep(&self) -> Result<usize> {
        self.restore().await;
        let live_ids: HashSet<TabId> = self.tabs.query_tabs().await?.iter().map(|tab| tab.id).collect();

        let removed = self.entries.borrow_mut().retain_live(&live_ids);
        if removed > 0 {
            self.persist().await?;
            info!("Cleaned up stale tabs: {}", removed);
        }
        Ok(removed)
    }

    /// Re-save the map when any entry has been inactive for at least the
    /// threshold, so storage readers see fresh data. Returns the number of
    /// such entries.
    pub async fn run_threshold_review(&self) -> usize {
        self.restore().await;
        let now = self.clock.now_ms();
        let threshold_ms = self.threshold.get().as_millis();
        let crossed = self.entries.borrow().past_threshold(now, threshold_ms).len();

        if crossed > 0 {
            self.persist_or_log().await;
        }
        crossed
    }

    async fn persist(&self) -> Result<()> {
        let snapshot = self.entries.borrow().clone();
        self.persistence.save_tracking_map(&snapshot).await
    }

    async fn persist_or_log(&self) {
        if let Err(e) = self.persist().await {
            error!("Failed to save inactive tabs data: {}", e);
        }
    }
}
