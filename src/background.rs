/// Background service worker: wires browser events and timers to the tracker

use crate::browser::{self, ChromeStorage, ChromeTabs, SystemClock};
use crate::config::{TrackerConfig, THRESHOLD_KEY};
use crate::tracker::Tracker;
use log::{info, warn};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;

type BackgroundTracker = Tracker<ChromeTabs, ChromeStorage, SystemClock>;

/// Register every listener and timer, then restore persisted state.
///
/// Listeners are added before the first await so the event that woke the
/// service worker is delivered to us; the tracker restores itself before
/// handling it.
pub fn start(config: TrackerConfig) {
    let tracker: Rc<BackgroundTracker> = Rc::new(Tracker::new(ChromeTabs, ChromeStorage, SystemClock, &config));

    {
        let tracker = tracker.clone();
        browser::on_tab_activated(move |tab_id| {
            let tracker = tracker.clone();
            spawn_local(async move { tracker.handle_activated(tab_id).await });
        });
    }

    {
        let tracker = tracker.clone();
        browser::on_tab_removed(move |tab_id| {
            let tracker = tracker.clone();
            spawn_local(async move {
                tracker.handle_removed(tab_id).await;
            });
        });
    }

    {
        let tracker = tracker.clone();
        browser::on_local_storage_changed(THRESHOLD_KEY, move |value| {
            if let Err(e) = tracker.apply_threshold_value(&value) {
                warn!("Ignoring threshold change: {}", e);
            }
        });
    }

    {
        let tracker = tracker.clone();
        browser::every(config.sweep_interval_ms, move || {
            let tracker = tracker.clone();
            spawn_local(async move {
                tracker.run_sweep().await;
            });
        });
    }

    {
        let tracker = tracker.clone();
        browser::every(config.review_interval_ms, move || {
            let tracker = tracker.clone();
            spawn_local(async move {
                tracker.run_threshold_review().await;
            });
        });
    }

    spawn_local(async move {
        tracker.restore().await;
        log_host_info().await;
    });
}

async fn log_host_info() {
    match browser::get_platform_info().await {
        Ok(platform) => info!("Platform info: os={} arch={}", platform.os, platform.arch),
        Err(e) => warn!("{}", e),
    }

    if let Some((user_agent, language)) = browser::navigator_info() {
        info!(
            "Browser info: user_agent={} language={}",
            user_agent,
            language.unwrap_or_else(|| "unknown".to_string())
        );
    }
}
