/// Tab Graveyard - Chrome Extension that remembers how long tabs sat unused
/// Built with Rust + WASM + Yew

mod background;
mod browser;
pub mod config;
pub mod error;
pub mod storage;
pub mod tab_data;
pub mod tracker;
pub mod ui;

#[cfg(test)]
mod test_utils;

use browser::ChromeStorage;
use config::TrackerConfig;
use serde::Serialize;
use serde_json::Value;
use storage::Persistence;
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start tracking from the background service worker
#[wasm_bindgen]
pub fn start_background() {
    background::start(TrackerConfig::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

/// The stored tracking map as a plain object keyed by tab id
#[wasm_bindgen(js_name = getInactiveTabsData)]
pub async fn get_inactive_tabs_data() -> Result<JsValue, JsValue> {
    let map = Persistence::new(ChromeStorage).get_inactive_tabs_data().await;
    map.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize tabs: {:?}", e)))
}

/// The stored threshold in seconds
#[wasm_bindgen(js_name = getInactiveThreshold)]
pub async fn get_inactive_threshold() -> f64 {
    Persistence::new(ChromeStorage).get_inactive_threshold().await.secs()
}

/// Store a new threshold; rejects anything but a positive finite number
#[wasm_bindgen(js_name = setInactiveThreshold)]
pub async fn set_inactive_threshold(seconds: JsValue) -> Result<f64, JsValue> {
    let value: Value = serde_wasm_bindgen::from_value(seconds).unwrap_or(Value::Null);

    Persistence::new(ChromeStorage)
        .set_inactive_threshold(&value)
        .await
        .map(|threshold| threshold.secs())
        .map_err(|e| js_sys::TypeError::new(&e.to_string()).into())
}
