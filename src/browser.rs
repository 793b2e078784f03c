/// Bindings to the chrome.* extension APIs
///
/// These are the real implementations of the tracker's `TabSource`,
/// `Storage` and `Clock` seams, plus the event and timer hooks the background
/// process registers.

use crate::error::{self, TrackerError};
use crate::storage::Storage;
use crate::tab_data::{TabId, TabInfo};
use crate::tracker::{Clock, TabSource};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

/// chrome.tabs.TAB_ID_NONE
const TAB_ID_NONE: TabId = -1;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query_info: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_local_get(keys: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_local_set(items: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = getPlatformInfo)]
    async fn runtime_get_platform_info() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onActivated"], js_name = addListener)]
    fn add_activated_listener(callback: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onRemoved"], js_name = addListener)]
    fn add_removed_listener(callback: &Closure<dyn FnMut(TabId)>);

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "onChanged"], js_name = addListener)]
    fn add_storage_changed_listener(callback: &Closure<dyn FnMut(JsValue, String)>);

    #[wasm_bindgen(js_name = setInterval)]
    fn set_interval(handler: &Closure<dyn FnMut()>, timeout_ms: i32) -> JsValue;
}

/// A tab as returned by chrome.tabs.query. Every field is optional there.
#[derive(Debug, Deserialize)]
struct ChromeTab {
    id: Option<TabId>,
    title: Option<String>,
    url: Option<String>,
}

impl ChromeTab {
    fn into_tab_info(self) -> Option<TabInfo> {
        match self.id {
            Some(id) if id != TAB_ID_NONE => Some(TabInfo::new(
                id,
                self.title.unwrap_or_default(),
                self.url.unwrap_or_default(),
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveInfo {
    tab_id: TabId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageChange {
    new_value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

/// chrome.tabs, across all windows
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl TabSource for ChromeTabs {
    async fn query_tabs(&self) -> error::Result<Vec<TabInfo>> {
        let query = js_sys::Object::new();
        let tabs_js = tabs_query(&query)
            .await
            .map_err(|e| TrackerError::TabEnumeration(format!("{:?}", e)))?;

        let tabs: Vec<ChromeTab> = serde_wasm_bindgen::from_value(tabs_js)
            .map_err(|e| TrackerError::TabEnumeration(format!("Failed to parse tabs: {:?}", e)))?;

        Ok(tabs.into_iter().filter_map(ChromeTab::into_tab_info).collect())
    }
}

/// chrome.storage.local
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl Storage for ChromeStorage {
    async fn get(&self, keys: &[&str]) -> error::Result<Map<String, Value>> {
        let keys_js = serde_wasm_bindgen::to_value(keys)
            .map_err(|e| TrackerError::StorageRead(format!("Failed to serialize keys: {:?}", e)))?;

        let items_js = storage_local_get(&keys_js)
            .await
            .map_err(|e| TrackerError::StorageRead(format!("{:?}", e)))?;

        serde_wasm_bindgen::from_value(items_js)
            .map_err(|e| TrackerError::StorageRead(format!("Failed to parse storage: {:?}", e)))
    }

    async fn set(&self, items: Map<String, Value>) -> error::Result<()> {
        // Plain objects, not JS Maps: chrome.storage cannot hold a Map
        let items_js = items
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| TrackerError::StorageWrite(format!("Failed to serialize storage: {:?}", e)))?;

        storage_local_set(&items_js)
            .await
            .map_err(|e| TrackerError::StorageWrite(format!("{:?}", e)))?;

        Ok(())
    }
}

/// `Date.now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

pub async fn get_platform_info() -> error::Result<PlatformInfo> {
    let info_js = runtime_get_platform_info()
        .await
        .map_err(|e| TrackerError::BrowserApi(format!("{:?}", e)))?;

    serde_wasm_bindgen::from_value(info_js)
        .map_err(|e| TrackerError::BrowserApi(format!("Failed to parse platform info: {:?}", e)))
}

/// User agent and language of whichever global scope we run in: the
/// service worker for the background, a window for the popup.
pub fn navigator_info() -> Option<(String, Option<String>)> {
    let global = js_sys::global();

    if let Some(scope) = global.dyn_ref::<web_sys::WorkerGlobalScope>() {
        let navigator = scope.navigator();
        return navigator.user_agent().ok().map(|agent| (agent, navigator.language()));
    }
    if let Some(window) = global.dyn_ref::<web_sys::Window>() {
        let navigator = window.navigator();
        return navigator.user_agent().ok().map(|agent| (agent, navigator.language()));
    }
    None
}

/// Call `handler` with the id of every newly activated tab
pub fn on_tab_activated(mut handler: impl FnMut(TabId) + 'static) {
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |active_info: JsValue| {
        match serde_wasm_bindgen::from_value::<ActiveInfo>(active_info) {
            Ok(info) => handler(info.tab_id),
            Err(e) => error!("Failed to parse activation event: {:?}", e),
        }
    });
    add_activated_listener(&callback);
    // Listeners live as long as the background process
    callback.forget();
}

/// Call `handler` with the id of every closed tab
pub fn on_tab_removed(handler: impl FnMut(TabId) + 'static) {
    let callback = Closure::<dyn FnMut(TabId)>::new(handler);
    add_removed_listener(&callback);
    callback.forget();
}

/// Call `handler` with the new value whenever `key` changes in
/// chrome.storage.local. Removal of the key is not reported.
pub fn on_local_storage_changed(key: &'static str, mut handler: impl FnMut(Value) + 'static) {
    let callback = Closure::<dyn FnMut(JsValue, String)>::new(move |changes: JsValue, area_name: String| {
        if area_name != "local" {
            return;
        }

        let changes: Map<String, Value> = match serde_wasm_bindgen::from_value(changes) {
            Ok(changes) => changes,
            Err(e) => {
                error!("Failed to parse storage changes: {:?}", e);
                return;
            }
        };

        let new_value = changes
            .get(key)
            .and_then(|change| serde_json::from_value::<StorageChange>(change.clone()).ok())
            .and_then(|change| change.new_value);

        if let Some(value) = new_value {
            handler(value);
        }
    });
    add_storage_changed_listener(&callback);
    callback.forget();
}

/// Run `tick` every `period_ms` for the lifetime of the background process
pub fn every(period_ms: i32, tick: impl FnMut() + 'static) {
    let callback = Closure::<dyn FnMut()>::new(tick);
    set_interval(&callback, period_ms);
    callback.forget();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_tab(value: Value) -> Option<TabInfo> {
        serde_json::from_value::<ChromeTab>(value).unwrap().into_tab_info()
    }

    #[test]
    fn test_chrome_tab_conversion() {
        let tab = parse_tab(json!({
            "id": 12,
            "title": "Rust",
            "url": "https://rust-lang.org",
            "pinned": false,
            "windowId": 1
        }));

        assert_eq!(tab, Some(TabInfo::new(12, "Rust".to_string(), "https://rust-lang.org".to_string())));
    }

    #[test]
    fn test_chrome_tab_without_id_is_skipped() {
        assert_eq!(parse_tab(json!({"title": "DevTools"})), None);
        assert_eq!(parse_tab(json!({"id": -1, "title": "Detached"})), None);
    }

    #[test]
    fn test_chrome_tab_missing_title_and_url() {
        let tab = parse_tab(json!({"id": 4})).unwrap();

        assert_eq!(tab.title, "");
        assert_eq!(tab.url, "");
    }

    #[test]
    fn test_storage_change_new_value() {
        let change: StorageChange = serde_json::from_value(json!({"oldValue": 10, "newValue": 25})).unwrap();
        assert_eq!(change.new_value, Some(json!(25)));

        let removed: StorageChange = serde_json::from_value(json!({"oldValue": 10})).unwrap();
        assert_eq!(removed.new_value, None);
    }
}
