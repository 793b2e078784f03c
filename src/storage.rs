/// Typed access to chrome.storage.local for tracker state and settings

use crate::config::{Threshold, INACTIVE_TABS_KEY, THRESHOLD_KEY};
use crate::error::{Result, TrackerError};
use crate::tab_data::{InactiveEntry, TabId, TrackingMap};
use log::{error, warn};
use serde_json::{Map, Value};

/// Asynchronous key-value store scoped to the extension.
///
/// `get` returns only the keys that exist; `set` merges the given items into
/// the store.
#[allow(async_fn_in_trait)]
pub trait Storage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;
    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// What the background process finds in storage on start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    pub tracking: Option<TrackingMap>,
    pub threshold: Option<Threshold>,
}

/// Reads and writes the two keys the extension owns
pub struct Persistence<S> {
    storage: S,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Persistence { storage }
    }

    /// Load both keys at once. Malformed values are dropped with a warning
    /// so a corrupted entry cannot keep the tracker from starting.
    pub async fn load_state(&self) -> Result<StoredState> {
        let items = self.storage.get(&[INACTIVE_TABS_KEY, THRESHOLD_KEY]).await?;

        let tracking = items.get(INACTIVE_TABS_KEY).and_then(parse_tracking_map);
        let threshold = items.get(THRESHOLD_KEY).and_then(|value| match Threshold::from_value(value) {
            Ok(threshold) => Some(threshold),
            Err(e) => {
                warn!("Ignoring stored threshold: {}", e);
                None
            }
        });

        Ok(StoredState { tracking, threshold })
    }

    pub async fn save_tracking_map(&self, map: &TrackingMap) -> Result<()> {
        let value = serde_json::to_value(map).map_err(|e| TrackerError::StorageWrite(e.to_string()))?;

        let mut items = Map::new();
        items.insert(INACTIVE_TABS_KEY.to_string(), value);
        self.storage.set(items).await
    }

    /// The stored tracking map, or an empty one when it is missing,
    /// malformed or unreadable.
    pub async fn get_inactive_tabs_data(&self) -> TrackingMap {
        match self.storage.get(&[INACTIVE_TABS_KEY]).await {
            Ok(items) => items.get(INACTIVE_TABS_KEY).and_then(parse_tracking_map).unwrap_or_default(),
            Err(e) => {
                error!("Failed to get inactive tabs data: {}", e);
                TrackingMap::new()
            }
        }
    }

    /// The stored threshold, or the default when it is missing, invalid or
    /// unreadable.
    pub async fn get_inactive_threshold(&self) -> Threshold {
        match self.storage.get(&[THRESHOLD_KEY]).await {
            Ok(items) => match items.get(THRESHOLD_KEY) {
                None | Some(Value::Null) => Threshold::default(),
                Some(value) => Threshold::from_value(value).unwrap_or_else(|e| {
                    warn!("Invalid threshold value, using default: {}", e);
                    Threshold::default()
                }),
            },
            Err(e) => {
                error!("Failed to get inactive threshold: {}", e);
                Threshold::default()
            }
        }
    }

    /// Validate `value` and store it as the new threshold. Rejected input
    /// leaves storage untouched.
    pub async fn set_inactive_threshold(&self, value: &Value) -> Result<Threshold> {
        let threshold = Threshold::from_value(value)?;

        let mut items = Map::new();
        items.insert(THRESHOLD_KEY.to_string(), Value::from(threshold.secs()));
        self.storage.set(items).await?;

        Ok(threshold)
    }
}

/// Decode the stored map entry by entry, so one bad record does not cost
/// every other tab its timestamp.
fn parse_tracking_map(value: &Value) -> Option<TrackingMap> {
    let Some(object) = value.as_object() else {
        warn!("Invalid inactive tabs data structure, ignoring it");
        return None;
    };

    let map = object
        .iter()
        .filter_map(|(key, entry)| {
            let Ok(tab_id) = key.parse::<TabId>() else {
                warn!("Skipping stored entry with invalid tab id {:?}", key);
                return None;
            };
            match serde_json::from_value::<InactiveEntry>(entry.clone()) {
                Ok(entry) => Some((tab_id, entry)),
                Err(e) => {
                    warn!("Skipping stored entry for tab {}: {}", tab_id, e);
                    None
                }
            }
        })
        .collect();

    Some(map)
}
