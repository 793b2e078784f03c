/// Data structures for Tab Graveyard
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Browser-assigned tab identifier. Unique while the tab is open, may be
/// reused after it closes.
pub type TabId = i32;

/// Information about an open browser tab
#[derive(Debug, Clone, PartialEq)]
pub struct TabInfo {
    pub id: TabId,
    pub title: String,
    pub url: String,
}

impl TabInfo {
    pub fn new(id: TabId, title: String, url: String) -> TabInfo {
        TabInfo { id, title, url }
    }
}

/// A tab that lost focus, and when it did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InactiveEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Milliseconds since the Unix epoch
    pub inactive_from: f64,
}

impl InactiveEntry {
    pub fn from_tab(tab: &TabInfo, inactive_from: f64) -> InactiveEntry {
        InactiveEntry {
            title: tab.title.clone(),
            url: tab.url.clone(),
            inactive_from,
        }
    }

    /// Milliseconds this tab has been inactive as of `now`
    pub fn inactive_for(&self, now: f64) -> f64 {
        now - self.inactive_from
    }
}

/// Every currently-inactive tab, keyed by id.
///
/// Serializes as a JSON object with decimal tab ids as keys, which is the
/// layout stored under `inactiveTabsData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingMap {
    entries: BTreeMap<TabId, InactiveEntry>,
}

impl TrackingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, tab_id: TabId) -> Option<&InactiveEntry> {
        self.entries.get(&tab_id)
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.entries.contains_key(&tab_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, &InactiveEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Start tracking `tab` unless it is already tracked. Returns true if an
    /// entry was created; an existing entry keeps its original timestamp.
    pub fn mark_inactive(&mut self, tab: &TabInfo, now: f64) -> bool {
        if self.entries.contains_key(&tab.id) {
            return false;
        }
        self.entries.insert(tab.id, InactiveEntry::from_tab(tab, now));
        true
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<InactiveEntry> {
        self.entries.remove(&tab_id)
    }

    /// Drop every entry whose id is not in `live_ids`. Returns how many were dropped.
    pub fn retain_live(&mut self, live_ids: &HashSet<TabId>) -> usize {
        let original_len = self.entries.len();
        self.entries.retain(|id, _| live_ids.contains(id));
        original_len - self.entries.len()
    }

    /// Entries inactive for at least `threshold_ms`, oldest first
    pub fn past_threshold(&self, now: f64, threshold_ms: f64) -> Vec<(TabId, &InactiveEntry)> {
        let mut stale: Vec<(TabId, &InactiveEntry)> = self
            .iter()
            .filter(|(_, entry)| entry.inactive_for(now) >= threshold_ms)
            .collect();

        stale.sort_by(|a, b| a.1.inactive_from.total_cmp(&b.1.inactive_from).then_with(|| a.0.cmp(&b.0)));
        stale
    }
}

impl FromIterator<(TabId, InactiveEntry)> for TrackingMap {
    fn from_iter<I: IntoIterator<Item = (TabId, InactiveEntry)>>(iter: I) -> Self {
        TrackingMap {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tab(id: TabId, url: &str, title: &str) -> TabInfo {
        TabInfo::new(id, title.to_string(), url.to_string())
    }

    #[test]
    fn test_mark_inactive_keeps_first_timestamp() {
        let mut map = TrackingMap::new();
        let tab = create_test_tab(1, "https://google.com", "Google");

        assert!(map.mark_inactive(&tab, 1000.0));
        assert!(!map.mark_inactive(&tab, 5000.0));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(1).unwrap().inactive_from, 1000.0);
    }

    #[test]
    fn test_retain_live() {
        let mut map = TrackingMap::new();
        map.mark_inactive(&create_test_tab(1, "https://a.com", "A"), 0.0);
        map.mark_inactive(&create_test_tab(2, "https://b.com", "B"), 0.0);
        map.mark_inactive(&create_test_tab(3, "https://c.com", "C"), 0.0);

        let live: HashSet<TabId> = [1, 3, 7].into_iter().collect();
        let removed = map.retain_live(&live);

        assert_eq!(removed, 1);
        assert!(map.contains(1));
        assert!(!map.contains(2));
        assert!(map.contains(3));
    }

    #[test]
    fn test_past_threshold_is_oldest_first() {
        let mut map = TrackingMap::new();
        map.mark_inactive(&create_test_tab(1, "https://a.com", "A"), 5_000.0);
        map.mark_inactive(&create_test_tab(2, "https://b.com", "B"), 1_000.0);
        map.mark_inactive(&create_test_tab(3, "https://c.com", "C"), 9_500.0);

        let stale = map.past_threshold(10_000.0, 1_000.0);
        let ids: Vec<TabId> = stale.iter().map(|(id, _)| *id).collect();

        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_serializes_as_object_keyed_by_tab_id() {
        let mut map = TrackingMap::new();
        map.mark_inactive(&create_test_tab(42, "https://github.com", "GitHub"), 1698508200000.0);

        let value = serde_json::to_value(&map).unwrap();

        assert_eq!(value["42"]["title"], "GitHub");
        assert_eq!(value["42"]["url"], "https://github.com");
        assert_eq!(value["42"]["inactiveFrom"], 1698508200000.0);
    }

    #[test]
    fn test_deserializes_stored_layout() {
        let json = r#"{"7":{"title":"Docs","url":"https://docs.rs","inactiveFrom":1700000000000}}"#;

        let map: TrackingMap = serde_json::from_str(json).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(7).unwrap().title, "Docs");
        assert_eq!(map.get(7).unwrap().inactive_from, 1700000000000.0);
    }

    #[test]
    fn test_entry_without_title_or_url() {
        let entry: InactiveEntry = serde_json::from_str(r#"{"inactiveFrom": 5}"#).unwrap();

        assert_eq!(entry.title, "");
        assert_eq!(entry.url, "");
        assert_eq!(entry.inactive_from, 5.0);
    }
}
