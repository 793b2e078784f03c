//! In-memory stand-ins for the browser APIs, shared by the unit tests.
//!
//! Every fake is a cheap handle over shared state, so a test can keep a
//! clone and adjust the world while the tracker owns the other one.

#![cfg(test)]

use crate::error::{Result, TrackerError};
use crate::storage::Storage;
use crate::tab_data::{TabId, TabInfo};
use crate::tracker::{Clock, TabSource};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<Map<String, Value>>>,
    fail_reads: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.items.borrow_mut().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.items.borrow().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful `set` calls
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        if self.fail_reads.get() {
            return Err(TrackerError::StorageRead("storage unavailable".to_string()));
        }

        let items = self.items.borrow();
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        if self.fail_writes.get() {
            return Err(TrackerError::StorageWrite("quota exceeded".to_string()));
        }

        self.items.borrow_mut().extend(items);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeTabs {
    tabs: Rc<RefCell<Vec<TabInfo>>>,
    fail: Rc<Cell<bool>>,
}

impl FakeTabs {
    /// Tabs with the given ids, titled and addressed after their id
    pub fn with_ids(ids: &[TabId]) -> Self {
        let fake = Self::default();
        for id in ids {
            fake.open(*id);
        }
        fake
    }

    pub fn open(&self, id: TabId) {
        self.tabs.borrow_mut().push(TabInfo::new(
            id,
            format!("Tab {}", id),
            format!("https://example.com/{}", id),
        ));
    }

    pub fn close(&self, id: TabId) {
        self.tabs.borrow_mut().retain(|tab| tab.id != id);
    }

    pub fn fail(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl TabSource for FakeTabs {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>> {
        if self.fail.get() {
            return Err(TrackerError::TabEnumeration("tabs API unavailable".to_string()));
        }
        Ok(self.tabs.borrow().clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<f64>>,
}

impl FakeClock {
    pub fn at(now: f64) -> Self {
        let clock = Self::default();
        clock.now.set(now);
        clock
    }

    pub fn advance_secs(&self, secs: f64) {
        self.now.set(self.now.get() + secs * 1000.0);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
