/// Tracker configuration and the user-facing inactivity threshold
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage key holding the serialized `TrackingMap`
pub const INACTIVE_TABS_KEY: &str = "inactiveTabsData";

/// Storage key holding the threshold in seconds
pub const THRESHOLD_KEY: &str = "inactiveThreshold";

pub const DEFAULT_THRESHOLD_SECS: f64 = 10.0;

/// Timer periods for the background process
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// How often tracked entries are reconciled against the live tab list
    pub sweep_interval_ms: i32,
    /// How often entries are checked against the threshold
    pub review_interval_ms: i32,
    pub default_threshold: Threshold,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 5 * 60 * 1000,
            review_interval_ms: 1000,
            default_threshold: Threshold::default(),
        }
    }
}

/// Seconds a tab must stay inactive before the popup lists it.
///
/// Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(secs: f64) -> Result<Threshold> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(TrackerError::InvalidThreshold(secs.to_string()));
        }
        Ok(Threshold(secs))
    }

    /// Parse a threshold from an untyped value, as written by the popup or
    /// found in storage. Numeric strings are not accepted.
    pub fn from_value(value: &Value) -> Result<Threshold> {
        match value.as_f64() {
            Some(secs) => Threshold::new(secs),
            None => Err(TrackerError::InvalidThreshold(value.to_string())),
        }
    }

    pub fn secs(self) -> f64 {
        self.0
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(DEFAULT_THRESHOLD_SECS)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = TrackerError;

    fn try_from(secs: f64) -> Result<Self> {
        Threshold::new(secs)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> f64 {
        threshold.0
    }
}
