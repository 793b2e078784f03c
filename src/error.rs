use thiserror::Error;

/// Errors raised while tracking tabs or touching extension storage.
///
/// All variants except `InvalidThreshold` are transient: callers log them and
/// let the next event or timer tick try again.
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("Failed to read storage: {0}")]
    StorageRead(String),

    #[error("Failed to write storage: {0}")]
    StorageWrite(String),

    #[error("Failed to enumerate tabs: {0}")]
    TabEnumeration(String),

    #[error("Browser API call failed: {0}")]
    BrowserApi(String),

    #[error("Threshold must be a positive number, got {0}")]
    InvalidThreshold(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
