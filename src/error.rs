use thiserror::Error;

/// Errors raised by browser operations (navigation, element queries, frames)
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Frame not found: {0}")]
    FrameNotFound(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u128 },

    #[error("Page is closed")]
    PageClosed,
}

impl BrowserError {
    /// Shorthand for building a [`BrowserError::Timeout`]
    pub fn timeout(what: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout { what: what.into(), timeout_ms: timeout.as_millis() }
    }

    /// Whether this error is a wait that ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors that abort a harvest run or its export
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Search phase failed: {0}")]
    Bootstrap(#[source] BrowserError),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Admission control closed: {0}")]
    Admission(#[from] tokio::sync::AcquireError),
}

/// Result alias defaulting to [`BrowserError`]
pub type Result<T, E = BrowserError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timeout_message() {
        let err = BrowserError::timeout("tr.trResultsRow", Duration::from_secs(15));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timed out after 15000ms waiting for tr.trResultsRow");
    }

    #[test]
    fn test_bootstrap_wraps_source() {
        let err = HarvestError::Bootstrap(BrowserError::FrameNotFound("idxc_iframe".to_string()));
        assert_eq!(err.to_string(), "Search phase failed: Frame not found: idxc_iframe");
    }
}
