//! Error types surfaced by the verification harness.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by session, wait, interaction and capture operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The browser process could not be launched or attached to. Fatal; the
    /// scenario aborts before any session handle exists.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A wait condition did not become true before its timeout expired.
    #[error("timed out after {elapsed:?} waiting for {condition}")]
    Timeout {
        condition: String,
        elapsed: Duration,
    },

    /// A selector matched no element at interaction or capture time.
    #[error("no element matches selector {selector:?}")]
    ElementNotFound { selector: String },

    /// An operation was attempted on a session that has already been closed.
    #[error("session is closed")]
    SessionClosed,

    /// An in-page expression threw; the page's message is passed through.
    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    /// Writing a screenshot artifact failed.
    #[error("artifact capture failed: {0}")]
    Capture(String),

    /// The underlying browser driver reported a protocol or I/O failure.
    #[error("driver error: {0}")]
    Driver(String),
}

impl HarnessError {
    pub fn launch(err: impl ToString) -> Self {
        Self::Launch(err.to_string())
    }

    pub fn driver(err: impl ToString) -> Self {
        Self::Driver(err.to_string())
    }

    pub fn capture(err: impl ToString) -> Self {
        Self::Capture(err.to_string())
    }

    /// Whether the scenario runner may still use the session for a
    /// best-effort diagnostic capture after this error.
    pub fn session_usable(&self) -> bool {
        !matches!(self, Self::Launch(_) | Self::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_condition() {
        let err = HarnessError::Timeout {
            condition: "selector \"#messgeraetFormModal.modal.is-open\" present".to_string(),
            elapsed: Duration::from_secs(5),
        };
        let message = err.to_string();
        assert!(message.contains("#messgeraetFormModal.modal.is-open"));
        assert!(message.contains("5s"));
    }

    #[test]
    fn launch_and_closed_errors_leave_no_usable_session() {
        assert!(!HarnessError::Launch("no executable".into()).session_usable());
        assert!(!HarnessError::SessionClosed.session_usable());
        assert!(HarnessError::ElementNotFound {
            selector: "#gone".into()
        }
        .session_usable());
    }
}
