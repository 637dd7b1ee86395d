//! Passive diagnostic channel: console messages and uncaught page errors.
//!
//! Events are appended by the driver's listener tasks while the main step
//! sequence is suspended; the script merges the two streams only at the
//! inspection points it chooses (`snapshot`, `drain`). The log is append-only
//! and events are never mutated after recording.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Where a diagnostic event originated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DiagnosticSource {
    Console,
    PageError,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One recorded console message or uncaught page error.
#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticEvent {
    pub source: DiagnosticSource,
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Utc>,
}

type Observer = Box<dyn Fn(&DiagnosticEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    events: Mutex<Vec<DiagnosticEvent>>,
    console_observers: Mutex<Vec<Observer>>,
    error_observers: Mutex<Vec<Observer>>,
}

/// Append-only per-session diagnostic log with passive observers.
///
/// Cheap to clone; all clones share the same log.
#[derive(Clone, Default)]
pub struct DiagnosticLog {
    inner: Arc<Inner>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a passive observer for console events. Invoked as events
    /// arrive, out of band with the main step sequence.
    pub fn on_console(&self, callback: impl Fn(&DiagnosticEvent) + Send + Sync + 'static) {
        if let Ok(mut observers) = self.inner.console_observers.lock() {
            observers.push(Box::new(callback));
        }
    }

    /// Register a passive observer for uncaught page errors.
    pub fn on_page_error(&self, callback: impl Fn(&DiagnosticEvent) + Send + Sync + 'static) {
        if let Ok(mut observers) = self.inner.error_observers.lock() {
            observers.push(Box::new(callback));
        }
    }

    /// Append an event, then notify observers; by the time a callback runs
    /// the event is already readable through `snapshot`. A panicking
    /// observer is isolated here so it can never abort the scenario.
    pub fn record(&self, source: DiagnosticSource, severity: Severity, message: impl Into<String>) {
        let event = DiagnosticEvent {
            source,
            severity,
            message: message.into(),
            at: Utc::now(),
        };

        if let Ok(mut events) = self.inner.events.lock() {
            events.push(event.clone());
        }

        let observers = match source {
            DiagnosticSource::Console => &self.inner.console_observers,
            DiagnosticSource::PageError => &self.inner.error_observers,
        };
        if let Ok(observers) = observers.lock() {
            for observer in observers.iter() {
                if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                    warn!(target: "uiprobe::diagnostics", "diagnostic observer panicked");
                }
            }
        }
    }

    /// Return and clear the ordered event log.
    pub fn drain(&self) -> Vec<DiagnosticEvent> {
        self.inner
            .events
            .lock()
            .map(|mut events| events.drain(..).collect())
            .unwrap_or_default()
    }

    /// Read the log at a point in time without clearing it.
    pub fn snapshot(&self) -> Vec<DiagnosticEvent> {
        self.inner
            .events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of uncaught page errors seen so far. Supports assertions of
    /// the form "no page error occurred".
    pub fn page_error_count(&self) -> usize {
        self.inner
            .events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.source == DiagnosticSource::PageError)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn events_are_recorded_in_order() {
        let log = DiagnosticLog::new();
        log.record(DiagnosticSource::Console, Severity::Info, "first");
        log.record(DiagnosticSource::PageError, Severity::Error, "second");
        log.record(DiagnosticSource::Console, Severity::Warning, "third");

        let events = log.snapshot();
        let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(log.page_error_count(), 1);
    }

    #[test]
    fn drain_clears_the_log() {
        let log = DiagnosticLog::new();
        log.record(DiagnosticSource::Console, Severity::Info, "once");
        assert_eq!(log.drain().len(), 1);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn observers_see_only_their_source() {
        let log = DiagnosticLog::new();
        let console_seen = Arc::new(AtomicUsize::new(0));
        let errors_seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&console_seen);
        log.on_console(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&errors_seen);
        log.on_page_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        log.record(DiagnosticSource::Console, Severity::Info, "log line");
        log.record(DiagnosticSource::PageError, Severity::Error, "boom");

        assert_eq!(console_seen.load(Ordering::SeqCst), 1);
        assert_eq!(errors_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_sees_the_event_already_in_the_log() {
        let log = DiagnosticLog::new();
        let seen_at_notify = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen_at_notify);
        let reader = log.clone();
        log.on_console(move |_| {
            counter.store(reader.snapshot().len(), Ordering::SeqCst);
        });

        log.record(DiagnosticSource::Console, Severity::Info, "first");
        assert_eq!(seen_at_notify.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_observer_does_not_abort_recording() {
        let log = DiagnosticLog::new();
        log.on_console(|_| panic!("observer bug"));
        log.record(DiagnosticSource::Console, Severity::Info, "still recorded");
        assert_eq!(log.snapshot().len(), 1);
    }
}
