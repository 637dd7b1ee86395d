//! Verification scenarios.
//!
//! Each module drives one scripted check against the application under
//! test. Selectors are the binding contract with that application and are
//! used verbatim. Findings that do not gate the run (class checks,
//! attribute reads, feature probes) are reported through the log; waits and
//! interactions gate it.

use tracing::{info, warn};

use crate::diagnostics::Severity;
use crate::session::Session;

pub mod circuits;
pub mod csp;
pub mod devices;
pub mod drag_drop;
pub mod settings;
pub mod toasts;

/// Forward console and page-error events to the log as they arrive.
pub(crate) fn log_diagnostics_live(session: &Session) {
    session.diagnostics().on_console(|event| {
        match event.severity {
            Severity::Error | Severity::Warning => {
                warn!(target: "uiprobe::page", severity = %event.severity, "console: {}", event.message)
            }
            Severity::Info => {
                info!(target: "uiprobe::page", "console: {}", event.message)
            }
        };
    });
    session.diagnostics().on_page_error(|event| {
        warn!(target: "uiprobe::page", "page error: {}", event.message);
    });
}

/// Report a non-gating finding.
pub(crate) fn report_check(label: &str, ok: bool) {
    if ok {
        info!(target: "uiprobe::scenario", "{label}: ok");
    } else {
        warn!(target: "uiprobe::scenario", "{label}: FAILED");
    }
}
