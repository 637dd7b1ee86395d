//! Browser driver seam.
//!
//! [`PageDriver`] is the narrow surface the harness needs from a browser:
//! navigation, in-page evaluation, first-match interactions, screenshots and
//! a network-activity snapshot. [`ChromiumDriver`] implements it over
//! chromiumoxide (one Chromium process, one page per session); tests
//! substitute scripted implementations at this seam.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::HarnessConfig;
use crate::diagnostics::{DiagnosticLog, DiagnosticSource, Severity};
use crate::error::HarnessError;

/// Point-in-time view of the page's network activity.
#[derive(Clone, Copy, Debug)]
pub struct NetworkSnapshot {
    /// Requests sent but not yet finished or failed.
    pub inflight: u64,
    /// Time since the last observed network event.
    pub idle_for: Duration,
}

/// Minimal browser capability surface required by the harness.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), HarnessError>;

    /// Evaluate an expression in the page's execution context. An in-page
    /// throw surfaces as [`HarnessError::Evaluation`].
    async fn evaluate(&self, expression: &str) -> Result<Value, HarnessError>;

    /// Number of elements currently matching `selector`.
    async fn query_count(&self, selector: &str) -> Result<u64, HarnessError>;

    /// Click the first matching element via input emulation.
    async fn click(&self, selector: &str) -> Result<(), HarnessError>;

    /// Replace the first matching element's value with `text`.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), HarnessError>;

    async fn screenshot_page(&self) -> Result<Vec<u8>, HarnessError>;

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>, HarnessError>;

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), HarnessError>;

    async fn network_snapshot(&self) -> NetworkSnapshot;

    /// Tear down the underlying browser. Idempotent.
    async fn close(&self) -> Result<(), HarnessError>;
}

/// Embed a string as a JS literal inside a probe script.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// A selector with no match comes back from chromiumoxide as `NotFound`;
/// keep that distinct from protocol failures.
fn element_error(selector: &str) -> impl FnOnce(CdpError) -> HarnessError + '_ {
    move |err| match err {
        CdpError::NotFound => HarnessError::ElementNotFound {
            selector: selector.to_string(),
        },
        other => HarnessError::driver(other),
    }
}

/// In-flight request tally fed by the passive network listeners.
#[derive(Debug)]
struct NetworkTally {
    inflight: AtomicI64,
    last_activity: StdMutex<Instant>,
}

impl NetworkTally {
    fn new() -> Self {
        Self {
            inflight: AtomicI64::new(0),
            last_activity: StdMutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    fn on_request(&self) {
        self.inflight.fetch_add(1, Ordering::SeqCst);
        self.touch();
    }

    /// Responses can settle for requests sent before the listener attached;
    /// the counter never goes negative.
    fn on_settled(&self) {
        let previous = self.inflight.fetch_sub(1, Ordering::SeqCst);
        if previous <= 0 {
            self.inflight.store(0, Ordering::SeqCst);
        }
        self.touch();
    }

    fn snapshot(&self) -> NetworkSnapshot {
        let inflight = self.inflight.load(Ordering::SeqCst).max(0) as u64;
        let idle_for = self
            .last_activity
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or(Duration::ZERO);
        NetworkSnapshot { inflight, idle_for }
    }
}

/// chromiumoxide-backed driver: one browser process, one page.
pub struct ChromiumDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    tally: Arc<NetworkTally>,
}

impl ChromiumDriver {
    /// Launch a browser process and attach the passive diagnostic and
    /// network listeners. On failure nothing is left behind for the caller
    /// to clean up.
    pub async fn launch(
        config: &HarnessConfig,
        diagnostics: DiagnosticLog,
    ) -> Result<Self, HarnessError> {
        let mut builder = BrowserConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some((width, height)) = config.viewport {
            builder = builder.window_size(width, height);
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(HarnessError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(HarnessError::launch)?;

        // The handler future must be polled for the whole browser lifetime;
        // it multiplexes every CDP message.
        let handler_task = tokio::spawn(async move {
            while let Some(message) = handler.next().await {
                if message.is_err() {
                    break;
                }
            }
        });

        let tally = Arc::new(NetworkTally::new());
        let attach = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(HarnessError::launch)?;
            page.execute(NetworkEnableParams::default())
                .await
                .map_err(HarnessError::launch)?;
            let listeners = spawn_listeners(&page, Arc::clone(&tally), diagnostics).await?;
            Ok::<_, HarnessError>((page, listeners))
        };
        let attached = attach.await;
        let (page, listeners) = match attached {
            Ok(attached) => attached,
            Err(err) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(err);
            }
        };

        let mut tasks = vec![handler_task];
        tasks.extend(listeners);

        debug!(target: "uiprobe::driver", headless = config.headless, "chromium launched");

        Ok(Self {
            page,
            browser: Mutex::new(Some(browser)),
            tasks: Mutex::new(tasks),
            tally,
        })
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> Result<(), HarnessError> {
        self.page.goto(url).await.map_err(HarnessError::driver)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(HarnessError::driver)?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, HarnessError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|err| HarnessError::Evaluation(err.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn query_count(&self, selector: &str) -> Result<u64, HarnessError> {
        let script = format!(
            "document.querySelectorAll({sel}).length",
            sel = js_string(selector)
        );
        let value = self.evaluate(&script).await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    async fn click(&self, selector: &str) -> Result<(), HarnessError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(element_error(selector))?;
        element
            .scroll_into_view()
            .await
            .map_err(HarnessError::driver)?;
        element.click().await.map_err(HarnessError::driver)?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), HarnessError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(element_error(selector))?;
        element.focus().await.map_err(HarnessError::driver)?;
        // Clear any existing value first so fill replaces instead of appends.
        let clear = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (el) {{
                    el.value = '';
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                }}
            }})()"#,
            sel = js_string(selector)
        );
        self.evaluate(&clear).await?;
        element.type_str(text).await.map_err(HarnessError::driver)?;
        Ok(())
    }

    async fn screenshot_page(&self) -> Result<Vec<u8>, HarnessError> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(HarnessError::driver)
    }

    async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>, HarnessError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(element_error(selector))?;
        element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(HarnessError::driver)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), HarnessError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(HarnessError::Driver)?;
        self.page
            .execute(params)
            .await
            .map_err(HarnessError::driver)?;
        Ok(())
    }

    async fn network_snapshot(&self) -> NetworkSnapshot {
        self.tally.snapshot()
    }

    async fn close(&self) -> Result<(), HarnessError> {
        let mut guard = self.browser.lock().await;
        let Some(mut browser) = guard.take() else {
            return Ok(());
        };
        // Close while the handler task is still alive; it carries the
        // Browser.close command to the process.
        let close_result = browser.close().await.map_err(HarnessError::driver);
        let _ = browser.wait().await;
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        close_result.map(|_| ())
    }
}

/// Spawn the passive listener tasks: console messages and uncaught page
/// errors feed the diagnostic log, network events feed the in-flight tally.
async fn spawn_listeners(
    page: &Page,
    tally: Arc<NetworkTally>,
    diagnostics: DiagnosticLog,
) -> Result<Vec<JoinHandle<()>>, HarnessError> {
    let mut tasks = Vec::new();

    let mut console_events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(HarnessError::launch)?;
    let log = diagnostics.clone();
    tasks.push(tokio::spawn(async move {
        while let Some(event) = console_events.next().await {
            let severity = match event.r#type {
                ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => Severity::Error,
                ConsoleApiCalledType::Warning => Severity::Warning,
                _ => Severity::Info,
            };
            let message = event
                .args
                .iter()
                .map(render_remote_object)
                .collect::<Vec<_>>()
                .join(" ");
            log.record(DiagnosticSource::Console, severity, message);
        }
    }));

    let mut exception_events = page
        .event_listener::<EventExceptionThrown>()
        .await
        .map_err(HarnessError::launch)?;
    let log = diagnostics;
    tasks.push(tokio::spawn(async move {
        while let Some(event) = exception_events.next().await {
            let details = &event.exception_details;
            let message = details
                .exception
                .as_ref()
                .and_then(|exception| exception.description.clone())
                .unwrap_or_else(|| details.text.clone());
            log.record(DiagnosticSource::PageError, Severity::Error, message);
        }
    }));

    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(HarnessError::launch)?;
    let counter = Arc::clone(&tally);
    tasks.push(tokio::spawn(async move {
        while let Some(_event) = requests.next().await {
            counter.on_request();
        }
    }));

    let mut finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(HarnessError::launch)?;
    let counter = Arc::clone(&tally);
    tasks.push(tokio::spawn(async move {
        while let Some(_event) = finished.next().await {
            counter.on_settled();
        }
    }));

    let mut failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(HarnessError::launch)?;
    let counter = tally;
    tasks.push(tokio::spawn(async move {
        while let Some(event) = failed.next().await {
            warn!(target: "uiprobe::driver", error = %event.error_text, "request failed");
            counter.on_settled();
        }
    }));

    Ok(tasks)
}

fn render_remote_object(arg: &RemoteObject) -> String {
    match &arg.value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => arg.description.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes_and_backslashes() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn vanished_element_maps_to_element_not_found() {
        let err = element_error("#gone")(CdpError::NotFound);
        assert!(matches!(err, HarnessError::ElementNotFound { selector } if selector == "#gone"));

        let err = element_error("#gone")(CdpError::NoResponse);
        assert!(matches!(err, HarnessError::Driver(_)));
    }

    #[test]
    fn tally_never_reports_negative_inflight() {
        let tally = NetworkTally::new();
        tally.on_settled();
        tally.on_settled();
        assert_eq!(tally.snapshot().inflight, 0);

        tally.on_request();
        tally.on_request();
        tally.on_settled();
        assert_eq!(tally.snapshot().inflight, 1);
    }

    #[test]
    fn tally_idle_time_resets_on_activity() {
        let tally = NetworkTally::new();
        std::thread::sleep(Duration::from_millis(20));
        let before = tally.snapshot().idle_for;
        assert!(before >= Duration::from_millis(20));
        tally.on_request();
        assert!(tally.snapshot().idle_for < before);
    }
}
