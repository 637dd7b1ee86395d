//! Session lifecycle.
//!
//! A [`Session`] owns one exclusive browser execution context for the whole
//! scenario run. It is created by [`Session::launch`], used strictly
//! sequentially, and torn down by [`Session::close`] on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::config::HarnessConfig;
use crate::diagnostics::DiagnosticLog;
use crate::driver::{ChromiumDriver, PageDriver};
use crate::error::HarnessError;

/// One live browser session.
pub struct Session {
    driver: Arc<dyn PageDriver>,
    config: HarnessConfig,
    diagnostics: DiagnosticLog,
    closed: AtomicBool,
}

impl Session {
    /// Launch a browser and attach the diagnostic listeners. On failure no
    /// session handle exists and nothing needs cleaning up.
    pub async fn launch(config: HarnessConfig) -> Result<Self, HarnessError> {
        let diagnostics = DiagnosticLog::new();
        let driver = ChromiumDriver::launch(&config, diagnostics.clone()).await?;
        let session = Self::assemble(Arc::new(driver), config, diagnostics);
        if let Some((width, height)) = session.config.viewport {
            session.set_viewport(width, height).await?;
        }
        info!(target: "uiprobe::session", "session opened");
        Ok(session)
    }

    /// Build a session over an arbitrary driver. Exists for tests that
    /// substitute a scripted [`PageDriver`].
    pub fn with_driver(driver: Arc<dyn PageDriver>, config: HarnessConfig) -> Self {
        Self::assemble(driver, config, DiagnosticLog::new())
    }

    fn assemble(driver: Arc<dyn PageDriver>, config: HarnessConfig, diagnostics: DiagnosticLog) -> Self {
        Self {
            driver,
            config,
            diagnostics,
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    /// Return and clear the ordered diagnostic log.
    pub fn drain_events(&self) -> Vec<crate::diagnostics::DiagnosticEvent> {
        self.diagnostics.drain()
    }

    pub(crate) fn driver(&self) -> Result<&dyn PageDriver, HarnessError> {
        self.ensure_open()?;
        Ok(self.driver.as_ref())
    }

    /// Every operation goes through this gate; a closed session fails
    /// loudly instead of silently doing nothing.
    pub(crate) fn ensure_open(&self) -> Result<(), HarnessError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HarnessError::SessionClosed);
        }
        Ok(())
    }

    /// Navigate to a target resolved against the configured base URL and
    /// wait for the navigation to commit.
    pub async fn goto(&self, target: &str) -> Result<(), HarnessError> {
        let url = self.config.resolve_url(target)?;
        info!(target: "uiprobe::session", url = %url, "navigating");
        self.driver()?.goto(url.as_str()).await
    }

    /// Override the page's device metrics for subsequent captures.
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<(), HarnessError> {
        self.driver()?.set_viewport(width, height).await
    }

    /// Tear down the browser. Idempotent; only the first call does work.
    /// Teardown errors are logged, not raised, so a close on the failure
    /// path can never mask the original error.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = self.driver.close().await {
            error!(target: "uiprobe::session", %err, "browser teardown failed");
        } else {
            info!(target: "uiprobe::session", "session closed");
        }
    }
}
