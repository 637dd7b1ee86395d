//! Scenario composition.
//!
//! A scenario is a strictly sequential body run between session launch and
//! close. The runner owns the failure policy: at most one best-effort
//! full-page screenshot on error, and a close that is always attempted and
//! never masks the original outcome.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::session::Session;

/// Drives one scenario from launch to close.
pub struct ScenarioRunner {
    config: HarnessConfig,
    failure_capture: Option<PathBuf>,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            failure_capture: None,
        }
    }

    /// Capture a full-page screenshot at `path` if the scenario body fails.
    /// The capture is best effort; its own errors are logged and swallowed.
    pub fn with_failure_capture(mut self, path: impl Into<PathBuf>) -> Self {
        self.failure_capture = Some(path.into());
        self
    }

    /// Launch a session, run `body` against it, and close the session on
    /// every exit path. The body's first failure short-circuits the run.
    pub async fn run<F, Fut>(&self, name: &str, body: F) -> Result<(), HarnessError>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<(), HarnessError>>,
    {
        let session = Session::launch(self.config.clone()).await?;
        self.run_with_session(name, session, body).await
    }

    /// Same as [`run`](Self::run) but over a caller-provided session.
    pub async fn run_with_session<F, Fut>(
        &self,
        name: &str,
        session: Session,
        body: F,
    ) -> Result<(), HarnessError>
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<(), HarnessError>>,
    {
        info!(target: "uiprobe::script", scenario = name, "scenario started");
        let session = Arc::new(session);

        let outcome = body(Arc::clone(&session)).await;

        if let Err(err) = &outcome {
            error!(target: "uiprobe::script", scenario = name, %err, "scenario failed");
            if err.session_usable() {
                self.try_failure_capture(&session).await;
            }
        } else {
            info!(target: "uiprobe::script", scenario = name, "scenario completed");
        }

        session.close().await;
        outcome
    }

    async fn try_failure_capture(&self, session: &Session) {
        let Some(path) = &self.failure_capture else {
            return;
        };
        match session.capture_page(path).await {
            Ok(()) => {
                info!(
                    target: "uiprobe::script",
                    path = %path.display(),
                    "failure screenshot captured"
                );
            }
            Err(err) => {
                warn!(target: "uiprobe::script", %err, "failure screenshot skipped");
            }
        }
    }
}
