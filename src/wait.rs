//! Deterministic wait engine.
//!
//! Conditions are stateless predicates polled against the live page until
//! they hold or a deadline expires. Selectors are re-evaluated on every
//! probe; nothing is cached between iterations.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::driver::js_string;
use crate::error::HarnessError;
use crate::session::Session;

/// Zero in-flight requests must hold for this long before the page counts
/// as network idle.
const QUIET_WINDOW: Duration = Duration::from_millis(500);

/// A condition the wait engine can poll for.
#[derive(Clone, Debug)]
pub enum WaitCondition {
    /// First match exists, has a non-zero rect and is not hidden by
    /// `display: none` or `visibility: hidden`.
    SelectorVisible(String),
    /// A match exists in the DOM, visible or not.
    SelectorPresent(String),
    /// No in-flight requests for a continuous quiet window.
    NetworkIdle,
    /// Unconditional pause. Target pages animate via CSS transitions that
    /// emit no completion event, so a fixed delay is the only handle.
    Delay(Duration),
}

impl WaitCondition {
    pub fn visible(selector: impl Into<String>) -> Self {
        Self::SelectorVisible(selector.into())
    }

    pub fn present(selector: impl Into<String>) -> Self {
        Self::SelectorPresent(selector.into())
    }

    /// Human-readable description used in timeout errors and logs.
    pub fn describe(&self) -> String {
        match self {
            Self::SelectorVisible(selector) => format!("selector {selector:?} visible"),
            Self::SelectorPresent(selector) => format!("selector {selector:?} present"),
            Self::NetworkIdle => "network idle".to_string(),
            Self::Delay(duration) => format!("delay of {duration:?}"),
        }
    }
}

fn visibility_probe(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const rect = el.getBoundingClientRect();
            if (rect.width === 0 || rect.height === 0) return false;
            const style = window.getComputedStyle(el);
            return style.display !== 'none' && style.visibility !== 'hidden';
        }})()"#,
        sel = js_string(selector)
    )
}

impl Session {
    /// Poll `condition` until it holds or `timeout` expires. Returns the
    /// elapsed time on success; on expiry the error carries the condition
    /// description and an elapsed value of at least `timeout`.
    pub async fn wait(
        &self,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Duration, HarnessError> {
        self.ensure_open()?;

        if let WaitCondition::Delay(duration) = condition {
            tokio::time::sleep(duration).await;
            return Ok(duration);
        }

        let started = Instant::now();
        let deadline = started + timeout;
        loop {
            if self.check(&condition).await? {
                let elapsed = started.elapsed();
                debug!(
                    target: "uiprobe::wait",
                    condition = %condition.describe(),
                    ?elapsed,
                    "condition met"
                );
                return Ok(elapsed);
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::Timeout {
                    condition: condition.describe(),
                    elapsed: started.elapsed(),
                });
            }
            tokio::time::sleep(self.config().poll_interval).await;
        }
    }

    /// Probe a condition exactly once. `Delay` trivially holds.
    pub async fn check(&self, condition: &WaitCondition) -> Result<bool, HarnessError> {
        match condition {
            WaitCondition::SelectorVisible(selector) => {
                let value = self.driver()?.evaluate(&visibility_probe(selector)).await?;
                Ok(value.as_bool().unwrap_or(false))
            }
            WaitCondition::SelectorPresent(selector) => {
                Ok(self.driver()?.query_count(selector).await? > 0)
            }
            WaitCondition::NetworkIdle => {
                let snapshot = self.driver()?.network_snapshot().await;
                Ok(snapshot.inflight == 0 && snapshot.idle_for >= QUIET_WINDOW)
            }
            WaitCondition::Delay(_) => Ok(true),
        }
    }

    /// Wait for a selector to become visible within the local UI timeout.
    pub async fn wait_visible(&self, selector: &str) -> Result<Duration, HarnessError> {
        self.wait(WaitCondition::visible(selector), self.config().ui_timeout)
            .await
    }

    pub async fn wait_visible_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Duration, HarnessError> {
        self.wait(WaitCondition::visible(selector), timeout).await
    }

    /// Wait for a selector to exist in the DOM within the local UI timeout.
    pub async fn wait_present(&self, selector: &str) -> Result<Duration, HarnessError> {
        self.wait(WaitCondition::present(selector), self.config().ui_timeout)
            .await
    }

    pub async fn wait_present_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Duration, HarnessError> {
        self.wait(WaitCondition::present(selector), timeout).await
    }

    /// Wait for the network to go quiet, bounded by the navigation timeout.
    pub async fn wait_network_idle(&self) -> Result<Duration, HarnessError> {
        self.wait(WaitCondition::NetworkIdle, self.config().nav_timeout)
            .await
    }

    /// Unconditional pause, e.g. to outlast a CSS transition.
    pub async fn pause(&self, duration: Duration) -> Result<(), HarnessError> {
        self.wait(WaitCondition::Delay(duration), duration).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_name_the_selector() {
        let condition = WaitCondition::visible("#file-drop-zone");
        assert_eq!(condition.describe(), "selector \"#file-drop-zone\" visible");

        let condition = WaitCondition::present(".toast--error");
        assert_eq!(condition.describe(), "selector \".toast--error\" present");

        assert_eq!(WaitCondition::NetworkIdle.describe(), "network idle");
    }

    #[test]
    fn visibility_probe_embeds_the_selector_as_a_literal() {
        let probe = visibility_probe("a[href='#settings']");
        assert!(probe.contains("\"a[href='#settings']\""));
        assert!(probe.contains("getBoundingClientRect"));
        assert!(probe.contains("getComputedStyle"));
    }
}
