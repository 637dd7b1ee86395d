//! Workflow view: the file drop zone reacts to drag events and stays
//! keyboard reachable.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;

use super::{log_diagnostics_live, report_check};

const DROP_ZONE: &str = "#file-drop-zone";

pub async fn run(config: HarnessConfig, out_dir: &Path) -> Result<(), HarnessError> {
    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .with_failure_capture(out.join("debug_fail.png"))
        .run("drag-drop", move |session| async move {
            log_diagnostics_live(&session);

            session.goto("index.html").await?;
            session.wait_network_idle().await?;

            session.click("a[href='#workflow']").await?;
            // View switch animates via a CSS transition.
            session.pause(Duration::from_millis(500)).await?;

            session.wait_visible(DROP_ZONE).await?;
            session
                .capture_element(DROP_ZONE, out.join("normal_state.png"))
                .await?;

            // dragenter cannot come from pointer emulation.
            session.dispatch_event(DROP_ZONE, "dragenter").await?;
            session
                .capture_element(DROP_ZONE, out.join("drag_over_state.png"))
                .await?;

            // The handler runs synchronously, so no wait before the check.
            let drag_over = session
                .evaluate(
                    "document.getElementById('file-drop-zone').classList.contains('drag-over')",
                )
                .await?;
            report_check(
                "drop zone applies drag-over class",
                drag_over.as_bool().unwrap_or(false),
            );

            let tab_index = session
                .evaluate("document.getElementById('file-drop-zone').getAttribute('tabindex')")
                .await?;
            info!(target: "uiprobe::scenario", "drop zone tabindex: {tab_index}");

            Ok(())
        })
        .await
}
