//! Messgeraete view: list renders and the add-device modal opens.

use std::path::Path;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;

pub async fn run(config: HarnessConfig, out_dir: &Path) -> Result<(), HarnessError> {
    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .run("devices", move |session| async move {
            session.goto("index.html").await?;
            session.wait_visible(".sidebar").await?;

            // data-view is stable even when the sidebar is collapsed.
            session.click(r#"a[data-view="messgeraet"]"#).await?;

            // The renderer fills the container asynchronously.
            session
                .wait_present_for(
                    "#messgeraetContainer .messgeraet-module",
                    Duration::from_secs(10),
                )
                .await?;
            session.pause(Duration::from_secs(1)).await?;
            session
                .capture_page(out.join("messgeraet_list.png"))
                .await?;

            session
                .click(r#"button[data-messgeraet-action="add"]"#)
                .await?;
            session
                .wait_present("#messgeraetFormModal.modal.is-open")
                .await?;
            session.pause(Duration::from_millis(500)).await?;
            session.capture_page(out.join("messgeraet_modal.png")).await
        })
        .await
}
