//! Settings view: switching to server-sync mode reveals the API config.

use std::path::Path;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;

pub async fn run(config: HarnessConfig, out_dir: &Path) -> Result<(), HarnessError> {
    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .run("settings", move |session| async move {
            session.goto("index.html").await?;
            session.click("a[href='#settings']").await?;

            // The mode option is a nested label without a stable selector.
            session.click_text("Mit Server synchronisieren").await?;

            session.wait_visible("#api-config-section").await?;
            session.wait_visible("#api-base-url").await?;

            session.capture_page(out.join("settings.png")).await
        })
        .await
}
