//! Content-Security-Policy check against a local file: the CDN-loaded XLSX
//! bundle must still come up, and the CSP meta tag must be present.

use std::path::Path;
use std::time::Duration;

use tracing::info;
use url::Url;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;

use super::{log_diagnostics_live, report_check};

pub async fn run(config: HarnessConfig, out_dir: &Path, file: &Path) -> Result<(), HarnessError> {
    let absolute = tokio::fs::canonicalize(file)
        .await
        .map_err(|err| HarnessError::Driver(format!("cannot resolve {}: {err}", file.display())))?;
    let url = Url::from_file_path(&absolute)
        .map_err(|_| HarnessError::Driver(format!("not a file path: {}", absolute.display())))?;

    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .run("csp", move |session| async move {
            log_diagnostics_live(&session);

            info!(target: "uiprobe::scenario", url = %url, "loading");
            session.goto(url.as_str()).await?;

            // Give the CDN scripts time to load; no event fires when a
            // blocked script stays blocked.
            session.pause(Duration::from_secs(3)).await?;

            let xlsx_loaded = session.evaluate("typeof XLSX !== 'undefined'").await?;
            report_check("XLSX bundle loaded", xlsx_loaded.as_bool().unwrap_or(false));

            let meta_count = session
                .evaluate(
                    r#"document.querySelectorAll('meta[http-equiv="Content-Security-Policy"]').length"#,
                )
                .await?;
            info!(
                target: "uiprobe::scenario",
                count = meta_count.as_u64().unwrap_or(0),
                "CSP meta tags"
            );

            session.capture_page(out.join("csp_check.png")).await
        })
        .await
}
