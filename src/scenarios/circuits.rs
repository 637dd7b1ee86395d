//! Stromkreis positions table: measurement inputs are editable.

use std::path::Path;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;
use crate::wait::WaitCondition;

use super::report_check;

const RISO_OHNE: &str = r#"input[data-field="position.messwerte.risoOhne"]"#;
const RISO_MIT: &str = r#"input[data-field="position.messwerte.risoMit"]"#;
const KABEL_TYP: &str = r#"input[data-field="position.kabel.typ"]"#;

pub async fn run(config: HarnessConfig, out_dir: &Path) -> Result<(), HarnessError> {
    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .with_failure_capture(out.join("error.png"))
        .run("circuits", move |session| async move {
            session.goto("test-editable-stromkreise.html").await?;
            session.wait_present(".positions-table").await?;

            // The page script adds rows about 500 ms after load.
            session
                .wait_present_for("tr.position-row", Duration::from_secs(10))
                .await?;

            let riso_ohne_visible = session.check(&WaitCondition::visible(RISO_OHNE)).await?;
            report_check("riso-ohne input visible", riso_ohne_visible);
            if riso_ohne_visible {
                session.fill(RISO_OHNE, "123").await?;
            }

            let riso_mit_visible = session.check(&WaitCondition::visible(RISO_MIT)).await?;
            report_check("riso-mit input visible", riso_mit_visible);

            let kabel_visible = session.check(&WaitCondition::visible(KABEL_TYP)).await?;
            report_check("kabel-typ input visible", kabel_visible);
            if kabel_visible {
                session.fill(KABEL_TYP, "NYM-Test").await?;
            }

            session.capture_page(out.join("verification.png")).await
        })
        .await
}
