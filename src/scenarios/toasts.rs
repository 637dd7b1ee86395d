//! Toast notifications: error and success alerts render with their
//! severity classes.

use std::path::Path;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::script::ScenarioRunner;

/// Triggers one error and one success alert through the app's own handler
/// module. The exports are named, hence the dynamic import.
const INJECT_TOASTS: &str = r#"
    import('./js/handlers.js').then(module => {
        module.showErrorAlert('Test Error', 'This is a test error message');
        setTimeout(() => {
            module.showSuccessAlert('Test Success', 'This is a test success message');
        }, 500);
    });
"#;

pub async fn run(config: HarnessConfig, out_dir: &Path) -> Result<(), HarnessError> {
    let out = out_dir.to_path_buf();
    ScenarioRunner::new(config)
        .run("toasts", move |session| async move {
            session.goto("index.html").await?;
            session.wait_network_idle().await?;

            session.evaluate(INJECT_TOASTS).await?;

            session.wait_visible(".toast--error").await?;
            session.wait_visible(".toast--success").await?;

            session
                .capture_page(out.join("verification_toast.png"))
                .await
        })
        .await
}
