//! End-to-end checks against a real Chromium over a local file fixture.
//! Run with `cargo test -- --ignored`; each test skips itself when no
//! Chromium executable can be found.

use std::time::Duration;

use tempfile::tempdir;
use url::Url;

use uiprobe::{detect_chromium_executable, DiagnosticSource, HarnessConfig, Session};

const FIXTURE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>fixture</title></head>
<body>
  <aside class="sidebar"><span id="mode-toggle">Mit Server synchronisieren</span></aside>
  <div id="api-config-section" style="display:none"><input id="api-base-url"></div>
  <div id="file-drop-zone" tabindex="0">Dateien hier ablegen</div>
  <script>
    document.getElementById('mode-toggle').addEventListener('click', () => {
      document.getElementById('api-config-section').style.display = 'block';
    });
    const zone = document.getElementById('file-drop-zone');
    zone.addEventListener('dragenter', () => zone.classList.add('drag-over'));
    console.log('fixture ready');
  </script>
</body>
</html>
"#;

fn headless_config() -> Option<HarnessConfig> {
    let executable = detect_chromium_executable()?;
    Some(HarnessConfig {
        executable: Some(executable),
        headless: true,
        ..HarnessConfig::default()
    })
}

#[tokio::test]
#[ignore]
async fn fixture_round_trip() {
    let Some(config) = headless_config() else {
        eprintln!("no chromium executable found, skipping");
        return;
    };

    let dir = tempdir().unwrap();
    let page_path = dir.path().join("index.html");
    std::fs::write(&page_path, FIXTURE).unwrap();
    let url = Url::from_file_path(&page_path).unwrap();

    let session = Session::launch(config).await.unwrap();

    let outcome = async {
        session.goto(url.as_str()).await?;
        session.wait_visible(".sidebar").await?;

        // Revealing the config section by clicking the label text.
        session.click_text("Mit Server synchronisieren").await?;
        session.wait_visible("#api-config-section").await?;
        session.wait_visible("#api-base-url").await?;
        session.fill("#api-base-url", "http://localhost:9999/api").await?;

        session.dispatch_event("#file-drop-zone", "dragenter").await?;
        let applied = session
            .evaluate(
                "document.getElementById('file-drop-zone').classList.contains('drag-over')",
            )
            .await?;
        assert_eq!(applied.as_bool(), Some(true));

        let value = session
            .evaluate("document.getElementById('api-base-url').value")
            .await?;
        assert_eq!(value.as_str(), Some("http://localhost:9999/api"));

        let shot = dir.path().join("fixture.png");
        session.capture_page(&shot).await?;
        assert!(std::fs::metadata(&shot).unwrap().len() > 0);

        // The fixture logs once at load; give the event a moment to land.
        session.pause(Duration::from_millis(250)).await?;
        Ok::<_, uiprobe::HarnessError>(())
    }
    .await;

    let events = session.drain_events();
    session.close().await;
    outcome.unwrap();

    assert!(events
        .iter()
        .any(|e| e.source == DiagnosticSource::Console && e.message.contains("fixture ready")));
}

#[tokio::test]
#[ignore]
async fn missing_selector_times_out_against_a_real_page() {
    let Some(config) = headless_config() else {
        eprintln!("no chromium executable found, skipping");
        return;
    };

    let dir = tempdir().unwrap();
    let page_path = dir.path().join("index.html");
    std::fs::write(&page_path, FIXTURE).unwrap();
    let url = Url::from_file_path(&page_path).unwrap();

    let session = Session::launch(config).await.unwrap();
    session.goto(url.as_str()).await.unwrap();

    let err = session
        .wait_visible_for("#does-not-exist", Duration::from_millis(400))
        .await
        .unwrap_err();
    session.close().await;

    assert!(err.to_string().contains("#does-not-exist"));
}
