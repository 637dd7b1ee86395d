//! Harness configuration and Chromium discovery.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use which::which;

use crate::error::HarnessError;

/// Configuration for one verification session.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Origin the scenario's relative targets are resolved against.
    pub base_url: Url,
    /// Initial browser window size; `None` leaves the engine default.
    pub viewport: Option<(u32, u32)>,
    pub headless: bool,
    /// Explicit Chromium executable; `None` lets the backend auto-detect.
    pub executable: Option<PathBuf>,
    /// Timeout for navigation-scale waits (network idle after a goto).
    pub nav_timeout: Duration,
    /// Timeout for local UI waits (element appears after a click).
    pub ui_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/").expect("static url"),
            viewport: None,
            headless: resolve_headless_default(),
            executable: detect_chromium_executable(),
            nav_timeout: Duration::from_secs(30),
            ui_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(75),
        }
    }
}

impl HarnessConfig {
    /// Resolve a scenario target against the base URL. Absolute URLs
    /// (including `file://`) pass through untouched.
    pub fn resolve_url(&self, target: &str) -> Result<Url, HarnessError> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(_) => self
                .base_url
                .join(target)
                .map_err(|err| HarnessError::Driver(format!("invalid target {target:?}: {err}"))),
        }
    }
}

/// UIPROBE_HEADLESS: "0", "false", "no", "off" run a visible browser.
fn resolve_headless_default() -> bool {
    match env::var("UIPROBE_HEADLESS") {
        Ok(value) => {
            let lower = value.to_ascii_lowercase();
            !matches!(lower.as_str(), "0" | "false" | "no" | "off")
        }
        Err(_) => true,
    }
}

/// Locate a Chromium-family executable: the UIPROBE_CHROME override first,
/// then PATH, then well-known install locations.
pub fn detect_chromium_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("UIPROBE_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chromium_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    for candidate in os_specific_chromium_paths() {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

fn chromium_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chromium_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(target_os = "linux")]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn relative_targets_join_the_base_url() {
        let config = HarnessConfig {
            base_url: Url::parse("http://localhost:8080/").unwrap(),
            ..HarnessConfig::default()
        };
        let url = config.resolve_url("index.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn absolute_targets_pass_through() {
        let config = HarnessConfig::default();
        let url = config.resolve_url("file:///tmp/index.html").unwrap();
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn detects_executable_from_env_var() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chromium");
        fs::write(&exe_path, b"").unwrap();
        let original = env::var("UIPROBE_CHROME").ok();
        env::set_var("UIPROBE_CHROME", exe_path.to_string_lossy().to_string());
        let detected = detect_chromium_executable();
        if let Some(value) = original {
            env::set_var("UIPROBE_CHROME", value);
        } else {
            env::remove_var("UIPROBE_CHROME");
        }
        assert_eq!(detected, Some(exe_path));
    }

    #[test]
    fn default_timeouts_follow_the_two_tier_policy() {
        let config = HarnessConfig::default();
        assert_eq!(config.nav_timeout, Duration::from_secs(30));
        assert_eq!(config.ui_timeout, Duration::from_secs(5));
        assert!(config.poll_interval >= Duration::from_millis(50));
        assert!(config.poll_interval <= Duration::from_millis(100));
    }
}
