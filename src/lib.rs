//! Scripted UI verification harness.
//!
//! Drives a real Chromium through the DevTools protocol to verify that a
//! web application's UI behaves as scripted: navigate, wait for conditions,
//! interact, and capture screenshot evidence. Console output and uncaught
//! page errors are collected passively for diagnosis.
//!
//! The engine is deliberately small and strictly sequential: one browser
//! process per [`Session`], one step at a time, every failure carried as a
//! [`HarnessError`].
//!
//! ```no_run
//! use uiprobe::{HarnessConfig, ScenarioRunner};
//!
//! # async fn demo() -> Result<(), uiprobe::HarnessError> {
//! ScenarioRunner::new(HarnessConfig::default())
//!     .run("smoke", |session| async move {
//!         session.goto("index.html").await?;
//!         session.wait_visible(".sidebar").await?;
//!         session.capture_page("verification/smoke.png").await
//!     })
//!     .await
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod interact;
pub mod scenarios;
pub mod script;
pub mod session;
pub mod wait;

pub use config::{detect_chromium_executable, HarnessConfig};
pub use diagnostics::{DiagnosticEvent, DiagnosticLog, DiagnosticSource, Severity};
pub use driver::{ChromiumDriver, NetworkSnapshot, PageDriver};
pub use error::HarnessError;
pub use script::ScenarioRunner;
pub use session::Session;
pub use wait::WaitCondition;
