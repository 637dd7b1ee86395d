use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;
use url::Url;

use uiprobe::{scenarios, HarnessConfig};

#[derive(Parser)]
#[command(name = "uiprobe", version, about = "Scripted UI verification against a running app")]
struct Cli {
    /// Origin relative targets are resolved against
    #[arg(long, default_value = "http://localhost:8000/", global = true)]
    base_url: Url,

    /// Directory screenshot artifacts are written to
    #[arg(long, default_value = "verification", global = true)]
    out_dir: PathBuf,

    /// Run with a visible browser window
    #[arg(long, global = true)]
    headful: bool,

    /// Chromium executable; auto-detected when omitted
    #[arg(long, global = true)]
    chrome: Option<PathBuf>,

    /// Timeout for local UI waits, e.g. "5s" or "1500ms"
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    ui_timeout: Option<Duration>,

    /// Timeout for navigation-scale waits
    #[arg(long, value_parser = humantime::parse_duration, global = true)]
    nav_timeout: Option<Duration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settings view reveals API config in server-sync mode
    Settings,
    /// Workflow drop zone reacts to drag events
    DragDrop,
    /// Messgeraete list renders and the add modal opens
    Devices,
    /// Stromkreis position inputs are editable
    Circuits,
    /// CSP check against a local HTML file
    Csp {
        /// HTML file to load via file://
        #[arg(long, default_value = "index.html")]
        file: PathBuf,
    },
    /// Error and success toasts render
    Toasts,
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.base_url = self.base_url.clone();
        if self.headful {
            config.headless = false;
        }
        if let Some(path) = &self.chrome {
            config.executable = Some(path.clone());
        }
        if let Some(timeout) = self.ui_timeout {
            config.ui_timeout = timeout;
        }
        if let Some(timeout) = self.nav_timeout {
            config.nav_timeout = timeout;
        }
        config
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.harness_config();
    let out_dir = &cli.out_dir;

    match &cli.command {
        Command::Settings => scenarios::settings::run(config, out_dir)
            .await
            .context("settings scenario failed"),
        Command::DragDrop => scenarios::drag_drop::run(config, out_dir)
            .await
            .context("drag-drop scenario failed"),
        Command::Devices => scenarios::devices::run(config, out_dir)
            .await
            .context("devices scenario failed"),
        Command::Circuits => scenarios::circuits::run(config, out_dir)
            .await
            .context("circuits scenario failed"),
        Command::Csp { file } => scenarios::csp::run(config, out_dir, file)
            .await
            .context("csp scenario failed"),
        Command::Toasts => scenarios::toasts::run(config, out_dir)
            .await
            .context("toasts scenario failed"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("uiprobe=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "uiprobe", "{err:#}");
            ExitCode::FAILURE
        }
    }
}
