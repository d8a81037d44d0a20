//! Terminal front-end for the EmComm Tools host.
//!
//! Spawns the host process, speaks newline-delimited JSON over its stdio,
//! and drives the launcher screen from line commands typed on stdin.
//!
//! Diagnostics go to stderr (and optionally a log file) so stdout stays a
//! clean screen.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use et_launcher::bridge::stdio::StdioBridge;
use et_launcher::{Frontend, LauncherConfig, UiVariant, logging, terminal};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Inline,
    Dialog,
}

impl From<VariantArg> for UiVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Inline => Self::Inline,
            VariantArg::Dialog => Self::Dialog,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "et-launcher", version, about = "EmComm Tools launcher front-end")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long, env = "ET_LAUNCHER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the screen layout.
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Override the host command.
    #[arg(long)]
    host: Option<String>,

    /// Re-read mode and radio every N seconds.
    #[arg(long, value_name = "SECS")]
    poll: Option<u64>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        LauncherConfig::load_or_default(cli.config.as_deref()).context("loading config")?;
    if let Some(variant) = cli.variant {
        config.variant = variant.into();
    }
    if let Some(host) = cli.host {
        config.host.command = host;
    }
    if cli.poll.is_some() {
        config.status.poll_interval_secs = cli.poll;
    }
    config.validate().context("invalid configuration")?;

    if cli.init_config {
        let path = cli
            .config
            .unwrap_or_else(LauncherConfig::default_config_path);
        config
            .save_to_file(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let _log_guard = logging::init(&config.logging).context("initialising logging")?;
    tracing::info!(variant = ?config.variant, host = %config.host.command, "et-launcher starting");

    let (bridge, mut child) = StdioBridge::spawn_host(&config.host)
        .with_context(|| format!("starting host `{}`", config.host.command))?;

    let mut frontend = Frontend::new(config, Arc::new(bridge));
    frontend.start();

    let outcome = terminal::run(
        &frontend,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    frontend.shutdown().await;
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "host already exited");
    }
    let _ = child.wait().await;

    outcome.map_err(|e| {
        tracing::error!(error = %e, "terminal loop failed");
        anyhow::anyhow!("et-launcher failed: {e}")
    })?;
    tracing::info!("et-launcher shut down cleanly");
    Ok(())
}
