// Logging behavior:
// - Writes logs to both stderr and a daily-rotated file at logs/dictate.log.
// - Default log level comes from DictateConfig/`--log-level`; RUST_LOG, if
//   set, always wins.
// - The logs/ directory is created on startup if missing; file output uses
//   a non-blocking writer and disables ANSI to keep it clean for analysis.
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dictate_app::{runtime, shutdown::ShutdownHandler};
use dictate_foundation::config::DictateConfig;

fn init_logging(
    default_level: &str,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "dictate.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let env_filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_writer(non_blocking_file).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

/// Prunes rotated log files in `logs/` older than `retention_days` days.
/// `Some(0)` disables pruning; `None` defaults to 7 days.
fn prune_old_logs(retention_days: Option<u64>) {
    let retention = retention_days.unwrap_or(7);
    if retention == 0 {
        tracing::debug!("log retention disabled (retention_days=0)");
        return;
    }

    let cutoff = match SystemTime::now().checked_sub(Duration::from_secs(retention * 24 * 60 * 60))
    {
        Some(t) => t,
        None => return,
    };

    let logs_dir = Path::new("logs");
    if !logs_dir.exists() {
        return;
    }

    match fs::read_dir(logs_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    if name.starts_with("dictate.log.") {
                        if let Ok(meta) = entry.metadata() {
                            if let Ok(modified) = meta.modified() {
                                if modified < cutoff {
                                    if let Err(e) = fs::remove_file(&path) {
                                        tracing::warn!("failed to remove old log {}: {e}", path.display());
                                    } else {
                                        tracing::info!("removed old log file: {}", path.display());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        Err(e) => tracing::warn!("failed to read logs directory for pruning: {e}"),
    }
}

/// spec §9 CLI surface, overriding `DictateConfig`'s file/env-sourced defaults.
#[derive(Parser, Debug)]
#[command(name = "dictate", author, version, about = "Push-to-talk dictation client")]
struct Cli {
    /// Preferred microphone device name
    #[arg(long)]
    device: Option<String>,

    /// Hotkey binding, e.g. "Ctrl+Shift+Space"
    #[arg(long)]
    hotkey: Option<String>,

    /// Base URL of the transcription service
    #[arg(long = "api-base-url")]
    api_base_url: Option<String>,

    /// Tracing filter, e.g. "info" or "dictate_audio=debug"
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Disable the native overlay even if the `gui` feature is built in
    #[arg(long = "no-gui")]
    no_gui: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DictateConfig::load().unwrap_or_else(|e| {
        eprintln!("failed to load configuration, using defaults: {e}");
        DictateConfig::default()
    });

    let cli = Cli::parse();
    if let Some(device) = cli.device {
        config.device = Some(device);
    }
    if let Some(hotkey) = cli.hotkey {
        config.hotkey = hotkey;
    }
    if let Some(api_base_url) = cli.api_base_url {
        config.api_base_url = api_base_url;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    if cli.no_gui {
        config.gui = false;
    }

    let _log_guard = init_logging(&config.log_level)?;
    let retention_days = std::env::var("DICTATE_LOG_RETENTION_DAYS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());
    prune_old_logs(retention_days);
    tracing::info!("starting dictate");

    let shutdown = ShutdownHandler::new().install().await;
    let app = runtime::start(config).await?;

    let mut stats_interval = tokio::time::interval(Duration::from_secs(30));
    tokio::select! {
        _ = shutdown.wait() => {
            tracing::debug!("shutdown signal received");
        }
        _ = async {
            loop {
                stats_interval.tick().await;
                tracing::info!(
                    transport_partials = app.metrics.transport_partials_received.load(std::sync::atomic::Ordering::Relaxed),
                    transport_finals = app.metrics.transport_finals_received.load(std::sync::atomic::Ordering::Relaxed),
                    injection_failures = app.metrics.injection_failures.load(std::sync::atomic::Ordering::Relaxed),
                    "dictate running"
                );
            }
        } => {}
    }

    tracing::debug!("beginning graceful shutdown");
    app.shutdown().await;
    tracing::debug!("shutdown complete");

    Ok(())
}
