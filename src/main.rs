//! feedhub binary entrypoint kept minimal. The runtime lives in `app`.

mod app;
mod cache;
mod config;
mod sources;
mod state;
mod util;

use std::fmt;
use std::sync::OnceLock;

use clap::Parser;

/// Aggregates category feeds into cached snapshots with thumbnail
/// enrichment.
#[derive(Parser, Debug)]
#[command(name = "feedhub")]
#[command(version)]
#[command(
    about = "Aggregates category feeds into cached snapshots with thumbnail enrichment",
    long_about = None
)]
struct Args {
    /// Run a single aggregation and warm-up pass, then exit
    #[arg(long)]
    once: bool,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to an alternate configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Override the scheduled refresh interval in minutes
    #[arg(long)]
    refresh_minutes: Option<u64>,
}

/// UTC timestamp formatter for log lines.
struct FeedhubTimer;

impl tracing_subscriber::fmt::time::FormatTime for FeedhubTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        w.write_str(&ts)
    }
}

/// Keeps the non-blocking log writer alive for the process lifetime.
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initialize tracing to `<config>/logs/feedhub.log`, falling back to
/// stderr when the file cannot be opened.
fn init_logging(level: &str) {
    let mut log_path = config::logs_dir();
    log_path.push("feedhub.log");
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()))
    };
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(FeedhubTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_timer(FeedhubTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = config::load(args.config.as_deref());
    if let Some(minutes) = args.refresh_minutes {
        config.refresh_minutes = minutes.max(1);
    }
    tracing::info!(
        categories = config.categories.len(),
        refresh_minutes = config.refresh_minutes,
        once = args.once,
        "feedhub starting"
    );

    if let Err(err) = app::run(config, args.once).await {
        tracing::error!(error = ?err, "runtime error");
    }
    tracing::info!("feedhub exited");
}
