//! deepguard-sim: drive the simulated analysis pipelines from the command line.
//!
//! Each subcommand runs one scenario to completion on real timers and
//! prints the resulting snapshots and summaries as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepguard_pipeline::defaults::REPORT_EXPORT_FILENAME;
use deepguard_pipeline::{
    summarize_reports, summarize_sessions, write_csv, AlertMonitor, EventBus, MediaFile,
    MediaPipeline, MediaType, MediaVerdict, PipelineConfig, RandomOutcomes, ReportFilter,
    ReportSource, SandboxBrowser,
};

/// Slack added after the last scheduled delay before reading results.
const SETTLE: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "deepguard-sim")]
#[command(author, version, about = "Run DeepGuard analysis simulations")]
#[command(propagate_version = true)]
struct Cli {
    /// Divide every configured delay by this factor
    #[arg(long, global = true, default_value_t = 1.0)]
    speed: f64,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Also write logs to this file (daily rotation)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify media files, given as NAME:MIME:BYTES
    Media {
        #[arg(required = true, num_args = 1.., value_parser = parse_media_file)]
        files: Vec<MediaFile>,
    },

    /// Open URLs in the sandbox, then close every session that loaded
    Browse {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Run live monitoring for a number of ticker intervals
    Monitor {
        #[arg(short, long, default_value_t = 3)]
        ticks: u32,
    },

    /// Verify media files, then export the filtered report log as CSV
    Export {
        #[arg(required = true, num_args = 1.., value_parser = parse_media_file)]
        files: Vec<MediaFile>,

        /// Output CSV path
        #[arg(short, long, default_value = REPORT_EXPORT_FILENAME)]
        output: PathBuf,

        /// Case-insensitive filename substring
        #[arg(long)]
        search: Option<String>,

        /// video, image or audio
        #[arg(long = "type", value_parser = parse_media_type)]
        media_type: Option<MediaType>,

        /// real or fake
        #[arg(long, value_parser = parse_verdict)]
        verdict: Option<MediaVerdict>,

        /// upload or browser
        #[arg(long, value_parser = parse_source)]
        source: Option<ReportSource>,
    },
}

fn parse_media_file(s: &str) -> Result<MediaFile, String> {
    let mut parts = s.rsplitn(3, ':');
    let (Some(bytes), Some(mime), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected NAME:MIME:BYTES, got '{s}'"));
    };
    let size_bytes = bytes
        .parse::<u64>()
        .map_err(|e| format!("invalid byte size '{bytes}': {e}"))?;
    Ok(MediaFile::new(name, size_bytes, mime))
}

fn parse_media_type(s: &str) -> Result<MediaType, String> {
    MediaType::parse(s).ok_or_else(|| format!("unknown media type '{s}'"))
}

fn parse_verdict(s: &str) -> Result<MediaVerdict, String> {
    MediaVerdict::parse(s).ok_or_else(|| format!("unknown verdict '{s}'"))
}

fn parse_source(s: &str) -> Result<ReportSource, String> {
    ReportSource::parse(s).ok_or_else(|| format!("unknown source '{s}'"))
}

fn init_tracing(format: LogFormat, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "deepguard_core=info,deepguard_pipeline=info,deepguard_sim=info".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(path) = log_file {
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("deepguard-sim.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        match format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init(),
            LogFormat::Text => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init(),
        }
        Some(guard)
    } else {
        // Logs go to stderr so stdout stays machine-readable JSON.
        match format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init(),
            LogFormat::Text => registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init(),
        }
        None
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _file_guard = init_tracing(cli.log_format, cli.log_file.as_deref());

    let config = PipelineConfig::from_env().scaled(cli.speed);
    config.validate().context("invalid configuration")?;
    info!(speed = cli.speed, "Simulation configured");

    match cli.command {
        Commands::Media { files } => cmd_media(config, &files).await,
        Commands::Browse { urls } => cmd_browse(config, &urls).await,
        Commands::Monitor { ticks } => cmd_monitor(config, ticks).await,
        Commands::Export {
            files,
            output,
            search,
            media_type,
            verdict,
            source,
        } => {
            let filter = ReportFilter {
                search,
                media_type,
                verdict,
                source,
            };
            cmd_export(config, &files, &output, &filter).await
        }
    }
}

/// Mirror every pipeline event into the debug log.
fn log_events(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => match envelope.to_json() {
                    Ok(json) => debug!(event = %json, "Pipeline event"),
                    Err(e) => warn!(error = %e, "Failed to serialize pipeline event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event log lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn event_bus() -> EventBus {
    let events = EventBus::default();
    log_events(&events);
    events
}

async fn run_media(config: &PipelineConfig, files: &[MediaFile]) -> MediaPipeline {
    let pipeline = MediaPipeline::new(config.clone(), RandomOutcomes::shared(), event_bus());
    pipeline.submit(files);
    sleep(config.media_analyze_delay() + config.media_complete_delay() + SETTLE).await;
    pipeline
}

async fn cmd_media(config: PipelineConfig, files: &[MediaFile]) -> anyhow::Result<()> {
    let pipeline = run_media(&config, files).await;
    print_json(&serde_json::json!({
        "items": pipeline.snapshot(),
        "summary": pipeline.summary(),
    }))
}

async fn cmd_browse(config: PipelineConfig, urls: &[String]) -> anyhow::Result<()> {
    print_json(&run_browse(&config, urls).await?)
}

/// Open, load, close, then wait out the linger. The summary describes the
/// closed sessions; by the time the linger ends they are gone.
async fn run_browse(
    config: &PipelineConfig,
    urls: &[String],
) -> anyhow::Result<serde_json::Value> {
    let browser = SandboxBrowser::new(config.clone(), RandomOutcomes::shared(), event_bus());
    let ids: Vec<_> = urls.iter().filter_map(|url| browser.open(url)).collect();
    if ids.is_empty() {
        return Err(anyhow!("no non-blank URLs given"));
    }
    sleep(config.session_load_delay() + SETTLE).await;
    let loaded = browser.snapshot();

    for id in &ids {
        browser.close(*id);
    }
    let closed = browser.snapshot();
    let summary = summarize_sessions(&closed);

    sleep(config.session_linger() + SETTLE).await;
    Ok(serde_json::json!({
        "loaded": loaded,
        "closed": closed,
        "summary": summary,
        "remaining_after_linger": browser.snapshot().len(),
    }))
}

async fn cmd_monitor(config: PipelineConfig, ticks: u32) -> anyhow::Result<()> {
    let monitor = AlertMonitor::new(config.clone(), RandomOutcomes::shared(), event_bus());
    monitor.start();
    sleep(config.alert_interval() * ticks + SETTLE).await;
    monitor.stop();
    print_json(&serde_json::json!({
        "alerts": monitor.snapshot(),
        "summary": monitor.summary(),
    }))
}

async fn cmd_export(
    config: PipelineConfig,
    files: &[MediaFile],
    output: &Path,
    filter: &ReportFilter,
) -> anyhow::Result<()> {
    let pipeline = run_media(&config, files).await;
    let records = pipeline.reports();
    let rows = write_csv(output, &records, filter)
        .with_context(|| format!("failed to write {}", output.display()))?;
    print_json(&serde_json::json!({
        "output": output.display().to_string(),
        "rows": rows,
        "filter": filter,
        "summary": summarize_reports(&records, filter),
    }))
}
