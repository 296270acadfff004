//! Main entry point for the Tenderdesk session replay tool.
//!
//! This binary seeds an in-memory backend from a fixture, starts the session
//! reconciler, replays a timed script of auth notifications against it, and
//! prints the resolved session state once the timers have had time to settle.
//! It is the quickest way to reproduce an event ordering reported from the
//! field.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use adapters::MemoryBackend;
use backend::config::Config;
use backend::errors::{AppError, Result};
use backend::script::EventScript;
use backend::SessionReconciler;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tenderdesk-session", about = "Replay auth notifications against the session reconciler")]
struct Args {
    /// JSON fixture with `users` and an optional `live_session`.
    #[arg(long)]
    fixture: PathBuf,

    /// JSON array of `{ "after_ms", "event" }` steps.
    #[arg(long)]
    script: PathBuf,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to wait after the last event before printing the state.
    #[arg(long, default_value_t = 3_000)]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    init_logging(&config.log_filter)?;

    let backend = Arc::new(MemoryBackend::from_reader(open(&args.fixture)?)?);
    let script = EventScript::from_reader(open(&args.script)?)?;
    tracing::info!(steps = script.steps().len(), "loaded event script");

    let reconciler = SessionReconciler::new(config.reconciler.clone(), backend.clone(), backend);
    let mut handle = reconciler.subscribe();
    tokio::spawn(async move {
        while handle.changed().await {
            tracing::info!(state = ?handle.state(), "session state changed");
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    let listener = reconciler.listen(rx);
    reconciler.start();

    script.replay(&tx).await;
    drop(tx);
    if let Err(err) = listener.await {
        tracing::warn!(error = %err, "event listener ended abnormally");
    }
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let state = reconciler.state();
    if !state.is_resolved() {
        tracing::warn!("session still unresolved after settle window");
    }
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| AppError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn init_logging(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|err| AppError::Logging(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))
}
