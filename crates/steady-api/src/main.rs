//! steady-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, optionally starts the periodic batch schedule, and serves the
//! HTTP API.
//!
//! Any setting can be overridden from the environment, e.g.
//! `STEADY_PORT=9000` or `STEADY_ENGINE__WORKERS=8`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use steady_api::ServerConfig;
use steady_engine::{Engine, RecomputeRequest};
use steady_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, time::Instant};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Steady personal baseline server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run one batch recomputation, print its summary as JSON, and exit.
  #[arg(long)]
  run_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("STEADY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Engine::new(Arc::new(store), server_cfg.engine.clone())
    .context("invalid [engine] configuration")?;

  // One-shot mode: a single batch run, for cron-style deployments.
  if cli.run_once {
    let summary = engine
      .run(RecomputeRequest::Batch, Utc::now())
      .await
      .context("baseline run failed")?;
    println!("{}", serde_json::to_string(&summary)?);
    return Ok(());
  }

  if let Some(hours) = server_cfg.schedule_interval_hours.filter(|h| *h > 0) {
    spawn_schedule(engine.clone(), Duration::from_secs(hours * 3600));
  }

  let app = steady_api::router(engine);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Run a batch recomputation every `period`, starting one period from now.
fn spawn_schedule(engine: Engine<SqliteStore>, period: Duration) {
  tracing::info!(every_secs = period.as_secs(), "baseline schedule enabled");
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    loop {
      ticker.tick().await;
      if let Err(e) = engine.run(RecomputeRequest::Batch, Utc::now()).await {
        tracing::error!(error = %e, "scheduled baseline run failed");
      }
    }
  });
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
