//! Curio server binary.
//!
//! Loads configuration, opens the SQLite store, seeds configured categories
//! and serves the JSON API under `/api`.
//!
//! # Usage
//!
//! ```text
//! curio-server --config /path/to/config.toml
//! ```
//!
//! Every key can be overridden from the environment with a `CURIO_` prefix
//! and `__` between nested keys, e.g. `CURIO_ANALYSIS__API_KEY`.

mod analysis_http;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use curio_api::{AppState, api_router};
use curio_core::{category::NewCategory, store::CatalogStore};
use curio_pipeline::{AnalysisMerger, ApprovalWorkflow};
use curio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::{
  analysis_http::HttpAnalysisClient,
  config::{ServerConfig, expand_tilde},
};

#[derive(Parser)]
#[command(
  name = "curio-server",
  about = "Curio catalog ingest and approval server"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config).context("failed to load config")?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .context("failed to open store")?;
  info!(path = %store_path.display(), "store opened");

  seed_categories(&store, &cfg).await?;

  let workflow = ApprovalWorkflow::new(Arc::new(store), cfg.approval.policy())
    .with_aliases(cfg.aliases());
  let client = HttpAnalysisClient::new(&cfg.analysis)
    .context("failed to build analysis client")?;
  let merger = AnalysisMerger::new(client).with_timeout(cfg.analysis.timeout());

  let state = AppState {
    workflow: Arc::new(workflow),
    merger:   Arc::new(merger),
    reviewer: Arc::from(cfg.approval.reviewer.as_str()),
  };

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let addr = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&addr)
    .await
    .with_context(|| format!("failed to bind {addr}"))?;
  info!("listening on http://{addr}");

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Create every configured category whose name is not already taken.
async fn seed_categories(
  store: &SqliteStore,
  cfg: &ServerConfig,
) -> Result<()> {
  let existing = store
    .list_categories()
    .await
    .context("failed to list categories")?;

  for seed in &cfg.categories {
    if existing.iter().any(|c| c.name.eq_ignore_ascii_case(&seed.name)) {
      continue;
    }
    let category = store
      .create_category(NewCategory::from(seed.clone()))
      .await
      .with_context(|| format!("failed to seed category {:?}", seed.name))?;
    info!(name = %category.name, slug = %category.slug, "category seeded");
  }
  Ok(())
}
