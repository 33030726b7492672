//! snapkeep server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), connects to
//! the configured relation-tuple backend, and serves the JSON API under
//! `/api` until Ctrl-C.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use snapkeep_core::{
  RelationshipMapper, memory::MemoryTupleStore, store::TupleStore,
};
use snapkeep_keto::KetoConnector;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{Backend, ServerConfig};

#[derive(Parser)]
#[command(author, version, about = "snapkeep relationship server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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
  let cfg = ServerConfig::load(cli.config)?;

  match cfg.backend {
    Backend::Keto => {
      let keto = cfg.keto();
      let store = KetoConnector::connect(&keto).await.with_context(|| {
        format!(
          "failed to connect to keto (write {}, read {})",
          keto.write_url, keto.read_url
        )
      })?;
      serve(&cfg, store).await
    }
    Backend::Memory => {
      tracing::warn!("using in-memory tuple store; tuples are lost on exit");
      serve(&cfg, MemoryTupleStore::new()).await
    }
  }
}

async fn serve<S>(cfg: &ServerConfig, store: S) -> anyhow::Result<()>
where
  S: TupleStore + 'static,
{
  let mapper = Arc::new(RelationshipMapper::new(store));
  let app = Router::new()
    .nest("/api", snapkeep_api::api_router(mapper.clone()))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let served = axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error");

  mapper.close();
  served
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
