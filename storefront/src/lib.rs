// storefront/src/lib.rs

//! HTTP front end for the emporium store core: accounts and sessions, catalog, cart,
//! checkout and order history under `/api/v1`.

pub mod config;
pub mod errors;
pub mod services;
pub mod state;
pub mod web;

use std::sync::Arc;

use emporium::{MemoryStore, PgStore, Store};
use tracing::{info, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat, StoreBackend};
use crate::errors::{AppError, Result};
use crate::state::AppState;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

/// Opens the configured store, applying migrations when asked to.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
  match config.store_backend {
    StoreBackend::Memory => {
      warn!("Using the in-memory store; data is lost on shutdown.");
      Ok(Arc::new(MemoryStore::new()))
    }
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let store = PgStore::connect(url, config.database_max_connections).await?;
      if config.run_migrations {
        store.migrate().await?;
      }
      Ok(Arc::new(store))
    }
  }
}

/// Builds the shared state and runs the startup chores: manager bootstrap and demo seeding.
pub async fn build_state(config: Arc<AppConfig>) -> Result<AppState> {
  let store = open_store(&config).await?;
  info!(backend = store.backend(), "Store ready.");
  let state = AppState::new(store, config.clone());

  if let Some(bootstrap) = &config.manager {
    state.accounts.ensure_manager(bootstrap).await?;
  }
  if config.seed_db {
    services::seed::seed_demo_catalog(&state.catalog).await?;
  }
  Ok(state)
}
