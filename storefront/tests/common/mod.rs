// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use std::sync::Arc;

use actix_web::http::header;
use emporium::MemoryStore;
use emporium_server::config::{AppConfig, ManagerBootstrap, StoreBackend};
use emporium_server::state::AppState;
use serde_json::{json, Value};
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub const MANAGER_PASSWORD: &str = "manager pass";

pub fn test_config() -> AppConfig {
  AppConfig {
    store_backend: StoreBackend::Memory,
    manager: Some(ManagerBootstrap {
      username: "store manager".to_string(),
      email: "manager@example.com".to_string(),
      phone_number: "5550009999".to_string(),
      password: MANAGER_PASSWORD.to_string(),
    }),
    ..AppConfig::default()
  }
}

/// Fresh in-memory state with the manager account already created.
pub async fn test_state() -> AppState {
  setup_tracing();
  let config = Arc::new(test_config());
  let state = AppState::new(Arc::new(MemoryStore::new()), config.clone());
  if let Some(bootstrap) = &config.manager {
    state.accounts.ensure_manager(bootstrap).await.expect("manager bootstrap");
  }
  state
}

/// Initialises the full route table over `state`, the way `main` does minus the middleware.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state))
        .configure(emporium_server::web::configure_app_routes),
    )
    .await
  };
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn registration(username: &str, phone: &str) -> Value {
  json!({
    "username": username,
    "email": format!("{}@example.com", username.replace(' ', ".")),
    "phone_number": phone,
    "password": "pass word",
  })
}
