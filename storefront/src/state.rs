// storefront/src/state.rs

use std::sync::Arc;

use emporium::{CartService, Catalog, CheckoutEngine, OrderLedger, Store};

use crate::config::AppConfig;
use crate::services::accounts::AccountService;
use crate::services::session_store::SessionStore;

/// Everything a handler needs, shared across actix workers. All services sit on one store.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub catalog: Catalog,
  pub cart: CartService,
  pub checkout: CheckoutEngine,
  pub ledger: OrderLedger,
  pub accounts: AccountService,
  pub sessions: SessionStore,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
    Self {
      catalog: Catalog::with_retry(store.clone(), config.retry_policy()),
      cart: CartService::new(store.clone()),
      checkout: CheckoutEngine::with_retry(store.clone(), config.retry_policy()),
      ledger: OrderLedger::new(store.clone()),
      accounts: AccountService::new(store.clone()),
      sessions: SessionStore::new(config.session_ttl),
      store,
      config,
    }
  }
}
