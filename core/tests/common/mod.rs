// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use std::sync::{
  atomic::{AtomicU32, Ordering},
  Arc,
};

use async_trait::async_trait;
use emporium::models::{CartLine, NewProduct, Order, OrderLine, Product, User};
use emporium::{
  CartRepository, CartService, Catalog, CheckoutEngine, MemoryStore, OrderLedger, OrderRepository, ProductRepository,
  RetryPolicy, Store, StoreError, StoreResult, UnitOfWork, UserRepository,
};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

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

// --- Services over one shared store ---
pub struct Shop {
  pub store: Arc<dyn Store>,
  pub catalog: Catalog,
  pub cart: CartService,
  pub checkout: CheckoutEngine,
  pub ledger: OrderLedger,
}

pub fn fast_retry() -> RetryPolicy {
  RetryPolicy {
    max_attempts: 3,
    base_delay: Duration::from_millis(1),
    max_delay: Duration::from_millis(5),
  }
}

impl Shop {
  pub fn over(store: Arc<dyn Store>) -> Self {
    Self {
      catalog: Catalog::with_retry(store.clone(), fast_retry()),
      cart: CartService::new(store.clone()),
      checkout: CheckoutEngine::with_retry(store.clone(), fast_retry()),
      ledger: OrderLedger::new(store.clone()),
      store,
    }
  }

  pub fn in_memory() -> Self {
    Self::over(Arc::new(MemoryStore::new()))
  }

  pub async fn product(&self, name: &str, price: Decimal, stock: i32) -> Product {
    self
      .catalog
      .create_product(NewProduct {
        name: name.to_string(),
        description: format!("{name} for tests"),
        price,
        stock,
      })
      .await
      .expect("product fixture")
  }

  pub async fn customer(&self, username: &str) -> Uuid {
    let digits: String = format!("{:010}", (Uuid::new_v4().as_u128() % 10_000_000_000) as u64);
    let user = User::new(
      username.to_string(),
      format!("{}@example.com", username.replace(' ', ".")),
      digits,
      "not-a-real-hash".to_string(),
    );
    let mut uow = self.store.begin().await.expect("begin");
    uow.insert_user(&user).await.expect("user fixture");
    uow.commit().await.expect("commit");
    user.id
  }

  pub async fn stock_of(&self, product_id: Uuid) -> i32 {
    self.catalog.get_product(product_id).await.expect("product").stock
  }

  /// Raw cart lines, straight from the store.
  pub async fn cart_lines(&self, user_id: Uuid) -> Vec<CartLine> {
    let mut uow = self.store.begin().await.expect("begin");
    uow.cart_lines(user_id).await.expect("cart lines")
  }

  pub async fn order_count(&self, user_id: Uuid) -> usize {
    self.ledger.orders_for(user_id).await.expect("orders").len()
  }
}

// --- Fault injection ---

/// Where a [`FaultyStore`] should break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  None,
  /// `begin` fails with a pool timeout this many times, then behaves.
  TransientBegins(u32),
  /// Every `begin` fails with a pool timeout.
  AlwaysTransient,
  /// Cart cleanup fails after the order and stock writes already happened in the unit.
  CartCleanup,
  /// Stock reservation for this product fails as if the row were gone.
  Reserve(Uuid),
}

/// Wraps a real store and breaks it in one configured place.
pub struct FaultyStore {
  inner: MemoryStore,
  fault: Fault,
  begins: AtomicU32,
}

impl FaultyStore {
  pub fn new(inner: MemoryStore, fault: Fault) -> Self {
    Self {
      inner,
      fault,
      begins: AtomicU32::new(0),
    }
  }

  pub fn begin_calls(&self) -> u32 {
    self.begins.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Store for FaultyStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let n = self.begins.fetch_add(1, Ordering::SeqCst) + 1;
    match self.fault {
      Fault::TransientBegins(failures) if n <= failures => {
        return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
      }
      Fault::AlwaysTransient => return Err(StoreError::Database(sqlx::Error::PoolTimedOut)),
      _ => {}
    }
    let inner = self.inner.begin().await?;
    Ok(Box::new(FaultyUnitOfWork {
      inner,
      fault: self.fault,
    }))
  }

  fn backend(&self) -> &'static str {
    "faulty-memory"
  }
}

struct FaultyUnitOfWork {
  inner: Box<dyn UnitOfWork>,
  fault: Fault,
}

#[async_trait]
impl UnitOfWork for FaultyUnitOfWork {
  async fn commit(&mut self) -> StoreResult<()> {
    self.inner.commit().await
  }
}

#[async_trait]
impl ProductRepository for FaultyUnitOfWork {
  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    self.inner.list_products().await
  }

  async fn find_product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>> {
    self.inner.find_product(product_id).await
  }

  async fn lock_products(&mut self, product_ids: &[Uuid]) -> StoreResult<Vec<Product>> {
    self.inner.lock_products(product_ids).await
  }

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    self.inner.insert_product(product).await
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    self.inner.save_product(product).await
  }

  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool> {
    self.inner.delete_product(product_id).await
  }

  async fn reserve_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<Product> {
    if self.fault == Fault::Reserve(product_id) {
      return Err(StoreError::not_found("product", product_id));
    }
    self.inner.reserve_stock(product_id, quantity).await
  }
}

#[async_trait]
impl CartRepository for FaultyUnitOfWork {
  async fn cart_lines(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    self.inner.cart_lines(user_id).await
  }

  async fn lock_cart(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    self.inner.lock_cart(user_id).await
  }

  async fn find_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    self.inner.find_cart_line(user_id, product_id).await
  }

  async fn lock_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    self.inner.lock_cart_line(user_id, product_id).await
  }

  async fn lock_cart_lines_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<CartLine>> {
    self.inner.lock_cart_lines_for_product(product_id).await
  }

  async fn save_cart_line(&mut self, line: &CartLine) -> StoreResult<()> {
    self.inner.save_cart_line(line).await
  }

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    self.inner.delete_cart_line(user_id, product_id).await
  }

  async fn remove_cart_lines(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> StoreResult<u64> {
    if self.fault == Fault::CartCleanup {
      return Err(StoreError::Internal("injected cart cleanup failure".to_string()));
    }
    self.inner.remove_cart_lines(user_id, product_ids).await
  }
}

#[async_trait]
impl OrderRepository for FaultyUnitOfWork {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    self.inner.insert_order(order).await
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()> {
    self.inner.insert_order_line(line).await
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    self.inner.orders_for_user(user_id).await
  }

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    self.inner.find_order(order_id).await
  }

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    self.inner.order_lines(order_id).await
  }
}

#[async_trait]
impl UserRepository for FaultyUnitOfWork {
  async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
    self.inner.insert_user(user).await
  }

  async fn find_user(&mut self, user_id: Uuid) -> StoreResult<Option<User>> {
    self.inner.find_user(user_id).await
  }

  async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
    self.inner.find_user_by_username(username).await
  }

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    self.inner.find_user_by_email(email).await
  }

  async fn find_user_by_phone(&mut self, phone_number: &str) -> StoreResult<Option<User>> {
    self.inner.find_user_by_phone(phone_number).await
  }

  async fn find_manager(&mut self) -> StoreResult<Option<User>> {
    self.inner.find_manager().await
  }

  async fn save_user(&mut self, user: &User) -> StoreResult<()> {
    self.inner.save_user(user).await
  }

  async fn delete_user(&mut self, user_id: Uuid) -> StoreResult<bool> {
    self.inner.delete_user(user_id).await
  }
}
