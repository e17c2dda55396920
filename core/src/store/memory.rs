// core/src/store/memory.rs

//! In-memory store for tests, demos and single-process deployments.
//!
//! A unit of work takes the store-wide lock and works on a private copy of the tables; commit
//! swaps the copy in. Units are therefore fully serialized, which trivially gives checkout the
//! isolation it needs. The copy makes `begin` O(size of the store), fine for the data volumes this
//! backend is meant for.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, Store, UnitOfWork, UserRepository};
use crate::error::{StoreError, StoreResult};
use crate::models::{CartLine, Order, OrderLine, Product, User};

#[derive(Debug, Clone, Default)]
struct Tables {
  products: HashMap<Uuid, Product>,
  // insertion order is the cart display order
  cart_lines: Vec<CartLine>,
  orders: Vec<Order>,
  order_lines: Vec<OrderLine>,
  users: HashMap<Uuid, User>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let staged = guard.clone();
    trace!("memory unit of work opened");
    Ok(Box::new(MemoryUnitOfWork {
      guard: Some(guard),
      staged,
    }))
  }

  fn backend(&self) -> &'static str {
    "memory"
  }
}

pub struct MemoryUnitOfWork {
  guard: Option<OwnedMutexGuard<Tables>>,
  staged: Tables,
}

impl MemoryUnitOfWork {
  fn tables(&mut self) -> StoreResult<&mut Tables> {
    if self.guard.is_none() {
      return Err(StoreError::Internal("unit of work already committed".to_string()));
    }
    Ok(&mut self.staged)
  }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
  async fn commit(&mut self) -> StoreResult<()> {
    let mut guard = self
      .guard
      .take()
      .ok_or_else(|| StoreError::Internal("unit of work already committed".to_string()))?;
    *guard = std::mem::take(&mut self.staged);
    debug!("memory unit of work committed");
    Ok(())
  }
}

#[async_trait]
impl ProductRepository for MemoryUnitOfWork {
  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    let mut products: Vec<Product> = self.tables()?.products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(products)
  }

  async fn find_product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>> {
    Ok(self.tables()?.products.get(&product_id).cloned())
  }

  async fn lock_products(&mut self, product_ids: &[Uuid]) -> StoreResult<Vec<Product>> {
    // the whole store is already held
    let tables = self.tables()?;
    let mut ids = product_ids.to_vec();
    ids.sort();
    ids.dedup();
    Ok(ids.iter().filter_map(|id| tables.products.get(id).cloned()).collect())
  }

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    let tables = self.tables()?;
    if tables.products.contains_key(&product.id) {
      return Err(StoreError::Conflict(format!("Product {} already exists", product.id)));
    }
    tables.products.insert(product.id, product.clone());
    Ok(())
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    let existing = self
      .tables()?
      .products
      .get_mut(&product.id)
      .ok_or_else(|| StoreError::not_found("product", product.id))?;
    *existing = product.clone();
    Ok(())
  }

  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool> {
    let tables = self.tables()?;
    let removed = tables.products.remove(&product_id).is_some();
    if removed {
      tables.cart_lines.retain(|line| line.product_id != product_id);
    }
    Ok(removed)
  }

  async fn reserve_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<Product> {
    let product = self
      .tables()?
      .products
      .get_mut(&product_id)
      .ok_or_else(|| StoreError::not_found("product", product_id))?;
    if product.stock < quantity {
      return Err(StoreError::InsufficientStock {
        product_id,
        product_name: product.name.clone(),
        requested: quantity,
        available: product.stock,
      });
    }
    product.stock -= quantity;
    product.updated_at = Utc::now();
    Ok(product.clone())
  }
}

#[async_trait]
impl CartRepository for MemoryUnitOfWork {
  async fn cart_lines(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    Ok(
      self
        .tables()?
        .cart_lines
        .iter()
        .filter(|line| line.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn lock_cart(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    self.cart_lines(user_id).await
  }

  async fn lock_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    self.find_cart_line(user_id, product_id).await
  }

  async fn lock_cart_lines_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let mut lines: Vec<CartLine> = self
      .tables()?
      .cart_lines
      .iter()
      .filter(|line| line.product_id == product_id)
      .cloned()
      .collect();
    lines.sort_by_key(|line| line.user_id);
    Ok(lines)
  }

  async fn find_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    Ok(
      self
        .tables()?
        .cart_lines
        .iter()
        .find(|line| line.user_id == user_id && line.product_id == product_id)
        .cloned(),
    )
  }

  async fn save_cart_line(&mut self, line: &CartLine) -> StoreResult<()> {
    let tables = self.tables()?;
    if !tables.products.contains_key(&line.product_id) {
      return Err(StoreError::not_found("product", line.product_id));
    }
    match tables
      .cart_lines
      .iter_mut()
      .find(|existing| existing.user_id == line.user_id && existing.product_id == line.product_id)
    {
      Some(existing) => existing.quantity = line.quantity,
      None => tables.cart_lines.push(line.clone()),
    }
    Ok(())
  }

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    let tables = self.tables()?;
    let before = tables.cart_lines.len();
    tables
      .cart_lines
      .retain(|line| !(line.user_id == user_id && line.product_id == product_id));
    Ok(tables.cart_lines.len() < before)
  }

  async fn remove_cart_lines(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> StoreResult<u64> {
    let tables = self.tables()?;
    let before = tables.cart_lines.len();
    tables
      .cart_lines
      .retain(|line| !(line.user_id == user_id && product_ids.contains(&line.product_id)));
    Ok((before - tables.cart_lines.len()) as u64)
  }
}

#[async_trait]
impl OrderRepository for MemoryUnitOfWork {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    self.tables()?.orders.push(order.clone());
    Ok(())
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()> {
    let tables = self.tables()?;
    if !tables.orders.iter().any(|order| order.id == line.order_id) {
      return Err(StoreError::not_found("order", line.order_id));
    }
    tables.order_lines.push(line.clone());
    Ok(())
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables()?
      .orders
      .iter()
      .filter(|order| order.user_id == user_id)
      .cloned()
      .collect();
    orders.reverse();
    Ok(orders)
  }

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(self.tables()?.orders.iter().find(|order| order.id == order_id).cloned())
  }

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    Ok(
      self
        .tables()?
        .order_lines
        .iter()
        .filter(|line| line.order_id == order_id)
        .cloned()
        .collect(),
    )
  }
}

fn check_user_unique(tables: &Tables, user: &User) -> StoreResult<()> {
  for other in tables.users.values().filter(|other| other.id != user.id) {
    if other.username == user.username {
      return Err(StoreError::Conflict("Username already exists".to_string()));
    }
    if other.email == user.email {
      return Err(StoreError::Conflict("Email already exists".to_string()));
    }
    if other.phone_number == user.phone_number {
      return Err(StoreError::Conflict("Phone number already exists".to_string()));
    }
    if user.is_manager && other.is_manager {
      return Err(StoreError::Conflict("A manager account already exists".to_string()));
    }
  }
  Ok(())
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
  async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
    let tables = self.tables()?;
    if tables.users.contains_key(&user.id) {
      return Err(StoreError::Conflict(format!("User {} already exists", user.id)));
    }
    check_user_unique(tables, user)?;
    tables.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn find_user(&mut self, user_id: Uuid) -> StoreResult<Option<User>> {
    Ok(self.tables()?.users.get(&user_id).cloned())
  }

  async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
    Ok(self.tables()?.users.values().find(|u| u.username == username).cloned())
  }

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    Ok(self.tables()?.users.values().find(|u| u.email == email).cloned())
  }

  async fn find_user_by_phone(&mut self, phone_number: &str) -> StoreResult<Option<User>> {
    Ok(
      self
        .tables()?
        .users
        .values()
        .find(|u| u.phone_number == phone_number)
        .cloned(),
    )
  }

  async fn find_manager(&mut self) -> StoreResult<Option<User>> {
    Ok(self.tables()?.users.values().find(|u| u.is_manager).cloned())
  }

  async fn save_user(&mut self, user: &User) -> StoreResult<()> {
    let tables = self.tables()?;
    if !tables.users.contains_key(&user.id) {
      return Err(StoreError::not_found("user", user.id));
    }
    check_user_unique(tables, user)?;
    tables.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn delete_user(&mut self, user_id: Uuid) -> StoreResult<bool> {
    let tables = self.tables()?;
    let removed = tables.users.remove(&user_id).is_some();
    if removed {
      tables.cart_lines.retain(|line| line.user_id != user_id);
    }
    Ok(removed)
  }
}
