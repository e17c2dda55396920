// core/src/store/postgres.rs

//! PostgreSQL store. Each unit of work is one `sqlx` transaction at READ COMMITTED; checkout's
//! isolation comes from explicit row locks (`FOR UPDATE`) taken in a fixed order, plus a
//! conditional decrement that can never take stock below zero even if a caller forgot to lock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, Store, UnitOfWork, UserRepository};
use crate::error::{StoreError, StoreResult};
use crate::models::{CartLine, Order, OrderLine, Product, User};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";
const CART_COLUMNS: &str = "id, user_id, product_id, quantity, added_at";
const ORDER_LINE_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, price_per_item";
const USER_COLUMNS: &str =
  "id, username, email, phone_number, password_hash, is_active, is_manager, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .acquire_timeout(Duration::from_secs(5))
      .connect(database_url)
      .await
      .map_err(|e| {
        error!(error = %e, "Failed to connect to the database.");
        StoreError::Database(e)
      })?;
    info!(max_connections, "Connected to PostgreSQL.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Applies the embedded schema migrations.
  pub async fn migrate(&self) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl Store for PgStore {
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
  }

  fn backend(&self) -> &'static str {
    "postgres"
  }
}

pub struct PgUnitOfWork {
  // `None` once committed; dropping a live transaction rolls it back.
  tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
  fn conn(&mut self) -> StoreResult<&mut PgConnection> {
    self
      .tx
      .as_deref_mut()
      .ok_or_else(|| StoreError::Internal("unit of work already committed".to_string()))
  }
}

fn conflict_message(constraint: Option<&str>) -> String {
  match constraint {
    Some("users_username_key") => "Username already exists",
    Some("users_email_key") => "Email already exists",
    Some("users_phone_number_key") => "Phone number already exists",
    Some("users_single_manager") => "A manager account already exists",
    _ => "Record already exists",
  }
  .to_string()
}

/// Maps constraint violations raised by writes onto the store's error taxonomy.
fn map_write_error(err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    match db_err.code().as_deref() {
      Some("23505") => return StoreError::Conflict(conflict_message(db_err.constraint())),
      Some("23514") => {
        return StoreError::Validation(format!(
          "Value rejected by constraint {}",
          db_err.constraint().unwrap_or("unknown")
        ))
      }
      _ => {}
    }
  }
  StoreError::Database(err)
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503"))
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
  async fn commit(&mut self) -> StoreResult<()> {
    let tx = self
      .tx
      .take()
      .ok_or_else(|| StoreError::Internal("unit of work already committed".to_string()))?;
    tx.commit().await?;
    debug!("postgres unit of work committed");
    Ok(())
  }
}

#[async_trait]
impl ProductRepository for PgUnitOfWork {
  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC, id ASC");
    Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(self.conn()?).await?)
  }

  async fn find_product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(product_id)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn lock_products(&mut self, product_ids: &[Uuid]) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE");
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(product_ids)
        .fetch_all(self.conn()?)
        .await?,
    )
  }

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price, stock, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(self.conn()?)
    .await
    .map_err(map_write_error)?;
    Ok(())
  }

  async fn save_product(&mut self, product: &Product) -> StoreResult<()> {
    let result = sqlx::query(
      "UPDATE products SET name = $2, description = $3, price = $4, stock = $5, updated_at = $6 WHERE id = $1",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.updated_at)
    .execute(self.conn()?)
    .await
    .map_err(map_write_error)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::not_found("product", product.id));
    }
    Ok(())
  }

  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool> {
    // cart_items cascade; order_items hold no foreign key to products
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(product_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn reserve_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<Product> {
    let sql = format!(
      "UPDATE products SET stock = stock - $2, updated_at = $3 \
       WHERE id = $1 AND stock >= $2 RETURNING {PRODUCT_COLUMNS}"
    );
    let reserved = sqlx::query_as::<_, Product>(&sql)
      .bind(product_id)
      .bind(quantity)
      .bind(Utc::now())
      .fetch_optional(self.conn()?)
      .await?;
    if let Some(product) = reserved {
      return Ok(product);
    }

    let current: Option<(String, i32)> = sqlx::query_as("SELECT name, stock FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(self.conn()?)
      .await?;
    match current {
      Some((product_name, available)) => Err(StoreError::InsufficientStock {
        product_id,
        product_name,
        requested: quantity,
        available,
      }),
      None => Err(StoreError::not_found("product", product_id)),
    }
  }
}

#[async_trait]
impl CartRepository for PgUnitOfWork {
  async fn cart_lines(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY added_at, id");
    Ok(
      sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(self.conn()?)
        .await?,
    )
  }

  async fn lock_cart(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY added_at, id FOR UPDATE");
    Ok(
      sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .fetch_all(self.conn()?)
        .await?,
    )
  }

  async fn find_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 AND product_id = $2");
    Ok(
      sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn lock_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>> {
    // The owner row serialises writers of one cart, including inserts of lines that do not exist
    // yet. Checkout never takes it: it locks the lines themselves.
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
      .bind(user_id)
      .execute(self.conn()?)
      .await?;
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 AND product_id = $2 FOR UPDATE");
    Ok(
      sqlx::query_as::<_, CartLine>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn lock_cart_lines_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE product_id = $1 ORDER BY user_id FOR UPDATE");
    Ok(
      sqlx::query_as::<_, CartLine>(&sql)
        .bind(product_id)
        .fetch_all(self.conn()?)
        .await?,
    )
  }

  async fn save_cart_line(&mut self, line: &CartLine) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO cart_items (id, user_id, product_id, quantity, added_at) VALUES ($1, $2, $3, $4, $5) \
       ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(line.id)
    .bind(line.user_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.added_at)
    .execute(self.conn()?)
    .await
    .map_err(|e| {
      if is_foreign_key_violation(&e) {
        StoreError::not_found("product", line.product_id)
      } else {
        map_write_error(e)
      }
    })?;
    Ok(())
  }

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn remove_cart_lines(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
      .bind(user_id)
      .bind(product_ids)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected())
  }
}

#[async_trait]
impl OrderRepository for PgUnitOfWork {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
    sqlx::query("INSERT INTO orders (id, user_id, total_amount, created_at) VALUES ($1, $2, $3, $4)")
      .bind(order.id)
      .bind(order.user_id)
      .bind(order.total_amount)
      .bind(order.created_at)
      .execute(self.conn()?)
      .await
      .map_err(map_write_error)?;
    Ok(())
  }

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, price_per_item) \
       VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(line.id)
    .bind(line.order_id)
    .bind(line.product_id)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.price_per_item)
    .execute(self.conn()?)
    .await
    .map_err(map_write_error)?;
    Ok(())
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    Ok(
      sqlx::query_as::<_, Order>(
        "SELECT id, user_id, total_amount, created_at FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
      )
      .bind(user_id)
      .fetch_all(self.conn()?)
      .await?,
    )
  }

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(
      sqlx::query_as::<_, Order>("SELECT id, user_id, total_amount, created_at FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>> {
    let sql = format!("SELECT {ORDER_LINE_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY line_no");
    Ok(
      sqlx::query_as::<_, OrderLine>(&sql)
        .bind(order_id)
        .fetch_all(self.conn()?)
        .await?,
    )
  }
}

#[async_trait]
impl UserRepository for PgUnitOfWork {
  async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO users (id, username, email, phone_number, password_hash, is_active, is_manager, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_manager)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(self.conn()?)
    .await
    .map_err(map_write_error)?;
    Ok(())
  }

  async fn find_user(&mut self, user_id: Uuid) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn find_user_by_phone(&mut self, phone_number: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1");
    Ok(
      sqlx::query_as::<_, User>(&sql)
        .bind(phone_number)
        .fetch_optional(self.conn()?)
        .await?,
    )
  }

  async fn find_manager(&mut self) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE is_manager LIMIT 1");
    Ok(sqlx::query_as::<_, User>(&sql).fetch_optional(self.conn()?).await?)
  }

  async fn save_user(&mut self, user: &User) -> StoreResult<()> {
    let result = sqlx::query(
      "UPDATE users SET username = $2, email = $3, phone_number = $4, password_hash = $5, \
       is_active = $6, is_manager = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(user.is_manager)
    .bind(user.updated_at)
    .execute(self.conn()?)
    .await
    .map_err(map_write_error)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::not_found("user", user.id));
    }
    Ok(())
  }

  async fn delete_user(&mut self, user_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
      .bind(user_id)
      .execute(self.conn()?)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}
