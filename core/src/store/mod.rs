// core/src/store/mod.rs

//! Storage seam.
//!
//! Every operation runs inside a [`UnitOfWork`] obtained from [`Store::begin`]. A unit of work
//! publishes all of its effects on [`UnitOfWork::commit`]; dropping it without committing
//! discards them. Checkout relies on this to stay all-or-nothing: an early return through `?`
//! anywhere between `begin` and `commit` rolls the whole purchase back.
//!
//! The repository traits are split by table family so that test doubles can wrap a real unit of
//! work and intercept only the calls they care about.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{CartLine, Order, OrderLine, Product, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync + 'static {
  /// Opens a unit of work. May wait for other units to finish, depending on the backend.
  async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

  /// Short backend name for logs.
  fn backend(&self) -> &'static str;
}

#[async_trait]
pub trait UnitOfWork: ProductRepository + CartRepository + OrderRepository + UserRepository {
  /// Publishes every effect of this unit. Further calls on the unit fail.
  async fn commit(&mut self) -> StoreResult<()>;
}

#[async_trait]
pub trait ProductRepository: Send {
  /// All products ordered by name.
  async fn list_products(&mut self) -> StoreResult<Vec<Product>>;

  async fn find_product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>>;

  /// Reads `product_ids` and holds them exclusively until the unit ends. Rows are locked in
  /// ascending id order; ids that do not exist are simply absent from the result.
  async fn lock_products(&mut self, product_ids: &[Uuid]) -> StoreResult<Vec<Product>>;

  async fn insert_product(&mut self, product: &Product) -> StoreResult<()>;

  /// Overwrites every mutable column of an existing product.
  async fn save_product(&mut self, product: &Product) -> StoreResult<()>;

  /// Deletes a product and any cart lines pointing at it. Order lines are left alone.
  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool>;

  /// Decrements stock by `quantity` only if at least that much is available, as one atomic
  /// compare-and-decrement. Fails with `InsufficientStock` or `NotFound` otherwise.
  async fn reserve_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<Product>;
}

#[async_trait]
pub trait CartRepository: Send {
  /// The user's cart lines in the order they were first added.
  async fn cart_lines(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;

  /// Same as [`cart_lines`](Self::cart_lines) but holds the lines until the unit ends, so a
  /// concurrent cart update cannot slip between checkout's snapshot and its cleanup.
  async fn lock_cart(&mut self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;

  async fn find_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>>;

  /// Like [`find_cart_line`](Self::find_cart_line), but holds the line, and the right to create
  /// it, until the unit ends. Read-modify-write cart updates must start here.
  async fn lock_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartLine>>;

  /// Locks every cart line holding `product_id`, ordered by user. Taken before the product row
  /// itself so that product deletion acquires locks in the same order as checkout.
  async fn lock_cart_lines_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<CartLine>>;

  /// Inserts the line or, if (user, product) already has one, replaces its quantity.
  async fn save_cart_line(&mut self, line: &CartLine) -> StoreResult<()>;

  async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<bool>;

  /// Deletes the user's lines for `product_ids`; returns how many were removed.
  async fn remove_cart_lines(&mut self, user_id: Uuid, product_ids: &[Uuid]) -> StoreResult<u64>;
}

#[async_trait]
pub trait OrderRepository: Send {
  async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

  async fn insert_order_line(&mut self, line: &OrderLine) -> StoreResult<()>;

  /// Newest first.
  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>>;

  async fn find_order(&mut self, order_id: Uuid) -> StoreResult<Option<Order>>;

  async fn order_lines(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderLine>>;
}

#[async_trait]
pub trait UserRepository: Send {
  /// Fails with `Conflict` when the username, email or phone number is taken, or when a second
  /// manager would be created.
  async fn insert_user(&mut self, user: &User) -> StoreResult<()>;

  async fn find_user(&mut self, user_id: Uuid) -> StoreResult<Option<User>>;

  async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;

  async fn find_user_by_phone(&mut self, phone_number: &str) -> StoreResult<Option<User>>;

  async fn find_manager(&mut self) -> StoreResult<Option<User>>;

  /// Same uniqueness rules as [`insert_user`](Self::insert_user).
  async fn save_user(&mut self, user: &User) -> StoreResult<()>;

  /// Deletes the user and their cart. Orders stay in the ledger.
  async fn delete_user(&mut self, user_id: Uuid) -> StoreResult<bool>;
}
