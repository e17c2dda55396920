// core/src/checkout.rs

//! Cart → order conversion.
//!
//! A checkout runs as one unit of work:
//!
//! 1. lock the user's cart lines (empty cart fails with `EmptyCart`);
//! 2. lock every product in the cart, in ascending id order so that two checkouts sharing products
//!    always contend in the same order;
//! 3. validate every line against the locked stock before writing anything;
//! 4. write the order and its lines, reserve stock line by line;
//! 5. delete the cart lines that were bought and commit.
//!
//! Any `?` between `begin` and `commit` drops the unit of work, which rolls all of it back. The
//! conditional decrement in `reserve_stock` is a second guard: even with the lock in place, stock
//! cannot go below zero.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Bill, CartLine, Order, OrderLine, PlacedOrder, Product};
use crate::money::{Money, ORDER_TOTAL_MAX_DIGITS};
use crate::retry::RetryPolicy;
use crate::store::{CartRepository, OrderRepository, ProductRepository, Store, UnitOfWork};

#[derive(Clone)]
pub struct CheckoutEngine {
  store: Arc<dyn Store>,
  retry: RetryPolicy,
}

impl CheckoutEngine {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self::with_retry(store, RetryPolicy::default())
  }

  pub fn with_retry(store: Arc<dyn Store>, retry: RetryPolicy) -> Self {
    Self { store, retry }
  }

  pub fn retry_policy(&self) -> &RetryPolicy {
    &self.retry
  }

  /// Places an order for everything in `user_id`'s cart, or changes nothing.
  ///
  /// Business failures (`EmptyCart`, `InsufficientStock`, `NotFound`) come back on the first
  /// attempt. Transient storage failures are retried according to the engine's [`RetryPolicy`].
  #[instrument(name = "checkout", skip(self), fields(backend = self.store.backend()), err(Display))]
  pub async fn checkout(&self, user_id: Uuid) -> StoreResult<PlacedOrder> {
    let placed = self.retry.run("checkout", || self.attempt(user_id)).await?;
    info!(
      order_id = %placed.order.id,
      total = %placed.order.total_amount,
      lines = placed.lines.len(),
      "Order placed."
    );
    Ok(placed)
  }

  async fn attempt(&self, user_id: Uuid) -> StoreResult<PlacedOrder> {
    let mut uow = self.store.begin().await?;

    let cart = uow.lock_cart(user_id).await?;
    if cart.is_empty() {
      return Err(StoreError::EmptyCart);
    }
    debug!(lines = cart.len(), "Cart snapshot taken.");

    let products = lock_cart_products(uow.as_mut(), &cart).await?;
    let purchase = validate(&cart, &products)?;

    let total: Money = purchase
      .iter()
      .map(|(product, quantity)| product.price.times(*quantity))
      .sum();
    check_total(total)?;
    let order = Order::new(user_id, total);
    uow.insert_order(&order).await?;

    let mut lines = Vec::with_capacity(purchase.len());
    for (product, quantity) in purchase {
      let line = OrderLine::capture(order.id, product, quantity);
      uow.insert_order_line(&line).await?;
      let updated = uow.reserve_stock(product.id, quantity).await?;
      debug!(product_id = %product.id, quantity, remaining = updated.stock, "Stock reserved.");
      lines.push(line);
    }

    let bought: Vec<Uuid> = cart.iter().map(|line| line.product_id).collect();
    uow.remove_cart_lines(user_id, &bought).await?;
    uow.commit().await?;

    let bill: Bill = lines.iter().map(OrderLine::bill_line).collect();
    Ok(PlacedOrder { order, lines, bill })
  }
}

async fn lock_cart_products(uow: &mut dyn UnitOfWork, cart: &[CartLine]) -> StoreResult<HashMap<Uuid, Product>> {
  let mut ids: Vec<Uuid> = cart.iter().map(|line| line.product_id).collect();
  ids.sort_unstable();
  ids.dedup();
  let locked = uow.lock_products(&ids).await?;
  Ok(locked.into_iter().map(|product| (product.id, product)).collect())
}

/// Checks every line against locked stock. The first blocking line, in cart order, wins.
fn validate<'a>(cart: &[CartLine], products: &'a HashMap<Uuid, Product>) -> StoreResult<Vec<(&'a Product, i32)>> {
  cart
    .iter()
    .map(|line| {
      let product = products
        .get(&line.product_id)
        .ok_or_else(|| StoreError::not_found("product", line.product_id))?;
      if line.quantity > product.stock {
        warn!(
          product_id = %product.id,
          requested = line.quantity,
          available = product.stock,
          "Checkout blocked by insufficient stock."
        );
        return Err(StoreError::InsufficientStock {
          product_id: product.id,
          product_name: product.name.clone(),
          requested: line.quantity,
          available: product.stock,
        });
      }
      Ok((product, line.quantity))
    })
    .collect()
}

fn check_total(total: Money) -> StoreResult<()> {
  let limit = Money::max_with_digits(ORDER_TOTAL_MAX_DIGITS);
  if total > limit {
    warn!(%total, %limit, "Checkout blocked by order total limit.");
    return Err(StoreError::Validation(format!(
      "Order total {} exceeds the maximum of {} for a single order.",
      total, limit
    )));
  }
  Ok(())
}
