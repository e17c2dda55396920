// core/src/orders.rs

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::OrderRecord;
use crate::store::{OrderRepository, Store};

/// Read side of the order ledger. Orders are only ever written by
/// [`CheckoutEngine`](crate::checkout::CheckoutEngine).
#[derive(Clone)]
pub struct OrderLedger {
  store: Arc<dyn Store>,
}

impl OrderLedger {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  /// The user's orders, newest first, each with its lines.
  #[instrument(name = "orders::orders_for", skip(self))]
  pub async fn orders_for(&self, user_id: Uuid) -> StoreResult<Vec<OrderRecord>> {
    let mut uow = self.store.begin().await?;
    let orders = uow.orders_for_user(user_id).await?;
    let mut records = Vec::with_capacity(orders.len());
    for order in orders {
      let items = uow.order_lines(order.id).await?;
      records.push(OrderRecord { order, items });
    }
    Ok(records)
  }

  /// Another user's order reads as missing.
  #[instrument(name = "orders::order_for", skip(self))]
  pub async fn order_for(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<OrderRecord> {
    let mut uow = self.store.begin().await?;
    let order = match uow.find_order(order_id).await? {
      Some(order) if order.user_id == user_id => order,
      _ => return Err(StoreError::not_found("order", order_id)),
    };
    let items = uow.order_lines(order.id).await?;
    Ok(OrderRecord { order, items })
  }
}
