// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::bill::{Bill, BillLine};
use super::product::Product;
use crate::money::Money;

/// Immutable purchase record. Only checkout creates one.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub total_amount: Money,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub fn new(user_id: Uuid, total_amount: Money) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      total_amount,
      created_at: Utc::now(),
    }
  }
}

/// Per-product breakdown of an order. Name and price are copies taken at purchase time,
/// so later catalog edits never change what was paid.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderLine {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub price_per_item: Money,
}

impl OrderLine {
  pub fn capture(order_id: Uuid, product: &Product, quantity: i32) -> Self {
    Self {
      id: Uuid::new_v4(),
      order_id,
      product_id: product.id,
      product_name: product.name.clone(),
      quantity,
      price_per_item: product.price,
    }
  }

  pub fn amount(&self) -> Money {
    self.price_per_item.times(self.quantity)
  }

  pub fn bill_line(&self) -> BillLine {
    BillLine::new(self.product_id, self.product_name.clone(), self.quantity, self.price_per_item)
  }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub lines: Vec<OrderLine>,
  pub bill: Bill,
}

/// An order read back from the ledger together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLine>,
}

impl OrderRecord {
  pub fn bill(&self) -> Bill {
    self.items.iter().map(OrderLine::bill_line).collect()
  }
}
