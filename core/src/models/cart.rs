// core/src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::bill::BillLine;
use crate::money::Money;

/// One product in one user's cart. At most one line exists per (user, product).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartLine {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

impl CartLine {
  pub fn new(user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    }
  }
}

/// A cart line joined with the live product name and price.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
  #[serde(rename = "id")]
  pub product_id: Uuid,
  pub name: String,
  pub price: Money,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

impl CartEntry {
  pub fn bill_line(&self) -> BillLine {
    BillLine::new(self.product_id, self.name.clone(), self.quantity, self.price)
  }
}
