// core/src/models/bill.rs

use serde::Serialize;
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillLine {
  pub product_id: Uuid,
  pub product: String,
  pub quantity: i32,
  pub price: Money,
  pub amount: Money,
}

impl BillLine {
  pub fn new(product_id: Uuid, product: impl Into<String>, quantity: i32, price: Money) -> Self {
    Self {
      product_id,
      product: product.into(),
      quantity,
      price,
      amount: price.times(quantity),
    }
  }
}

/// Itemised amounts and their grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
  pub lines: Vec<BillLine>,
  pub total: Money,
}

impl Bill {
  pub fn from_lines(lines: Vec<BillLine>) -> Self {
    let total = lines.iter().map(|line| line.amount).sum();
    Self { lines, total }
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

impl FromIterator<BillLine> for Bill {
  fn from_iter<I: IntoIterator<Item = BillLine>>(iter: I) -> Self {
    Bill::from_lines(iter.into_iter().collect())
  }
}
