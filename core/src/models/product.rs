// core/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::money::Money;

pub const PRODUCT_NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price: Money,
  pub stock: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Catalog entry as shown to customers: no stock level, no bookkeeping timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price: Decimal,
  #[serde(default)]
  pub stock: i32,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub stock: Option<i32>,
}

impl Product {
  pub fn create(draft: NewProduct) -> StoreResult<Self> {
    let now = Utc::now();
    Ok(Self {
      id: Uuid::new_v4(),
      name: validate_name(&draft.name)?,
      description: draft.description.trim().to_string(),
      price: Money::price(draft.price)?,
      stock: validate_stock(draft.stock)?,
      created_at: now,
      updated_at: now,
    })
  }

  /// Applies `patch` only if every provided field is valid.
  pub fn apply(&mut self, patch: ProductPatch) -> StoreResult<()> {
    let name = patch.name.as_deref().map(validate_name).transpose()?;
    let price = patch.price.map(Money::price).transpose()?;
    let stock = patch.stock.map(validate_stock).transpose()?;

    if let Some(name) = name {
      self.name = name;
    }
    if let Some(description) = patch.description {
      self.description = description.trim().to_string();
    }
    if let Some(price) = price {
      self.price = price;
    }
    if let Some(stock) = stock {
      self.stock = stock;
    }
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn summary(&self) -> ProductSummary {
    ProductSummary {
      id: self.id,
      name: self.name.clone(),
      description: self.description.clone(),
      price: self.price,
    }
  }
}

fn validate_name(name: &str) -> StoreResult<String> {
  let name = name.trim();
  if name.is_empty() {
    return Err(StoreError::Validation("Product name can't be empty".to_string()));
  }
  if name.chars().count() > PRODUCT_NAME_MAX_CHARS {
    return Err(StoreError::Validation(format!(
      "Product name must be at most {} characters.",
      PRODUCT_NAME_MAX_CHARS
    )));
  }
  Ok(name.to_string())
}

fn validate_stock(stock: i32) -> StoreResult<i32> {
  if stock < 0 {
    return Err(StoreError::Validation(
      "Stock must be zero or a positive number.".to_string(),
    ));
  }
  Ok(stock)
}
