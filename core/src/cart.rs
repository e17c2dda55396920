// core/src/cart.rs

//! Per-user carts.
//!
//! Stock checks here are advisory: they keep obviously impossible quantities out of the cart,
//! but stock can move before checkout, which performs the binding check.
//!
//! Adds and removes hold the cart line for their whole unit of work, so concurrent updates of one
//! line, or an update racing the same user's checkout, apply one after the other.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Bill, CartEntry, CartLine, Product};
use crate::store::{CartRepository, ProductRepository, Store, UnitOfWork};

/// Outcome of [`CartService::add_to_cart`].
#[derive(Debug, Clone, Serialize)]
pub struct CartAddition {
  /// Quantity now in the cart for this product.
  pub quantity: i32,
  /// True when the product was not in the cart before.
  pub created: bool,
  pub product: Product,
}

/// Outcome of [`CartService::remove_from_cart`].
#[derive(Debug, Clone, Serialize)]
pub struct CartRemoval {
  pub product_id: Uuid,
  pub product_name: String,
  pub removed: i32,
  /// Zero when the line was deleted.
  pub remaining: i32,
}

#[derive(Clone)]
pub struct CartService {
  store: Arc<dyn Store>,
}

fn positive_quantity(quantity: i64) -> StoreResult<i32> {
  match i32::try_from(quantity) {
    Ok(q) if q > 0 => Ok(q),
    _ => Err(StoreError::InvalidQuantity { quantity }),
  }
}

impl CartService {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  #[instrument(name = "cart::add", skip(self), err(Display))]
  pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartAddition> {
    let quantity = positive_quantity(quantity)?;

    let mut uow = self.store.begin().await?;
    let product = uow
      .find_product(product_id)
      .await?
      .ok_or_else(|| StoreError::not_found("product", product_id))?;

    let existing = uow.lock_cart_line(user_id, product_id).await?;
    let created = existing.is_none();
    let new_quantity = match &existing {
      Some(line) => line.quantity.checked_add(quantity),
      None => Some(quantity),
    };

    let new_quantity = match new_quantity {
      Some(q) if q <= product.stock => q,
      _ => {
        warn!(
          available = product.stock,
          in_cart = existing.as_ref().map_or(0, |line| line.quantity),
          "Requested quantity exceeds current stock."
        );
        return Err(StoreError::OutOfStock {
          product_id,
          product_name: product.name.clone(),
          requested: quantity,
          available: product.stock,
        });
      }
    };

    let line = match existing {
      Some(mut line) => {
        line.quantity = new_quantity;
        line
      }
      None => CartLine::new(user_id, product_id, new_quantity),
    };
    uow.save_cart_line(&line).await?;
    uow.commit().await?;

    info!(quantity = new_quantity, created, "Cart line saved.");
    Ok(CartAddition {
      quantity: new_quantity,
      created,
      product,
    })
  }

  #[instrument(name = "cart::remove", skip(self), err(Display))]
  pub async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i64) -> StoreResult<CartRemoval> {
    let mut uow = self.store.begin().await?;
    let mut line = uow
      .lock_cart_line(user_id, product_id)
      .await?
      .ok_or_else(|| StoreError::not_found("cart item", product_id))?;

    let quantity = positive_quantity(quantity)?;
    if quantity > line.quantity {
      return Err(StoreError::InsufficientCartQuantity {
        product_id,
        requested: quantity,
        in_cart: line.quantity,
      });
    }

    let product_name = uow
      .find_product(product_id)
      .await?
      .map(|product| product.name)
      .unwrap_or_default();

    line.quantity -= quantity;
    if line.quantity == 0 {
      uow.delete_cart_line(user_id, product_id).await?;
    } else {
      uow.save_cart_line(&line).await?;
    }
    uow.commit().await?;

    info!(removed = quantity, remaining = line.quantity, "Cart line reduced.");
    Ok(CartRemoval {
      product_id,
      product_name,
      removed: quantity,
      remaining: line.quantity,
    })
  }

  #[instrument(name = "cart::list", skip(self))]
  pub async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartEntry>> {
    let mut uow = self.store.begin().await?;
    let lines = uow.cart_lines(user_id).await?;
    let products = products_for(uow.as_mut(), &lines).await?;
    Ok(
      lines
        .into_iter()
        .filter_map(|line| {
          products.get(&line.product_id).map(|product| CartEntry {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            added_at: line.added_at,
          })
        })
        .collect(),
    )
  }

  /// Bill at current prices. Reads only; nothing is reserved.
  #[instrument(name = "cart::preview_bill", skip(self))]
  pub async fn preview_bill(&self, user_id: Uuid) -> StoreResult<Bill> {
    Ok(self.list_cart(user_id).await?.iter().map(CartEntry::bill_line).collect())
  }
}

async fn products_for(uow: &mut dyn UnitOfWork, lines: &[CartLine]) -> StoreResult<HashMap<Uuid, Product>> {
  let mut products = HashMap::with_capacity(lines.len());
  for line in lines {
    if let Some(product) = uow.find_product(line.product_id).await? {
      products.insert(product.id, product);
    }
  }
  Ok(products)
}
