// core/src/catalog.rs

//! Product catalog management.
//!
//! Edits lock the product row for the length of their unit of work, so a manager changing stock
//! or price is serialized against checkouts touching the same product. Writes are retried on
//! transient storage failures under a [`RetryPolicy`], the same way checkout is.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::retry::RetryPolicy;
use crate::store::{CartRepository, ProductRepository, Store, UnitOfWork};

#[derive(Clone)]
pub struct Catalog {
  store: Arc<dyn Store>,
  retry: RetryPolicy,
}

impl Catalog {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self::with_retry(store, RetryPolicy::default())
  }

  pub fn with_retry(store: Arc<dyn Store>, retry: RetryPolicy) -> Self {
    Self { store, retry }
  }

  #[instrument(name = "catalog::list_products", skip(self))]
  pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let mut uow = self.store.begin().await?;
    uow.list_products().await
  }

  #[instrument(name = "catalog::get_product", skip(self))]
  pub async fn get_product(&self, product_id: Uuid) -> StoreResult<Product> {
    let mut uow = self.store.begin().await?;
    uow
      .find_product(product_id)
      .await?
      .ok_or_else(|| StoreError::not_found("product", product_id))
  }

  #[instrument(name = "catalog::create_product", skip(self, draft), fields(name = %draft.name), err(Display))]
  pub async fn create_product(&self, draft: NewProduct) -> StoreResult<Product> {
    let product = Product::create(draft)?;
    self.retry.run("create_product", || self.insert(&product)).await?;
    info!(product_id = %product.id, stock = product.stock, price = %product.price, "Product created.");
    Ok(product)
  }

  #[instrument(name = "catalog::update_product", skip(self, patch), err(Display))]
  pub async fn update_product(&self, product_id: Uuid, patch: ProductPatch) -> StoreResult<Product> {
    let product = self
      .retry
      .run("update_product", || self.update(product_id, &patch))
      .await?;
    info!(product_id = %product.id, stock = product.stock, price = %product.price, "Product updated.");
    Ok(product)
  }

  /// Deletes a product and returns the deleted record. Cart lines for it go too;
  /// order history keeps its own copy of name and price.
  #[instrument(name = "catalog::delete_product", skip(self), err(Display))]
  pub async fn delete_product(&self, product_id: Uuid) -> StoreResult<Product> {
    let product = self.retry.run("delete_product", || self.delete(product_id)).await?;
    info!(product_id = %product_id, "Product deleted.");
    Ok(product)
  }

  async fn insert(&self, product: &Product) -> StoreResult<()> {
    let mut uow = self.store.begin().await?;
    uow.insert_product(product).await?;
    uow.commit().await
  }

  async fn update(&self, product_id: Uuid, patch: &ProductPatch) -> StoreResult<Product> {
    let mut uow = self.store.begin().await?;
    let mut product = lock_one(uow.as_mut(), product_id).await?;
    product.apply(patch.clone())?;
    uow.save_product(&product).await?;
    uow.commit().await?;
    Ok(product)
  }

  async fn delete(&self, product_id: Uuid) -> StoreResult<Product> {
    let mut uow = self.store.begin().await?;
    // cart lines before the product row, the order checkout takes them in
    let held = uow.lock_cart_lines_for_product(product_id).await?;
    let product = lock_one(uow.as_mut(), product_id).await?;
    uow.delete_product(product_id).await?;
    uow.commit().await?;
    debug!(product_id = %product_id, cart_lines = held.len(), "Product removed from carts.");
    Ok(product)
  }
}

async fn lock_one(uow: &mut dyn UnitOfWork, product_id: Uuid) -> StoreResult<Product> {
  match uow.lock_products(&[product_id]).await?.pop() {
    Some(product) => Ok(product),
    None => {
      warn!(product_id = %product_id, "Product not found.");
      Err(StoreError::not_found("product", product_id))
    }
  }
}
