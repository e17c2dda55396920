// tests/catalog_tests.rs
mod common;
use common::*;

use std::sync::Arc;

use emporium::models::{NewProduct, ProductPatch};
use emporium::{Catalog, MemoryStore, Money, StoreError};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn products_are_listed_by_name() {
  setup_tracing();
  let shop = Shop::in_memory();
  shop.product("Zither", dec!(120.00), 1).await;
  shop.product("Accordion", dec!(300.00), 2).await;
  shop.product("Banjo", dec!(180.00), 0).await;

  let names: Vec<_> = shop
    .catalog
    .list_products()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.name)
    .collect();
  assert_eq!(names, ["Accordion", "Banjo", "Zither"]);
}

#[tokio::test]
async fn create_validates_price_and_stock() {
  setup_tracing();
  let shop = Shop::in_memory();
  let draft = |price, stock| NewProduct {
    name: "Drum".to_string(),
    description: String::new(),
    price,
    stock,
  };

  let err = shop.catalog.create_product(draft(dec!(0), 1)).await.unwrap_err();
  assert_eq!(err.to_string(), "Price must be a positive number.");

  let err = shop.catalog.create_product(draft(dec!(1.005), 1)).await.unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)));

  let err = shop.catalog.create_product(draft(dec!(5), -1)).await.unwrap_err();
  assert_eq!(err.to_string(), "Stock must be zero or a positive number.");

  let drum = shop.catalog.create_product(draft(dec!(5), 0)).await.unwrap();
  assert_eq!(drum.price, Money::new(dec!(5.00)));
  assert_eq!(drum.price.to_string(), "5.00");
}

#[tokio::test]
async fn update_is_partial_and_all_or_nothing() {
  setup_tracing();
  let shop = Shop::in_memory();
  let harp = shop.product("Harp", dec!(900.00), 2).await;

  let updated = shop
    .catalog
    .update_product(
      harp.id,
      ProductPatch {
        stock: Some(7),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(updated.stock, 7);
  assert_eq!(updated.name, "Harp");
  assert_eq!(updated.price, harp.price);

  let err = shop
    .catalog
    .update_product(
      harp.id,
      ProductPatch {
        name: Some("Lyre".to_string()),
        price: Some(dec!(-1)),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)));
  assert_eq!(shop.catalog.get_product(harp.id).await.unwrap().name, "Harp");
}

#[tokio::test]
async fn missing_products_report_not_found() {
  setup_tracing();
  let shop = Shop::in_memory();
  let ghost = Uuid::new_v4();

  assert!(matches!(
    shop.catalog.get_product(ghost).await,
    Err(StoreError::NotFound { entity: "product", .. })
  ));
  assert!(matches!(
    shop.catalog.update_product(ghost, ProductPatch::default()).await,
    Err(StoreError::NotFound { .. })
  ));
  assert!(matches!(
    shop.catalog.delete_product(ghost).await,
    Err(StoreError::NotFound { .. })
  ));
}

#[tokio::test]
async fn ledger_hides_other_users_orders() {
  setup_tracing();
  let shop = Shop::in_memory();
  let owner = shop.customer("rita").await;
  let stranger = shop.customer("sam").await;
  let flute = shop.product("Flute", dec!(60.00), 3).await;

  shop.cart.add_to_cart(owner, flute.id, 1).await.unwrap();
  let first = shop.checkout.checkout(owner).await.unwrap();
  shop.cart.add_to_cart(owner, flute.id, 2).await.unwrap();
  let second = shop.checkout.checkout(owner).await.unwrap();

  let history = shop.ledger.orders_for(owner).await.unwrap();
  assert_eq!(history.len(), 2);
  let ids: Vec<_> = history.iter().map(|r| r.order.id).collect();
  assert!(ids.contains(&first.order.id) && ids.contains(&second.order.id));
  assert!(history[0].order.created_at >= history[1].order.created_at);

  assert!(matches!(
    shop.ledger.order_for(stranger, first.order.id).await,
    Err(StoreError::NotFound { entity: "order", .. })
  ));
  assert!(shop.ledger.orders_for(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn catalog_writes_retry_transient_failures() {
  setup_tracing();
  let memory = MemoryStore::new();
  let seed = Shop::over(Arc::new(memory.clone()));
  let lamp = seed.product("Lamp", dec!(12.00), 4).await;

  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::TransientBegins(2)));
  let catalog = Catalog::with_retry(store.clone(), fast_retry());
  let updated = catalog
    .update_product(
      lamp.id,
      ProductPatch {
        stock: Some(9),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(updated.stock, 9);
  assert_eq!(store.begin_calls(), 3);

  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::TransientBegins(2)));
  let catalog = Catalog::with_retry(store.clone(), fast_retry());
  catalog.delete_product(lamp.id).await.unwrap();
  assert_eq!(store.begin_calls(), 3);
  assert!(seed.catalog.list_products().await.unwrap().is_empty());

  // business failures are not retried
  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::None));
  let catalog = Catalog::with_retry(store.clone(), fast_retry());
  let err = catalog.delete_product(lamp.id).await.unwrap_err();
  assert!(matches!(err, StoreError::NotFound { entity: "product", .. }));
  assert_eq!(store.begin_calls(), 1);
}
