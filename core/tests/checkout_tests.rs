// tests/checkout_tests.rs
mod common;
use common::*;

use std::sync::Arc;

use emporium::{CheckoutEngine, MemoryStore, Money, RetryPolicy, StoreError};
use rust_decimal_macros::dec;
use serial_test::serial;

#[tokio::test]
async fn checkout_places_order_decrements_stock_and_clears_cart() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("alice").await;
  let mug = shop.product("Mug", dec!(7.25), 5).await;

  shop.cart.add_to_cart(user, mug.id, 3).await.unwrap();
  let placed = shop.checkout.checkout(user).await.unwrap();

  assert_eq!(placed.order.user_id, user);
  assert_eq!(placed.order.total_amount, Money::new(dec!(21.75)));
  assert_eq!(placed.lines.len(), 1);
  assert_eq!(placed.lines[0].quantity, 3);
  assert_eq!(placed.lines[0].price_per_item, mug.price);
  assert_eq!(placed.lines[0].product_name, "Mug");
  assert_eq!(placed.bill.total, placed.order.total_amount);

  assert_eq!(shop.stock_of(mug.id).await, 2);
  assert!(shop.cart_lines(user).await.is_empty());
  assert_eq!(shop.order_count(user).await, 1);
}

#[tokio::test]
async fn insufficient_stock_changes_nothing() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("bob").await;
  let scarce = shop.product("Scarce", dec!(10.00), 5).await;

  shop.cart.add_to_cart(user, scarce.id, 3).await.unwrap();
  shop
    .catalog
    .update_product(
      scarce.id,
      emporium::models::ProductPatch {
        stock: Some(2),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  match shop.checkout.checkout(user).await {
    Err(StoreError::InsufficientStock {
      product_id,
      requested,
      available,
      ..
    }) => {
      assert_eq!(product_id, scarce.id);
      assert_eq!(requested, 3);
      assert_eq!(available, 2);
    }
    other => panic!("Expected InsufficientStock, got {:?}", other),
  }

  assert_eq!(shop.stock_of(scarce.id).await, 2);
  let cart = shop.cart_lines(user).await;
  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].quantity, 3);
  assert_eq!(shop.order_count(user).await, 0);
}

#[tokio::test]
async fn one_short_line_blocks_the_whole_cart() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("carol").await;
  let plenty = shop.product("Plenty", dec!(1.00), 100).await;
  let short = shop.product("Short", dec!(3.00), 4).await;

  shop.cart.add_to_cart(user, plenty.id, 10).await.unwrap();
  shop.cart.add_to_cart(user, short.id, 4).await.unwrap();
  shop
    .catalog
    .update_product(
      short.id,
      emporium::models::ProductPatch {
        stock: Some(1),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  let err = shop.checkout.checkout(user).await.unwrap_err();
  assert!(matches!(err, StoreError::InsufficientStock { product_id, .. } if product_id == short.id));

  // The satisfiable line was not bought either.
  assert_eq!(shop.stock_of(plenty.id).await, 100);
  assert_eq!(shop.stock_of(short.id).await, 1);
  assert_eq!(shop.cart_lines(user).await.len(), 2);
  assert_eq!(shop.order_count(user).await, 0);
}

#[tokio::test]
async fn failed_checkout_fails_the_same_way_again() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("dave").await;
  let lamp = shop.product("Lamp", dec!(30.00), 3).await;
  shop.cart.add_to_cart(user, lamp.id, 3).await.unwrap();
  shop
    .catalog
    .update_product(
      lamp.id,
      emporium::models::ProductPatch {
        stock: Some(1),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  let first = shop.checkout.checkout(user).await.unwrap_err().to_string();
  let second = shop.checkout.checkout(user).await.unwrap_err().to_string();
  assert_eq!(first, second);
  assert_eq!(shop.stock_of(lamp.id).await, 1);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("erin").await;
  let err = shop.checkout.checkout(user).await.unwrap_err();
  assert!(matches!(err, StoreError::EmptyCart));
  assert_eq!(err.to_string(), "Cart is empty");
}

#[tokio::test]
async fn order_keeps_price_paid_after_catalog_changes() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("frank").await;
  let pen = shop.product("Pen", dec!(1.10), 10).await;
  let pad = shop.product("Pad", dec!(2.05), 10).await;

  shop.cart.add_to_cart(user, pen.id, 3).await.unwrap();
  shop.cart.add_to_cart(user, pad.id, 2).await.unwrap();
  let placed = shop.checkout.checkout(user).await.unwrap();
  assert_eq!(placed.order.total_amount, Money::new(dec!(7.40)));

  let line_sum: Money = placed.lines.iter().map(|line| line.amount()).sum();
  assert_eq!(line_sum, placed.order.total_amount);

  shop
    .catalog
    .update_product(
      pen.id,
      emporium::models::ProductPatch {
        price: Some(dec!(99.99)),
        name: Some("Fancy pen".to_string()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  shop.catalog.delete_product(pad.id).await.unwrap();

  let record = shop.ledger.order_for(user, placed.order.id).await.unwrap();
  assert_eq!(record.items.len(), 2);
  assert_eq!(record.items[0].product_name, "Pen");
  assert_eq!(record.items[0].price_per_item, Money::new(dec!(1.10)));
  assert_eq!(record.items[1].product_name, "Pad");
  assert_eq!(record.bill().total, Money::new(dec!(7.40)));
}

#[tokio::test]
async fn failure_after_writes_rolls_everything_back() {
  setup_tracing();
  let memory = MemoryStore::new();
  let seed = Shop::over(Arc::new(memory.clone()));
  let user = seed.customer("grace").await;
  let book = seed.product("Book", dec!(12.00), 4).await;
  let pencil = seed.product("Pencil", dec!(0.50), 40).await;
  seed.cart.add_to_cart(user, book.id, 2).await.unwrap();
  seed.cart.add_to_cart(user, pencil.id, 10).await.unwrap();

  let faulty = Shop::over(Arc::new(FaultyStore::new(memory.clone(), Fault::CartCleanup)));
  let err = faulty.checkout.checkout(user).await.unwrap_err();
  assert!(matches!(err, StoreError::Internal(_)));

  assert_eq!(seed.stock_of(book.id).await, 4);
  assert_eq!(seed.stock_of(pencil.id).await, 40);
  assert_eq!(seed.cart_lines(user).await.len(), 2);
  assert_eq!(seed.order_count(user).await, 0);
}

#[tokio::test]
async fn reservation_failure_midway_rolls_back_earlier_lines() {
  setup_tracing();
  let memory = MemoryStore::new();
  let seed = Shop::over(Arc::new(memory.clone()));
  let user = seed.customer("heidi").await;
  let first = seed.product("First", dec!(5.00), 5).await;
  let second = seed.product("Second", dec!(6.00), 5).await;
  seed.cart.add_to_cart(user, first.id, 1).await.unwrap();
  seed.cart.add_to_cart(user, second.id, 1).await.unwrap();

  let faulty = Shop::over(Arc::new(FaultyStore::new(memory.clone(), Fault::Reserve(second.id))));
  let err = faulty.checkout.checkout(user).await.unwrap_err();
  assert!(matches!(err, StoreError::NotFound { .. }));

  assert_eq!(seed.stock_of(first.id).await, 5);
  assert_eq!(seed.stock_of(second.id).await, 5);
  assert_eq!(seed.cart_lines(user).await.len(), 2);
  assert_eq!(seed.order_count(user).await, 0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
  setup_tracing();
  let memory = MemoryStore::new();
  let seed = Shop::over(Arc::new(memory.clone()));
  let user = seed.customer("ivan").await;
  let cup = seed.product("Cup", dec!(4.00), 2).await;
  seed.cart.add_to_cart(user, cup.id, 2).await.unwrap();

  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::TransientBegins(2)));
  let engine = CheckoutEngine::with_retry(store.clone(), fast_retry());
  let placed = engine.checkout(user).await.unwrap();

  assert_eq!(store.begin_calls(), 3);
  assert_eq!(placed.order.total_amount, Money::new(dec!(8.00)));
  assert_eq!(seed.stock_of(cup.id).await, 0);
}

#[tokio::test]
async fn transient_failures_surface_when_attempts_run_out() {
  setup_tracing();
  let memory = MemoryStore::new();
  let seed = Shop::over(Arc::new(memory.clone()));
  let user = seed.customer("judy").await;
  let cup = seed.product("Cup", dec!(4.00), 2).await;
  seed.cart.add_to_cart(user, cup.id, 1).await.unwrap();

  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::AlwaysTransient));
  let engine = CheckoutEngine::with_retry(store.clone(), fast_retry());
  let err = engine.checkout(user).await.unwrap_err();

  assert!(err.is_transient());
  assert_eq!(store.begin_calls(), 3);
  assert_eq!(seed.stock_of(cup.id).await, 2);

  let store = Arc::new(FaultyStore::new(memory.clone(), Fault::AlwaysTransient));
  let engine = CheckoutEngine::with_retry(store.clone(), RetryPolicy::no_retry());
  assert!(engine.checkout(user).await.is_err());
  assert_eq!(store.begin_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn two_buyers_racing_for_the_same_stock() {
  setup_tracing();
  let shop = Arc::new(Shop::in_memory());
  let widget = shop.product("Widget", dec!(9.99), 5).await;
  let alice = shop.customer("racer one").await;
  let bob = shop.customer("racer two").await;
  shop.cart.add_to_cart(alice, widget.id, 3).await.unwrap();
  shop.cart.add_to_cart(bob, widget.id, 3).await.unwrap();

  let a = {
    let shop = shop.clone();
    tokio::spawn(async move { shop.checkout.checkout(alice).await })
  };
  let b = {
    let shop = shop.clone();
    tokio::spawn(async move { shop.checkout.checkout(bob).await })
  };
  let results = [a.await.unwrap(), b.await.unwrap()];

  let succeeded = results.iter().filter(|r| r.is_ok()).count();
  assert_eq!(succeeded, 1);
  let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
  assert!(matches!(
    failure,
    StoreError::InsufficientStock {
      requested: 3,
      available: 2,
      ..
    }
  ));
  assert_eq!(shop.stock_of(widget.id).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn many_buyers_for_the_last_units_exactly_one_wins() {
  setup_tracing();
  const BUYERS: usize = 16;
  let shop = Arc::new(Shop::in_memory());
  let ticket = shop.product("Ticket", dec!(50.00), 4).await;

  let mut buyers = Vec::with_capacity(BUYERS);
  for i in 0..BUYERS {
    let name = format!("buyer {}", (b'a' + i as u8) as char);
    let user = shop.customer(&name).await;
    shop.cart.add_to_cart(user, ticket.id, 4).await.unwrap();
    buyers.push(user);
  }

  let handles: Vec<_> = buyers
    .iter()
    .map(|&user| {
      let shop = shop.clone();
      tokio::spawn(async move { shop.checkout.checkout(user).await })
    })
    .collect();

  let mut wins = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(placed) => {
        wins += 1;
        assert_eq!(placed.order.total_amount, Money::new(dec!(200.00)));
      }
      Err(StoreError::InsufficientStock { available, .. }) => assert_eq!(available, 0),
      Err(other) => panic!("Unexpected checkout failure: {:?}", other),
    }
  }
  assert_eq!(wins, 1);
  assert_eq!(shop.stock_of(ticket.id).await, 0);

  let mut orders = 0;
  for user in buyers {
    orders += shop.order_count(user).await;
  }
  assert_eq!(orders, 1);
}

#[tokio::test]
async fn oversized_order_total_is_rejected_without_writes() {
  setup_tracing();
  let shop = Shop::in_memory();
  let user = shop.customer("whale").await;
  let mut ids = Vec::new();
  for name in ["Yacht", "Jet", "Island", "Castle", "Tower"] {
    let product = shop.product(name, dec!(99999999.99), i32::MAX).await;
    shop.cart.add_to_cart(user, product.id, i64::from(i32::MAX)).await.unwrap();
    ids.push(product.id);
  }

  let err = shop.checkout.checkout(user).await.unwrap_err();
  assert!(matches!(err, StoreError::Validation(_)), "{err:?}");
  assert!(err.to_string().contains("exceeds the maximum"));
  for id in ids {
    assert_eq!(shop.stock_of(id).await, i32::MAX);
  }
  assert_eq!(shop.cart_lines(user).await.len(), 5);
  assert_eq!(shop.order_count(user).await, 0);
}
