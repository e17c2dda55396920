// core/src/lib.rs

//! Emporium: the storage and transaction core of a small storefront.
//!
//! The crate owns four pieces of state and the rules that tie them together:
//!  - a product catalog with non-negative stock counters,
//!  - per-user carts whose quantities are advisory,
//!  - an append-only order ledger,
//!  - user accounts, consumed by the HTTP layer for authentication.
//!
//! The interesting part is [`CheckoutEngine::checkout`]: it turns a cart into an order and
//! decrements stock as one unit of work, so concurrent buyers of a scarce product can never
//! drive its stock below zero and a failed checkout leaves nothing behind.
//!
//! Storage sits behind the [`Store`] / [`UnitOfWork`] traits, with a PostgreSQL implementation
//! ([`PgStore`]) and an in-process one ([`MemoryStore`]) used for tests and local runs.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod models;
pub mod money;
pub mod orders;
pub mod retry;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::cart::{CartAddition, CartRemoval, CartService};
pub use crate::catalog::Catalog;
pub use crate::checkout::CheckoutEngine;
pub use crate::error::{StoreError, StoreResult};
pub use crate::money::Money;
pub use crate::orders::OrderLedger;
pub use crate::retry::RetryPolicy;
pub use crate::store::{
  CartRepository, MemoryStore, OrderRepository, PgStore, ProductRepository, Store, UnitOfWork, UserRepository,
};
