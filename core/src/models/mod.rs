// core/src/models/mod.rs

//! Records persisted by a [`Store`](crate::store::Store) and the values derived from them.

pub mod bill;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use bill::{Bill, BillLine};
pub use cart::{CartEntry, CartLine};
pub use order::{Order, OrderLine, OrderRecord, PlacedOrder};
pub use product::{NewProduct, Product, ProductPatch, ProductSummary};
pub use user::User;
