// storefront/src/services/mod.rs

pub mod accounts;
pub mod auth_service;
pub mod seed;
pub mod session_store;
