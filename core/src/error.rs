// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{0}")]
  Validation(String),

  #[error("Quantity must be greater than 0 (got {quantity})")]
  InvalidQuantity { quantity: i64 },

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  /// Advisory rejection at cart time; stock may still change before checkout.
  #[error("You can't purchase more than {available} of {product_name}.")]
  OutOfStock {
    product_id: Uuid,
    product_name: String,
    requested: i32,
    available: i32,
  },

  /// Binding rejection raised inside the checkout unit of work.
  #[error("Not enough stock for {product_name}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    product_name: String,
    requested: i32,
    available: i32,
  },

  #[error("You have only {in_cart} of this item in your cart.")]
  InsufficientCartQuantity {
    product_id: Uuid,
    requested: i32,
    in_cart: i32,
  },

  #[error("Cart is empty")]
  EmptyCart,

  #[error("{0}")]
  Conflict(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Storage backend error. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal store error: {0}")]
  Internal(String),
}

impl StoreError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    StoreError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  /// True for failures worth re-running a whole unit of work for: lock contention,
  /// serialization failures and connection trouble. Business rule violations never are.
  pub fn is_transient(&self) -> bool {
    match self {
      StoreError::Database(sqlx_error) => match sqlx_error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Protocol(_) => true,
        sqlx::Error::Database(db_err) => matches!(
          db_err.code().as_deref(),
          Some("40001") // serialization_failure
            | Some("40P01") // deadlock_detected
            | Some("55P03") // lock_not_available
            | Some("53300") // too_many_connections
        ),
        _ => false,
      },
      _ => false,
    }
  }

  /// True for outcomes the caller can fix (bad input, stock conflicts, missing rows).
  pub fn is_business_rule(&self) -> bool {
    matches!(
      self,
      StoreError::Validation(_)
        | StoreError::InvalidQuantity { .. }
        | StoreError::NotFound { .. }
        | StoreError::OutOfStock { .. }
        | StoreError::InsufficientStock { .. }
        | StoreError::InsufficientCartQuantity { .. }
        | StoreError::EmptyCart
        | StoreError::Conflict(_)
    )
  }
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
