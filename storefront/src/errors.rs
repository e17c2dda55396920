// storefront/src/errors.rs

use actix_web::{error::JsonPayloadError, HttpRequest, HttpResponse, ResponseError};
use emporium::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  /// Missing or invalid credentials / session.
  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Store Error: {source}")]
  Store {
    #[from]
    source: StoreError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

/// Extractor failures taken as `Result<web::Json<T>, AppError>` handler parameters. The JSON
/// error handler has already turned them into a client message.
impl From<actix_web::Error> for AppError {
  fn from(err: actix_web::Error) -> Self {
    AppError::Validation(err.to_string())
  }
}

impl AppError {
  /// Message suitable for the client. Storage and configuration details stay in the logs.
  fn client_message(&self) -> String {
    match self {
      AppError::Store { source } => match source {
        StoreError::NotFound { entity, .. } => not_found_message(entity),
        other if other.is_business_rule() => other.to_string(),
        _ => "Database operation failed".to_string(),
      },
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
      other => other.to_string(),
    }
  }
}

fn not_found_message(entity: &str) -> String {
  match entity {
    "product" => "Product not found.".to_string(),
    "cart item" => "This product is not in your cart.".to_string(),
    "order" => "Order not found.".to_string(),
    "user" => "Account not found.".to_string(),
    other => format!("{} not found.", other),
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Store { source } => match source {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        other if other.is_business_rule() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Log the full error when it's turned into a response
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "error": self.client_message() }))
  }
}

/// Turns malformed JSON bodies into the same `{"error": ...}` shape as everything else.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid request body: {}", err)).into()
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
