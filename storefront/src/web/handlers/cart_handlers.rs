// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use emporium::models::{Bill, CartEntry};
use emporium::StoreError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  #[serde(default = "default_add_quantity")]
  pub quantity: i64,
}

fn default_add_quantity() -> i64 {
  1
}

impl Default for AddToCartPayload {
  fn default() -> Self {
    Self {
      quantity: default_add_quantity(),
    }
  }
}

#[derive(Deserialize, Debug, Default)]
pub struct RemoveFromCartPayload {
  #[serde(default)]
  pub quantity: i64,
}

/// Cart bodies are optional; an empty body means "use the defaults".
fn optional_body<T: DeserializeOwned + Default>(body: &web::Bytes) -> Result<T, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(T::default());
  }
  serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, path, body, auth_user),
  fields(user_id = %auth_user.user_id(), product_id = %path.as_ref())
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Bytes,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload: AddToCartPayload = optional_body(&body)?;
  let product_id = path.into_inner();

  let added = app_state
    .cart
    .add_to_cart(auth_user.user_id(), product_id, payload.quantity)
    .await
    .map_err(|err| match err {
      // an unknown product is a bad request here, not a missing route
      StoreError::NotFound { entity: "product", .. } => AppError::Validation("Product not found.".to_string()),
      other => other.into(),
    })?;

  let (mut response, message) = if added.created {
    (HttpResponse::Created(), format!("Added {} to your cart.", added.product.name))
  } else {
    (HttpResponse::Ok(), format!("Updated {} in your cart.", added.product.name))
  };
  Ok(response.json(json!({
      "message": message,
      "quantity": added.quantity,
      "product": added.product.summary(),
  })))
}

#[instrument(
  name = "handler::remove_from_cart",
  skip(app_state, path, body, auth_user),
  fields(user_id = %auth_user.user_id(), product_id = %path.as_ref())
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Bytes,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload: RemoveFromCartPayload = optional_body(&body)?;
  let removal = app_state
    .cart
    .remove_from_cart(auth_user.user_id(), path.into_inner(), payload.quantity)
    .await?;

  if removal.remaining == 0 {
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("All of {} removed from cart.", removal.product_name),
        "remaining_quantity": 0,
    })))
  } else {
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Removed {} of {} from cart.", removal.removed, removal.product_name),
        "remaining_quantity": removal.remaining,
    })))
  }
}

#[instrument(name = "handler::view_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn view_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let items = app_state.cart.list_cart(auth_user.user_id()).await?;
  // one snapshot for both, so the lines and the total always agree
  let bill: Bill = items.iter().map(CartEntry::bill_line).collect();
  info!(lines = items.len(), "Cart fetched.");
  Ok(HttpResponse::Ok().json(json!({
      "items": items,
      "bill": bill.lines,
      "total": bill.total,
  })))
}
