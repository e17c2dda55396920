// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use emporium::models::OrderRecord;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// What the cart would cost right now. Nothing is reserved.
#[instrument(name = "handler::preview_checkout", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn preview_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let bill = app_state.cart.preview_bill(auth_user.user_id()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "bill": bill.lines,
      "total": bill.total,
  })))
}

#[instrument(name = "handler::checkout", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let placed = app_state.checkout.checkout(auth_user.user_id()).await?;
  info!(order_id = %placed.order.id, total = %placed.order.total_amount, "Checkout completed.");

  let order = OrderRecord {
    order: placed.order,
    items: placed.lines,
  };
  Ok(HttpResponse::Created().json(json!({
      "message": "Your order is placed successfully.",
      "order": order,
      "bill": placed.bill.lines,
      "total": placed.bill.total,
  })))
}
