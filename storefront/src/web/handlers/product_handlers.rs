// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use emporium::models::{NewProduct, Product, ProductPatch, ProductSummary};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, ManagerUser};

fn is_manager(caller: &Option<AuthenticatedUser>) -> bool {
  caller.as_ref().is_some_and(|c| c.user.is_manager)
}

/// Managers see stock and timestamps; everyone else gets the customer summary.
fn product_view(product: &Product, manager: bool) -> serde_json::Value {
  if manager {
    json!(product)
  } else {
    json!(product.summary())
  }
}

#[instrument(name = "handler::list_products", skip(app_state, caller))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  caller: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.list_products().await?;
  info!(count = products.len(), "Products fetched.");
  if is_manager(&caller) {
    Ok(HttpResponse::Ok().json(products))
  } else {
    let summaries: Vec<ProductSummary> = products.iter().map(Product::summary).collect();
    Ok(HttpResponse::Ok().json(summaries))
  }
}

#[instrument(name = "handler::get_product", skip(app_state, path, caller), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product_view(&product, is_manager(&caller))))
}

// Body errors are held back until the role check has passed.
#[instrument(name = "handler::create_product", skip(app_state, payload, _manager))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  _manager: ManagerUser,
  payload: Result<web::Json<NewProduct>, AppError>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.create_product(payload?.into_inner()).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, path, payload, _manager), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _manager: ManagerUser,
  payload: Result<web::Json<ProductPatch>, AppError>,
) -> Result<HttpResponse, AppError> {
  let patch = payload?.into_inner();
  let product = app_state
    .catalog
    .update_product(path.into_inner(), patch)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Product updated.",
      "updated_product": product,
  })))
}

#[instrument(name = "handler::delete_product", skip(app_state, path, _manager), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _manager: ManagerUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.delete_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Product deleted successfully.",
      "deleted_product": product,
  })))
}
