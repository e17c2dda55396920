// storefront/src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::accounts::{ProfileUpdate, Registration};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::register", skip(app_state, payload), fields(username = %payload.username))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<Registration>,
) -> Result<HttpResponse, AppError> {
  let user = app_state.accounts.register(payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(json!({
      "message": "Account created successfully.",
      "user": user,
  })))
}

#[instrument(name = "handler::profile", skip_all, fields(user_id = %auth_user.user_id()))]
pub async fn profile_handler(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(auth_user.user)
}

#[instrument(name = "handler::update_profile", skip(app_state, payload, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: Result<web::Json<ProfileUpdate>, AppError>,
) -> Result<HttpResponse, AppError> {
  let update = payload?.into_inner();
  let user = app_state
    .accounts
    .update_profile(auth_user.user_id(), update)
    .await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Updated successfully",
      "data": user,
  })))
}

#[instrument(name = "handler::delete_account", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn delete_account_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.accounts.delete_account(auth_user.user_id()).await?;
  let revoked = app_state.sessions.revoke_user(auth_user.user_id());
  info!(revoked, "Sessions revoked after account deletion.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Account deleted successfully" })))
}
