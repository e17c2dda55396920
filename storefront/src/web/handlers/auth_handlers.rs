// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub username: String,
  #[serde(default)]
  pub password: String,
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(username = %payload.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let user = app_state
    .accounts
    .authenticate(&payload.username, &payload.password)
    .await?;
  let token = app_state.sessions.issue(user.id);
  info!(user_id = %user.id, "Login successful.");

  Ok(HttpResponse::Ok().json(json!({
      "message": "Login successful",
      "token": token,
      "user": user,
  })))
}

#[instrument(name = "handler::logout", skip(app_state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.sessions.revoke(&auth_user.token);
  info!("Logout successful.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Logout successful" })))
}

#[instrument(name = "handler::session", skip_all)]
pub async fn session_handler(auth_user: Option<AuthenticatedUser>) -> HttpResponse {
  match auth_user {
    Some(caller) => HttpResponse::Ok().json(json!({ "logged_in_as": caller.user.username })),
    None => HttpResponse::Ok().json(json!({ "message": "No account is logged in now. Login now" })),
  }
}
