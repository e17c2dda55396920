// storefront/src/web/extractors.rs

//! Request-scoped identity. Handlers receive the caller as an explicit argument; nothing about
//! the current user lives in shared state.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use emporium::models::User;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

const LOGIN_REQUIRED: &str = "Please login through your account before accessing this resource.";

/// The logged-in caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user: User,
  pub token: String,
}

impl AuthenticatedUser {
  pub fn user_id(&self) -> uuid::Uuid {
    self.user.id
  }
}

/// An [`AuthenticatedUser`] that is also the store manager.
#[derive(Debug, Clone)]
pub struct ManagerUser(pub AuthenticatedUser);

fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
  let token = token.trim();
  (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth(LOGIN_REQUIRED.to_string()))?;
      let user_id = state.sessions.resolve(&token).ok_or_else(|| {
        warn!("Unknown or expired session token.");
        AppError::Auth(LOGIN_REQUIRED.to_string())
      })?;
      let user = state.accounts.profile(user_id).await?;
      if !user.is_active {
        return Err(AppError::Auth(LOGIN_REQUIRED.to_string()));
      }
      Ok(AuthenticatedUser { user, token })
    })
  }
}

impl FromRequest for ManagerUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let caller = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let caller = caller.await?;
      if !caller.user.is_manager {
        warn!(user_id = %caller.user.id, "Manager-only route refused.");
        return Err(AppError::Forbidden(
          "You do not have permission to perform this action.".to_string(),
        ));
      }
      Ok(ManagerUser(caller))
    })
  }
}
