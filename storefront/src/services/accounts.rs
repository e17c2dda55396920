// storefront/src/services/accounts.rs

//! Customer and manager accounts: registration, login checks, profile edits.

use std::sync::Arc;

use chrono::Utc;
use emporium::models::User;
use emporium::{Store, UserRepository};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ManagerBootstrap;
use crate::errors::{AppError, Result};
use crate::services::auth_service::{hash_password, verify_password};

pub const USERNAME_MAX_CHARS: usize = 50;
pub const PHONE_DIGITS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub username: String,
  pub email: String,
  pub phone_number: String,
  #[serde(default)]
  pub password: String,
}

/// Partial profile update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub username: Option<String>,
  pub email: Option<String>,
  pub phone_number: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
  store: Arc<dyn Store>,
}

impl AccountService {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  #[instrument(name = "accounts::register", skip(self, registration), fields(username = %registration.username), err(Display))]
  pub async fn register(&self, registration: Registration) -> Result<User> {
    self.create_user(registration, false).await
  }

  async fn create_user(&self, registration: Registration, is_manager: bool) -> Result<User> {
    let username = normalize_username(&registration.username)?;
    let email = normalize_email(&registration.email)?;
    let phone_number = normalize_phone(&registration.phone_number)?;
    if registration.password.is_empty() {
      return Err(AppError::Validation("Password can't be empty".to_string()));
    }

    let mut uow = self.store.begin().await?;
    if uow.find_user_by_username(&username).await?.is_some() {
      return Err(AppError::Validation("Account already exists. Please login".to_string()));
    }
    if uow.find_user_by_email(&email).await?.is_some() {
      return Err(AppError::Validation("Email already exists".to_string()));
    }
    if uow.find_user_by_phone(&phone_number).await?.is_some() {
      return Err(AppError::Validation("Phone number already exists".to_string()));
    }

    let password_hash = hash_password(&registration.password)?;
    let mut user = User::new(username, email, phone_number, password_hash);
    user.is_manager = is_manager;
    uow.insert_user(&user).await?;
    uow.commit().await?;

    info!(user_id = %user.id, is_manager, "Account created.");
    Ok(user)
  }

  /// Checks a username/password pair. Unknown usernames and wrong passwords are told apart,
  /// matching what the login endpoint reports.
  #[instrument(name = "accounts::authenticate", skip(self, password), err(Display))]
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
    let username = collapse_whitespace(username);
    let mut uow = self.store.begin().await?;
    let user = uow
      .find_user_by_username(&username)
      .await?
      .ok_or_else(|| AppError::NotFound("Account does not exist. Please create the account".to_string()))?;
    drop(uow);

    if !user.is_active || !verify_password(&user.password_hash, password)? {
      warn!(user_id = %user.id, "Login rejected.");
      return Err(AppError::Auth("Invalid credentials".to_string()));
    }
    Ok(user)
  }

  #[instrument(name = "accounts::profile", skip(self))]
  pub async fn profile(&self, user_id: Uuid) -> Result<User> {
    let mut uow = self.store.begin().await?;
    uow
      .find_user(user_id)
      .await?
      .ok_or_else(|| AppError::Auth("Please login through your account before accessing this resource.".to_string()))
  }

  #[instrument(name = "accounts::update_profile", skip(self, update), err(Display))]
  pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
    let username = update.username.as_deref().map(normalize_username).transpose()?;
    let email = update.email.as_deref().map(normalize_email).transpose()?;
    let phone_number = update.phone_number.as_deref().map(normalize_phone).transpose()?;

    let mut uow = self.store.begin().await?;
    let mut user = uow
      .find_user(user_id)
      .await?
      .ok_or_else(|| AppError::Auth("Please login through your account before accessing this resource.".to_string()))?;

    if let Some(username) = username {
      if matches!(uow.find_user_by_username(&username).await?, Some(other) if other.id != user_id) {
        return Err(AppError::Validation("Username already exists".to_string()));
      }
      user.username = username;
    }
    if let Some(email) = email {
      if matches!(uow.find_user_by_email(&email).await?, Some(other) if other.id != user_id) {
        return Err(AppError::Validation("Email already in use".to_string()));
      }
      user.email = email;
    }
    if let Some(phone_number) = phone_number {
      if matches!(uow.find_user_by_phone(&phone_number).await?, Some(other) if other.id != user_id) {
        return Err(AppError::Validation("Phone number already in use".to_string()));
      }
      user.phone_number = phone_number;
    }
    user.updated_at = Utc::now();

    uow.save_user(&user).await?;
    uow.commit().await?;
    info!(user_id = %user.id, "Profile updated.");
    Ok(user)
  }

  /// Deletes the account and its cart. Past orders stay in the ledger.
  #[instrument(name = "accounts::delete_account", skip(self), err(Display))]
  pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
    let mut uow = self.store.begin().await?;
    if !uow.delete_user(user_id).await? {
      return Err(AppError::NotFound("Account not found.".to_string()));
    }
    uow.commit().await?;
    info!(%user_id, "Account deleted.");
    Ok(())
  }

  /// Creates the manager account unless one already exists.
  #[instrument(name = "accounts::ensure_manager", skip(self, bootstrap), fields(username = %bootstrap.username))]
  pub async fn ensure_manager(&self, bootstrap: &ManagerBootstrap) -> Result<Option<User>> {
    let mut uow = self.store.begin().await?;
    if let Some(existing) = uow.find_manager().await? {
      info!(user_id = %existing.id, "Manager account already present.");
      return Ok(None);
    }
    drop(uow);

    let registration = Registration {
      username: bootstrap.username.clone(),
      email: bootstrap.email.clone(),
      phone_number: bootstrap.phone_number.clone(),
      password: bootstrap.password.clone(),
    };
    self.create_user(registration, true).await.map(Some)
  }
}

fn collapse_whitespace(raw: &str) -> String {
  raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_username(raw: &str) -> Result<String> {
  let username = collapse_whitespace(raw);
  let invalid = || AppError::Validation("Username is invalid".to_string());

  if username.is_empty() {
    return Err(AppError::Validation("Username can't be empty".to_string()));
  }
  if username.chars().all(|c| c.is_ascii_digit()) {
    return Err(AppError::Validation("Username can't be a number".to_string()));
  }
  if username.contains("..") || username.starts_with('.') || username.ends_with('.') {
    return Err(invalid());
  }
  if !username.chars().all(|c| c.is_alphabetic() || c == ' ' || c == '.') {
    return Err(invalid());
  }
  if username.chars().count() > USERNAME_MAX_CHARS {
    return Err(AppError::Validation(format!(
      "Username must be at most {} characters",
      USERNAME_MAX_CHARS
    )));
  }
  Ok(username)
}

pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  if email.is_empty() {
    return Err(AppError::Validation("Email can't be empty".to_string()));
  }
  let malformed = email.matches('@').count() != 1
    || email.contains(' ')
    || email.starts_with(['.', '-'])
    || email.ends_with(['.', '-'])
    || ["..", "--", ".-", "-."].iter().any(|bad| email.contains(bad));
  if malformed {
    return Err(AppError::Validation("Invalid Email".to_string()));
  }
  Ok(email)
}

pub fn normalize_phone(raw: &str) -> Result<String> {
  let phone = raw.trim();
  if phone.is_empty() {
    return Err(AppError::Validation("Phone number can't be empty".to_string()));
  }
  if phone.len() != PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
    return Err(AppError::Validation("Invalid phone number".to_string()));
  }
  Ok(phone.to_string())
}
