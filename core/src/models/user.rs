// core/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub email: String,
  pub phone_number: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_active: bool,
  pub is_manager: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn new(username: String, email: String, phone_number: String, password_hash: String) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      username,
      email,
      phone_number,
      password_hash,
      is_active: true,
      is_manager: false,
      created_at: now,
      updated_at: now,
    }
  }
}
