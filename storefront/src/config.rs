// storefront/src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use emporium::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" | "in-memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    }
  }
}

/// Credentials for the single manager account created at startup.
#[derive(Clone)]
pub struct ManagerBootstrap {
  pub username: String,
  pub email: String,
  pub phone_number: String,
  pub password: String,
}

impl std::fmt::Debug for ManagerBootstrap {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ManagerBootstrap")
      .field("username", &self.username)
      .field("email", &self.email)
      .field("phone_number", &self.phone_number)
      .field("password", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  /// Required for the postgres backend only.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  pub checkout_max_attempts: u32,
  pub checkout_retry_base: Duration,
  pub session_ttl: Duration,
  pub log_format: LogFormat,

  // Optional: for seeding DB on startup
  pub seed_db: bool,
  pub manager: Option<ManagerBootstrap>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      database_max_connections: 10,
      run_migrations: true,
      checkout_max_attempts: 3,
      checkout_retry_base: Duration::from_millis(50),
      session_ttl: Duration::from_secs(24 * 60 * 60),
      log_format: LogFormat::Pretty,
      seed_db: false,
      manager: None,
    }
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let defaults = Self::default();

    let server_host = get_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_var("SERVER_PORT", get_env("SERVER_PORT"), defaults.server_port)?;
    let store_backend = match get_env("STORE_BACKEND") {
      Some(raw) => raw.parse::<StoreBackend>()?,
      None => defaults.store_backend,
    };
    let database_url = get_env("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORE_BACKEND=postgres)".to_string(),
      ));
    }
    let database_max_connections = parse_var(
      "DATABASE_MAX_CONNECTIONS",
      get_env("DATABASE_MAX_CONNECTIONS"),
      defaults.database_max_connections,
    )?;
    let run_migrations = parse_var("RUN_MIGRATIONS", get_env("RUN_MIGRATIONS"), defaults.run_migrations)?;

    let checkout_max_attempts = parse_var(
      "CHECKOUT_MAX_ATTEMPTS",
      get_env("CHECKOUT_MAX_ATTEMPTS"),
      defaults.checkout_max_attempts,
    )?;
    if checkout_max_attempts == 0 {
      return Err(AppError::Config("CHECKOUT_MAX_ATTEMPTS must be at least 1".to_string()));
    }
    let retry_base_ms = parse_var("CHECKOUT_RETRY_BASE_MS", get_env("CHECKOUT_RETRY_BASE_MS"), 50u64)?;
    let session_ttl_minutes = parse_var("SESSION_TTL_MINUTES", get_env("SESSION_TTL_MINUTES"), 24 * 60u64)?;
    if session_ttl_minutes == 0 {
      return Err(AppError::Config("SESSION_TTL_MINUTES must be at least 1".to_string()));
    }
    let log_format = match get_env("LOG_FORMAT") {
      Some(raw) => raw.parse::<LogFormat>()?,
      None => defaults.log_format,
    };
    let seed_db = parse_var("SEED_DB", get_env("SEED_DB"), defaults.seed_db)?;

    let manager = match (
      get_env("MANAGER_USERNAME"),
      get_env("MANAGER_EMAIL"),
      get_env("MANAGER_PHONE"),
      get_env("MANAGER_PASSWORD"),
    ) {
      (Some(username), Some(email), Some(phone_number), Some(password)) => Some(ManagerBootstrap {
        username,
        email,
        phone_number,
        password,
      }),
      (None, None, None, None) => None,
      _ => {
        return Err(AppError::Config(
          "MANAGER_USERNAME, MANAGER_EMAIL, MANAGER_PHONE and MANAGER_PASSWORD must be set together".to_string(),
        ))
      }
    };

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      database_max_connections,
      run_migrations,
      checkout_max_attempts,
      checkout_retry_base: Duration::from_millis(retry_base_ms),
      session_ttl: Duration::from_secs(session_ttl_minutes * 60),
      log_format,
      seed_db,
      manager,
    })
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_attempts: self.checkout_max_attempts,
      base_delay: self.checkout_retry_base,
      ..RetryPolicy::default()
    }
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
