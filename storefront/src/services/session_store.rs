// storefront/src/services/session_store.rs

//! In-process bearer-token sessions.
//!
//! Tokens are 32 random bytes, hex encoded. They carry no meaning of their own; the store maps
//! them to a user id and an expiry. Sessions do not survive a restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};
use tracing::debug;
use uuid::Uuid;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Session {
  user_id: Uuid,
  expires_at: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
  sessions: Arc<RwLock<HashMap<String, Session>>>,
  ttl: Duration,
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      sessions: Arc::new(RwLock::new(HashMap::new())),
      ttl,
    }
  }

  /// Starts a session for `user_id` and returns its token.
  pub fn issue(&self, user_id: Uuid) -> String {
    let token = new_token();
    let session = Session {
      user_id,
      expires_at: Instant::now() + self.ttl,
    };
    let mut sessions = self.sessions.write();
    sessions.retain(|_, s| s.expires_at > Instant::now());
    sessions.insert(token.clone(), session);
    debug!(%user_id, active = sessions.len(), "Session issued.");
    token
  }

  /// The user behind `token`, if the session exists and has not expired.
  pub fn resolve(&self, token: &str) -> Option<Uuid> {
    let session = *self.sessions.read().get(token)?;
    if session.expires_at <= Instant::now() {
      self.sessions.write().remove(token);
      return None;
    }
    Some(session.user_id)
  }

  pub fn revoke(&self, token: &str) -> bool {
    self.sessions.write().remove(token).is_some()
  }

  /// Ends every session belonging to `user_id`; returns how many there were.
  pub fn revoke_user(&self, user_id: Uuid) -> usize {
    let mut sessions = self.sessions.write();
    let before = sessions.len();
    sessions.retain(|_, s| s.user_id != user_id);
    before - sessions.len()
  }
}

fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
