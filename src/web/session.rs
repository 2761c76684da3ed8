//! Server-side sessions for the web frontend.
//!
//! The browser only holds an opaque random id in the `session` cookie. Session
//! data lives in memory and is lost on restart.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const SESSION_COOKIE_NAME: &str = "session";

/// How long a session stays valid after login.
pub const SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    /// Client IP at login time
    pub ip: String,
    pub expires_at: Instant,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared in-memory session table.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    lifetime: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_LIFETIME)
    }
}

impl SessionStore {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Start a session and return its id.
    pub async fn create(&self, user_id: i64, ip: &str) -> String {
        let id = new_session_id();
        let session = Session {
            user_id,
            ip: ip.to_string(),
            expires_at: Instant::now() + self.lifetime,
        };
        self.sessions.write().await.insert(id.clone(), session);
        id
    }

    /// Live session for `id`. Expired sessions are removed on access.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().await.remove(id);
        None
    }

    /// Returns true if a session was removed.
    pub async fn destroy(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// 32 random bytes, base64url without padding.
fn new_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn session_cookie(id: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE_NAME,
        id,
        lifetime.as_secs()
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE_NAME
    )
}
