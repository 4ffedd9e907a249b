//! Server-side login sessions.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tickbox_api::v1::UserId;
use tokio::sync::Mutex;

pub const COOKIE_NAME: &str = "tickbox_session";

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn from_cookie(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// tokens are credentials, keep them out of logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Clone, Copy, Debug)]
struct Session {
    user: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Sessions {
    ttl: Duration,
    sessions: Mutex<HashMap<SessionToken, Session>>,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a new session for `user`.
    pub async fn login(&self, user: UserId) -> SessionToken {
        let now = Utc::now();
        let token = SessionToken::generate();

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );

        tracing::info!(user = %user, "session started");
        token
    }

    /// Looks up the user behind `token`, extending the session on success.
    pub async fn resolve(&self, token: &SessionToken) -> Option<UserId> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;

        let session = sessions.get_mut(token)?;
        if session.expires_at <= now {
            sessions.remove(token);
            return None;
        }

        session.expires_at = now + self.ttl;
        Some(session.user)
    }

    pub async fn logout(&self, token: &SessionToken) {
        if let Some(session) = self.sessions.lock().await.remove(token) {
            tracing::info!(user = %session.user, "session ended");
        }
    }
}
