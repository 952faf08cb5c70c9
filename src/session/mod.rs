//! Admin session guard.
//!
//! The session is a JSON value persisted under [`SESSION_KEY`] with a fixed
//! expiry. Every failure while inspecting it (missing, corrupt, expired,
//! unreadable storage) leaves the guard unauthenticated.

mod sign_in;
mod storage;

pub use sign_in::*;
pub use storage::*;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::AdminUser;

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "admin_session";

/// Sign-in route unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

/// The signed-in admin as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<&AdminUser> for SessionUser {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// A signed-in session. `expires_at` is epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub expires_at: i64,
}

impl Session {
    pub fn new(user: SessionUser, ttl: Duration, now_ms: i64) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            user,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    /// Valid only while `now < expiresAt`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Read and validate the stored session. Corrupt and expired values are
/// removed from storage before the error is returned.
pub fn inspect(storage: &dyn SessionStorage, now_ms: i64) -> AppResult<Session> {
    let raw = storage
        .get(SESSION_KEY)?
        .ok_or_else(|| AppError::SessionInvalid("No admin session".to_string()))?;

    let session: Session = match serde_json::from_str(&raw) {
        Ok(session) => session,
        Err(e) => {
            storage.remove(SESSION_KEY)?;
            return Err(AppError::SessionInvalid(format!("Corrupt admin session: {}", e)));
        }
    };

    if !session.is_valid_at(now_ms) {
        storage.remove(SESSION_KEY)?;
        return Err(AppError::SessionInvalid("Admin session expired".to_string()));
    }

    Ok(session)
}

/// `/login?redirect=<path>`, or plain `/login` when there is nothing to
/// return to.
pub fn login_redirect(requested: &str) -> String {
    let requested = requested.trim();
    if requested.is_empty() || requested == "/" || requested.starts_with(LOGIN_PATH) {
        return LOGIN_PATH.to_string();
    }
    format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(requested))
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardState {
    Loading,
    Authenticated(Session),
    Unauthenticated { redirect_to: String },
}

/// Gate in front of the protected admin views.
pub struct SessionGuard {
    storage: Arc<dyn SessionStorage>,
    requested: String,
    state: GuardState,
}

impl SessionGuard {
    /// `requested` is the location the visitor was trying to reach.
    pub fn new(storage: Arc<dyn SessionStorage>, requested: impl Into<String>) -> Self {
        Self {
            storage,
            requested: requested.into(),
            state: GuardState::Loading,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn resolve(&mut self) -> &GuardState {
        self.resolve_at(now_ms())
    }

    /// Leave `Loading` exactly once; later calls return the settled state.
    pub fn resolve_at(&mut self, now_ms: i64) -> &GuardState {
        if self.state == GuardState::Loading {
            self.state = match inspect(self.storage.as_ref(), now_ms) {
                Ok(session) => GuardState::Authenticated(session),
                Err(e) => {
                    tracing::debug!("Admin access denied: {}", e);
                    GuardState::Unauthenticated {
                        redirect_to: login_redirect(&self.requested),
                    }
                }
            };
        }
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            GuardState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}
