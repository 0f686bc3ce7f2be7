//! Refresh session model - long-lived, revocable login sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Refresh session entity. Only the fingerprint of the secret is kept.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: i64,
    pub restaurant_id: i64,
    pub admin_email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip: String,
    pub user_agent: String,
    pub revoked: bool,
}

impl RefreshSession {
    /// A session without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }

    /// Check if session can still be exchanged (not expired, not revoked).
    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

/// Values for a session row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub restaurant_id: i64,
    pub admin_email: String,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip: String,
    pub user_agent: String,
}

/// Session info for API responses.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: i64,
    pub restaurant_id: i64,
    pub admin_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip: String,
    pub user_agent: String,
    pub revoked: bool,
    pub is_current: bool,
}

impl From<RefreshSession> for SessionInfo {
    fn from(s: RefreshSession) -> Self {
        Self {
            id: s.id,
            restaurant_id: s.restaurant_id,
            admin_email: s.admin_email,
            created_at: s.created_at,
            expires_at: s.expires_at,
            ip: s.ip,
            user_agent: s.user_agent,
            revoked: s.revoked,
            is_current: false, // Set by caller
        }
    }
}
