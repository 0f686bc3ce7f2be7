//! Refresh session lifecycle: issue, resolve, rotate, revoke, clean up.

use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::models::{NewRefreshSession, RefreshSession};

use super::error::ServiceError;
use super::metrics::record_session_event;
use super::secret::{fingerprint, generate_secret, RawSecret, SECRET_BYTES};
use super::store::{SessionRotation, SessionStore};

/// Listing cap applied when the caller passes a non-positive limit.
pub const DEFAULT_LIST_LIMIT: i64 = 200;

/// Where a request came from, stored on the session row.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
}

impl ClientContext {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// A freshly created session and the raw secret that unlocks it.
/// The raw value is never stored; hand it to the client once.
#[derive(Debug)]
pub struct IssuedSession {
    pub raw: RawSecret,
    pub session: RefreshSession,
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Insert one new session row. `ttl: None` yields a session that never expires.
    #[tracing::instrument(skip(self, client))]
    pub async fn create(
        &self,
        restaurant_id: i64,
        email: &str,
        client: &ClientContext,
        ttl: Option<Duration>,
    ) -> Result<IssuedSession, ServiceError> {
        let raw = generate_secret(SECRET_BYTES)?;

        let session = self
            .store
            .insert_session(NewRefreshSession {
                restaurant_id,
                admin_email: email.to_string(),
                token_hash: fingerprint(raw.expose_secret()),
                expires_at: ttl.map(|ttl| Utc::now() + ttl),
                ip: client.ip.clone(),
                user_agent: client.user_agent.clone(),
            })
            .await?;

        record_session_event("login", 1);
        tracing::info!(session_id = session.id, restaurant_id, "Refresh session created");

        Ok(IssuedSession { raw, session })
    }

    /// Look up by fingerprint regardless of state.
    pub async fn find(&self, raw: &str) -> Result<RefreshSession, ServiceError> {
        self.store
            .find_session_by_hash(&fingerprint(raw))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Like `find`, but only a live session resolves.
    pub async fn resolve_live(&self, raw: &str) -> Result<RefreshSession, ServiceError> {
        match self.store.find_session_by_hash(&fingerprint(raw)).await? {
            Some(session) if session.is_valid() => Ok(session),
            _ => Err(ServiceError::InvalidSession),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<RefreshSession, ServiceError> {
        self.store
            .find_session_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Idempotent: revoking an already revoked session succeeds.
    pub async fn revoke(&self, id: i64) -> Result<(), ServiceError> {
        if !self.store.revoke_session(id).await? {
            return Err(ServiceError::NotFound);
        }

        record_session_event("revoke", 1);
        tracing::info!(session_id = id, "Refresh session revoked");
        Ok(())
    }

    pub async fn revoke_by_raw(&self, raw: &str) -> Result<RefreshSession, ServiceError> {
        let session = self.find(raw).await?;
        self.revoke(session.id).await?;
        Ok(session)
    }

    /// Exchange a live secret for a new one. Returns the retired row and the
    /// new session. Unknown, revoked, expired, or already rotated secrets
    /// fail with `InvalidSession`.
    #[tracing::instrument(skip(self, old_raw, client))]
    pub async fn rotate(
        &self,
        old_raw: &str,
        client: &ClientContext,
        ttl: Option<Duration>,
    ) -> Result<(RefreshSession, IssuedSession), ServiceError> {
        let raw = generate_secret(SECRET_BYTES)?;

        let rotated = self
            .store
            .rotate_session(
                &fingerprint(old_raw),
                SessionRotation {
                    token_hash: fingerprint(raw.expose_secret()),
                    expires_at: ttl.map(|ttl| Utc::now() + ttl),
                    ip: client.ip.clone(),
                    user_agent: client.user_agent.clone(),
                },
            )
            .await?;

        let Some((previous, session)) = rotated else {
            tracing::info!("Refresh rejected: session unknown, revoked, expired or already rotated");
            return Err(ServiceError::InvalidSession);
        };

        record_session_event("rotate", 1);
        tracing::info!(
            previous_session_id = previous.id,
            session_id = session.id,
            "Refresh session rotated"
        );

        Ok((previous, IssuedSession { raw, session }))
    }

    /// Newest first. A non-positive limit falls back to `DEFAULT_LIST_LIMIT`.
    pub async fn list(
        &self,
        restaurant_id: i64,
        email: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RefreshSession>, ServiceError> {
        let limit = if limit <= 0 { DEFAULT_LIST_LIMIT } else { limit };
        self.store.list_sessions(restaurant_id, email, limit).await
    }

    pub async fn revoke_all_except(
        &self,
        restaurant_id: i64,
        email: &str,
        keep_id: Option<i64>,
    ) -> Result<u64, ServiceError> {
        let revoked = self
            .store
            .revoke_sessions_except(restaurant_id, email, keep_id)
            .await?;

        record_session_event("revoke", revoked);
        Ok(revoked)
    }

    /// Delete rows revoked, or expired, more than `retention_days` ago.
    /// Live sessions are never touched.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup(&self, retention_days: i64) -> Result<u64, ServiceError> {
        if retention_days < 0 {
            return Err(ServiceError::Validation(
                "Retention must not be negative".to_string(),
            ));
        }

        let threshold = Utc::now() - Duration::days(retention_days);
        let deleted = self.store.delete_stale_sessions(threshold).await?;

        record_session_event("cleanup", deleted);
        tracing::info!(deleted, retention_days, "Stale refresh sessions removed");
        Ok(deleted)
    }
}
