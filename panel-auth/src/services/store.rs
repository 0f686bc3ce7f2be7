//! Persistence seams. `Database` implements these against PostgreSQL,
//! `MemoryStore` in process for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    AdminIdentity, AuditEvent, Invitation, NewRefreshSession, PasswordReset, RefreshSession, Role,
};

use super::error::ServiceError;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_admin(
        &self,
        restaurant_id: i64,
        email: &str,
    ) -> Result<Option<AdminIdentity>, ServiceError>;

    async fn admin_exists(&self, restaurant_id: i64, email: &str) -> Result<bool, ServiceError>;

    /// Insert or replace the identity for (restaurant, email).
    async fn upsert_admin(
        &self,
        restaurant_id: i64,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<AdminIdentity, ServiceError>;
}

/// Replacement session produced by a rotation.
#[derive(Debug, Clone)]
pub struct SessionRotation {
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub ip: String,
    pub user_agent: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(
        &self,
        session: NewRefreshSession,
    ) -> Result<RefreshSession, ServiceError>;

    async fn find_session_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, ServiceError>;

    async fn find_session_by_id(&self, id: i64) -> Result<Option<RefreshSession>, ServiceError>;

    /// Marks the session revoked. Returns false only if no row has this id.
    async fn revoke_session(&self, id: i64) -> Result<bool, ServiceError>;

    /// Atomically revokes the live session with `old_hash` and inserts its
    /// replacement for the same (restaurant, email). `None` when no live
    /// session matched, including when a concurrent rotation got there first.
    async fn rotate_session(
        &self,
        old_hash: &str,
        next: SessionRotation,
    ) -> Result<Option<(RefreshSession, RefreshSession)>, ServiceError>;

    /// Newest first.
    async fn list_sessions(
        &self,
        restaurant_id: i64,
        email: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RefreshSession>, ServiceError>;

    /// Revokes every live session of (restaurant, email) except `keep_id`.
    async fn revoke_sessions_except(
        &self,
        restaurant_id: i64,
        email: &str,
        keep_id: Option<i64>,
    ) -> Result<u64, ServiceError>;

    /// Deletes sessions that are (revoked and created before `threshold`) or
    /// expired before `threshold`.
    async fn delete_stale_sessions(&self, threshold: DateTime<Utc>) -> Result<u64, ServiceError>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Insert or overwrite the invitation for (restaurant, email), clearing any acceptance.
    async fn upsert_invitation(
        &self,
        restaurant_id: i64,
        email: &str,
        role: Role,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, ServiceError>;

    async fn find_invitation_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, ServiceError>;

    /// Claims a pending, unexpired invitation and provisions the identity in
    /// one step. `None` when the invitation is absent, accepted or expired.
    async fn redeem_invitation(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<(Invitation, AdminIdentity)>, ServiceError>;
}

/// Outcome of redeeming a password-reset token.
#[derive(Debug, Clone)]
pub enum ResetRedemption {
    Redeemed(PasswordReset),
    InvalidOrExpired,
    /// Token was valid but the identity no longer exists; token stays unused.
    AccountMissing,
}

#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// Insert or overwrite the reset for the email, clearing `used_at`.
    async fn upsert_password_reset(
        &self,
        restaurant_id: i64,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError>;

    async fn find_password_reset_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, ServiceError>;

    /// Claims the reset and replaces the identity's password hash in one step.
    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<ResetRedemption, ServiceError>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<(), ServiceError>;
}

/// Everything the service persists, behind one handle.
#[async_trait]
pub trait PanelStore:
    CredentialStore + SessionStore + InvitationStore + PasswordResetStore + AuditSink
{
    async fn health_check(&self) -> Result<(), ServiceError>;
}
