//! PostgreSQL implementation of the store traits.
//!
//! One-time transitions (rotation, invitation and reset redemption) are
//! gated by a conditional `UPDATE ... RETURNING` inside a transaction, so
//! concurrent callers race on the row lock and only the first one matches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;

use crate::models::{
    AdminIdentity, AuditEvent, Invitation, NewRefreshSession, PasswordReset, RefreshSession, Role,
};

use super::error::ServiceError;
use super::store::{
    AuditSink, CredentialStore, InvitationStore, PanelStore, PasswordResetStore, ResetRedemption,
    SessionRotation, SessionStore,
};

const ADMIN_COLUMNS: &str =
    "id, restaurant_id, email, password_hash, role, permissions, created_at";
const SESSION_COLUMNS: &str =
    "id, restaurant_id, admin_email, token_hash, created_at, expires_at, ip, user_agent, revoked";
const INVITATION_COLUMNS: &str =
    "id, restaurant_id, email, role, token_hash, created_at, expires_at, accepted_at";
const RESET_COLUMNS: &str =
    "id, restaurant_id, admin_email, token_hash, created_at, expires_at, used_at";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ==================== Admin Operations ====================

#[async_trait]
impl CredentialStore for Database {
    async fn find_admin(
        &self,
        restaurant_id: i64,
        email: &str,
    ) -> Result<Option<AdminIdentity>, ServiceError> {
        let admin = sqlx::query_as::<_, AdminIdentity>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE restaurant_id = $1 AND email = $2"
        ))
        .bind(restaurant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn admin_exists(&self, restaurant_id: i64, email: &str) -> Result<bool, ServiceError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM admins WHERE restaurant_id = $1 AND email = $2)",
        )
        .bind(restaurant_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn upsert_admin(
        &self,
        restaurant_id: i64,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<AdminIdentity, ServiceError> {
        let admin = sqlx::query_as::<_, AdminIdentity>(&upsert_admin_sql())
            .bind(restaurant_id)
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(admin)
    }
}

fn upsert_admin_sql() -> String {
    format!(
        r#"
        INSERT INTO admins (restaurant_id, email, password_hash, role, permissions)
        VALUES ($1, $2, $3, $4, '[]'::jsonb)
        ON CONFLICT (restaurant_id, email) DO UPDATE
        SET password_hash = EXCLUDED.password_hash,
            role = EXCLUDED.role,
            permissions = EXCLUDED.permissions,
            updated_at = NOW()
        RETURNING {ADMIN_COLUMNS}
        "#
    )
}

// ==================== Refresh Session Operations ====================

#[async_trait]
impl SessionStore for Database {
    async fn insert_session(
        &self,
        session: NewRefreshSession,
    ) -> Result<RefreshSession, ServiceError> {
        let row = sqlx::query_as::<_, RefreshSession>(&format!(
            r#"
            INSERT INTO refresh_tokens (restaurant_id, admin_email, token_hash, expires_at, ip, user_agent, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.restaurant_id)
        .bind(&session.admin_email)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(&session.ip)
        .bind(&session.user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_session_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, ServiceError> {
        let row = sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM refresh_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_session_by_id(&self, id: i64) -> Result<Option<RefreshSession>, ServiceError> {
        let row = sqlx::query_as::<_, RefreshSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM refresh_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn revoke_session(&self, id: i64) -> Result<bool, ServiceError> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rotate_session(
        &self,
        old_hash: &str,
        next: SessionRotation,
    ) -> Result<Option<(RefreshSession, RefreshSession)>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set on the revoked flag; a concurrent rotation blocks
        // on the row lock and then sees revoked = TRUE.
        let previous = sqlx::query_as::<_, RefreshSession>(&format!(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE token_hash = $1
              AND revoked = FALSE
              AND (expires_at IS NULL OR expires_at > NOW())
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(old_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            tx.rollback().await?;
            return Ok(None);
        };

        let current = sqlx::query_as::<_, RefreshSession>(&format!(
            r#"
            INSERT INTO refresh_tokens (restaurant_id, admin_email, token_hash, expires_at, ip, user_agent, revoked)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(previous.restaurant_id)
        .bind(&previous.admin_email)
        .bind(&next.token_hash)
        .bind(next.expires_at)
        .bind(&next.ip)
        .bind(&next.user_agent)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((previous, current)))
    }

    async fn list_sessions(
        &self,
        restaurant_id: i64,
        email: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RefreshSession>, ServiceError> {
        let rows = match email {
            Some(email) => {
                sqlx::query_as::<_, RefreshSession>(&format!(
                    r#"
                    SELECT {SESSION_COLUMNS} FROM refresh_tokens
                    WHERE restaurant_id = $1 AND admin_email = $2
                    ORDER BY created_at DESC, id DESC
                    LIMIT $3
                    "#
                ))
                .bind(restaurant_id)
                .bind(email)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, RefreshSession>(&format!(
                    r#"
                    SELECT {SESSION_COLUMNS} FROM refresh_tokens
                    WHERE restaurant_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#
                ))
                .bind(restaurant_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn revoke_sessions_except(
        &self,
        restaurant_id: i64,
        email: &str,
        keep_id: Option<i64>,
    ) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE restaurant_id = $1
              AND admin_email = $2
              AND revoked = FALSE
              AND ($3::BIGINT IS NULL OR id <> $3)
            "#,
        )
        .bind(restaurant_id)
        .bind(email)
        .bind(keep_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_stale_sessions(&self, threshold: DateTime<Utc>) -> Result<u64, ServiceError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE (revoked AND created_at < $1)
               OR (expires_at IS NOT NULL AND expires_at < $1)
            "#,
        )
        .bind(threshold)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// ==================== Invitation Operations ====================

#[async_trait]
impl InvitationStore for Database {
    async fn upsert_invitation(
        &self,
        restaurant_id: i64,
        email: &str,
        role: Role,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, ServiceError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO admin_invitations (restaurant_id, email, role, token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (restaurant_id, email) DO UPDATE
            SET role = EXCLUDED.role,
                token_hash = EXCLUDED.token_hash,
                created_at = NOW(),
                expires_at = EXCLUDED.expires_at,
                accepted_at = NULL
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(email)
        .bind(role.as_str())
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_invitation_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, ServiceError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM admin_invitations WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn redeem_invitation(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<(Invitation, AdminIdentity)>, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE admin_invitations SET accepted_at = NOW()
            WHERE token_hash = $1
              AND accepted_at IS NULL
              AND expires_at > NOW()
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invitation) = invitation else {
            tx.rollback().await?;
            return Ok(None);
        };

        let admin = sqlx::query_as::<_, AdminIdentity>(&upsert_admin_sql())
            .bind(invitation.restaurant_id)
            .bind(&invitation.email)
            .bind(password_hash)
            .bind(invitation.role.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((invitation, admin)))
    }
}

// ==================== Password Reset Operations ====================

#[async_trait]
impl PasswordResetStore for Database {
    async fn upsert_password_reset(
        &self,
        restaurant_id: i64,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError> {
        let row = sqlx::query_as::<_, PasswordReset>(&format!(
            r#"
            INSERT INTO password_resets (restaurant_id, admin_email, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (admin_email) DO UPDATE
            SET restaurant_id = EXCLUDED.restaurant_id,
                token_hash = EXCLUDED.token_hash,
                created_at = NOW(),
                expires_at = EXCLUDED.expires_at,
                used_at = NULL
            RETURNING {RESET_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_password_reset_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, ServiceError> {
        let row = sqlx::query_as::<_, PasswordReset>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_resets WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<ResetRedemption, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query_as::<_, PasswordReset>(&format!(
            r#"
            UPDATE password_resets SET used_at = NOW()
            WHERE token_hash = $1
              AND used_at IS NULL
              AND expires_at > NOW()
            RETURNING {RESET_COLUMNS}
            "#
        ))
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reset) = reset else {
            tx.rollback().await?;
            return Ok(ResetRedemption::InvalidOrExpired);
        };

        let updated = sqlx::query(
            "UPDATE admins SET password_hash = $3, updated_at = NOW() WHERE restaurant_id = $1 AND email = $2",
        )
        .bind(reset.restaurant_id)
        .bind(&reset.admin_email)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(ResetRedemption::AccountMissing);
        }

        tx.commit().await?;
        Ok(ResetRedemption::Redeemed(reset))
    }
}

// ==================== Audit Operations ====================

#[async_trait]
impl AuditSink for Database {
    async fn append(&self, event: &AuditEvent) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO audit_log (restaurant_id, admin_email, action, payload, ip) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.restaurant_id)
        .bind(&event.actor_email)
        .bind(event.action.as_str())
        .bind(Json(&event.payload))
        .bind(&event.ip)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PanelStore for Database {
    /// Health check - ping the database.
    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            ServiceError::from(e)
        })?;
        Ok(())
    }
}
