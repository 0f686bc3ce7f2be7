//! In-process store with the same transition semantics as `Database`.
//!
//! Every compare-and-set runs under a single lock acquisition, which gives
//! the same exactly-once guarantees the conditional updates give in SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::{
    AdminIdentity, AuditEvent, Invitation, NewRefreshSession, PasswordReset, RefreshSession, Role,
};

use super::error::ServiceError;
use super::store::{
    AuditSink, CredentialStore, InvitationStore, PanelStore, PasswordResetStore, ResetRedemption,
    SessionRotation, SessionStore,
};

/// Rows are public so tests can inspect or age them directly.
pub struct MemoryStore {
    pub admins: Mutex<Vec<AdminIdentity>>,
    pub sessions: Mutex<Vec<RefreshSession>>,
    pub invitations: Mutex<Vec<Invitation>>,
    pub password_resets: Mutex<Vec<PasswordReset>>,
    pub audit_log: Mutex<Vec<AuditEvent>>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            admins: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            invitations: Mutex::new(Vec::new()),
            password_resets: Mutex::new(Vec::new()),
            audit_log: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, ServiceError> {
    mutex
        .lock()
        .map_err(|e| ServiceError::StoreUnavailable(anyhow::anyhow!("{} mutex poisoned: {}", name, e)))
}

fn upsert_admin_locked(
    admins: &mut Vec<AdminIdentity>,
    id: i64,
    restaurant_id: i64,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AdminIdentity {
    if let Some(existing) = admins
        .iter_mut()
        .find(|a| a.restaurant_id == restaurant_id && a.email == email)
    {
        existing.password_hash = password_hash.to_string();
        existing.role = role;
        existing.permissions = Vec::new();
        return existing.clone();
    }

    let admin = AdminIdentity {
        id,
        restaurant_id,
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        permissions: Vec::new(),
        created_at: Utc::now(),
    };
    admins.push(admin.clone());
    admin
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_admin(
        &self,
        restaurant_id: i64,
        email: &str,
    ) -> Result<Option<AdminIdentity>, ServiceError> {
        let admins = lock(&self.admins, "admins")?;
        Ok(admins
            .iter()
            .find(|a| a.restaurant_id == restaurant_id && a.email == email)
            .cloned())
    }

    async fn admin_exists(&self, restaurant_id: i64, email: &str) -> Result<bool, ServiceError> {
        let admins = lock(&self.admins, "admins")?;
        Ok(admins
            .iter()
            .any(|a| a.restaurant_id == restaurant_id && a.email == email))
    }

    async fn upsert_admin(
        &self,
        restaurant_id: i64,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<AdminIdentity, ServiceError> {
        let id = self.next_id();
        let mut admins = lock(&self.admins, "admins")?;
        Ok(upsert_admin_locked(
            &mut admins,
            id,
            restaurant_id,
            email,
            password_hash,
            role,
        ))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(
        &self,
        session: NewRefreshSession,
    ) -> Result<RefreshSession, ServiceError> {
        let id = self.next_id();
        let mut sessions = lock(&self.sessions, "sessions")?;
        if sessions.iter().any(|s| s.token_hash == session.token_hash) {
            return Err(ServiceError::Conflict("duplicate token hash".to_string()));
        }
        let row = RefreshSession {
            id,
            restaurant_id: session.restaurant_id,
            admin_email: session.admin_email,
            token_hash: session.token_hash,
            created_at: Utc::now(),
            expires_at: session.expires_at,
            ip: session.ip,
            user_agent: session.user_agent,
            revoked: false,
        };
        sessions.push(row.clone());
        Ok(row)
    }

    async fn find_session_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshSession>, ServiceError> {
        let sessions = lock(&self.sessions, "sessions")?;
        Ok(sessions.iter().find(|s| s.token_hash == token_hash).cloned())
    }

    async fn find_session_by_id(&self, id: i64) -> Result<Option<RefreshSession>, ServiceError> {
        let sessions = lock(&self.sessions, "sessions")?;
        Ok(sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn revoke_session(&self, id: i64) -> Result<bool, ServiceError> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        match sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_session(
        &self,
        old_hash: &str,
        next: SessionRotation,
    ) -> Result<Option<(RefreshSession, RefreshSession)>, ServiceError> {
        let id = self.next_id();
        let mut sessions = lock(&self.sessions, "sessions")?;

        let Some(previous) = sessions
            .iter_mut()
            .find(|s| s.token_hash == old_hash && s.is_valid())
        else {
            return Ok(None);
        };
        previous.revoked = true;
        let previous = previous.clone();

        let current = RefreshSession {
            id,
            restaurant_id: previous.restaurant_id,
            admin_email: previous.admin_email.clone(),
            token_hash: next.token_hash,
            created_at: Utc::now(),
            expires_at: next.expires_at,
            ip: next.ip,
            user_agent: next.user_agent,
            revoked: false,
        };
        sessions.push(current.clone());
        Ok(Some((previous, current)))
    }

    async fn list_sessions(
        &self,
        restaurant_id: i64,
        email: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RefreshSession>, ServiceError> {
        let sessions = lock(&self.sessions, "sessions")?;
        let mut rows: Vec<RefreshSession> = sessions
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .filter(|s| email.map_or(true, |e| s.admin_email == e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn revoke_sessions_except(
        &self,
        restaurant_id: i64,
        email: &str,
        keep_id: Option<i64>,
    ) -> Result<u64, ServiceError> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        let mut revoked = 0;
        for session in sessions.iter_mut().filter(|s| {
            s.restaurant_id == restaurant_id
                && s.admin_email == email
                && !s.revoked
                && Some(s.id) != keep_id
        }) {
            session.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_stale_sessions(&self, threshold: DateTime<Utc>) -> Result<u64, ServiceError> {
        let mut sessions = lock(&self.sessions, "sessions")?;
        let before = sessions.len();
        sessions.retain(|s| {
            let stale_revoked = s.revoked && s.created_at < threshold;
            let stale_expired = s.expires_at.is_some_and(|exp| exp < threshold);
            !(stale_revoked || stale_expired)
        });
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn upsert_invitation(
        &self,
        restaurant_id: i64,
        email: &str,
        role: Role,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Invitation, ServiceError> {
        let id = self.next_id();
        let mut invitations = lock(&self.invitations, "invitations")?;
        if let Some(existing) = invitations
            .iter_mut()
            .find(|i| i.restaurant_id == restaurant_id && i.email == email)
        {
            existing.role = role;
            existing.token_hash = token_hash.to_string();
            existing.created_at = Utc::now();
            existing.expires_at = expires_at;
            existing.accepted_at = None;
            return Ok(existing.clone());
        }

        let invitation = Invitation {
            id,
            restaurant_id,
            email: email.to_string(),
            role,
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            expires_at,
            accepted_at: None,
        };
        invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invitation>, ServiceError> {
        let invitations = lock(&self.invitations, "invitations")?;
        Ok(invitations
            .iter()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn redeem_invitation(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<Option<(Invitation, AdminIdentity)>, ServiceError> {
        let id = self.next_id();
        // Lock order: invitations, then admins.
        let mut invitations = lock(&self.invitations, "invitations")?;
        let mut admins = lock(&self.admins, "admins")?;

        let Some(invitation) = invitations
            .iter_mut()
            .find(|i| i.token_hash == token_hash && i.is_valid())
        else {
            return Ok(None);
        };
        invitation.accepted_at = Some(Utc::now());
        let invitation = invitation.clone();

        let admin = upsert_admin_locked(
            &mut admins,
            id,
            invitation.restaurant_id,
            &invitation.email,
            password_hash,
            invitation.role,
        );
        Ok(Some((invitation, admin)))
    }
}

#[async_trait]
impl PasswordResetStore for MemoryStore {
    async fn upsert_password_reset(
        &self,
        restaurant_id: i64,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset, ServiceError> {
        let id = self.next_id();
        let mut resets = lock(&self.password_resets, "password_resets")?;
        if let Some(existing) = resets.iter_mut().find(|r| r.admin_email == email) {
            existing.restaurant_id = restaurant_id;
            existing.token_hash = token_hash.to_string();
            existing.created_at = Utc::now();
            existing.expires_at = expires_at;
            existing.used_at = None;
            return Ok(existing.clone());
        }

        let reset = PasswordReset {
            id,
            restaurant_id,
            admin_email: email.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            expires_at,
            used_at: None,
        };
        resets.push(reset.clone());
        Ok(reset)
    }

    async fn find_password_reset_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, ServiceError> {
        let resets = lock(&self.password_resets, "password_resets")?;
        Ok(resets.iter().find(|r| r.token_hash == token_hash).cloned())
    }

    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<ResetRedemption, ServiceError> {
        // Lock order: admins, then password_resets.
        let mut admins = lock(&self.admins, "admins")?;
        let mut resets = lock(&self.password_resets, "password_resets")?;

        let Some(reset) = resets
            .iter_mut()
            .find(|r| r.token_hash == token_hash && r.is_redeemable())
        else {
            return Ok(ResetRedemption::InvalidOrExpired);
        };

        let Some(admin) = admins
            .iter_mut()
            .find(|a| a.restaurant_id == reset.restaurant_id && a.email == reset.admin_email)
        else {
            return Ok(ResetRedemption::AccountMissing);
        };

        admin.password_hash = password_hash.to_string();
        reset.used_at = Some(Utc::now());
        Ok(ResetRedemption::Redeemed(reset.clone()))
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), ServiceError> {
        lock(&self.audit_log, "audit_log")?.push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl PanelStore for MemoryStore {
    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
