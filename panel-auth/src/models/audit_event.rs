//! Audit event model - append-only record of security-relevant actions.

use serde::{Deserialize, Serialize};

/// Audit action tags as stored in `audit_log.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AdminLogin,
    SessionRefreshed,
    SessionRevokedByUser,
    SessionRevoked,
    SessionRevokeOther,
    InviteCreated,
    InviteAccepted,
    PasswordResetRequested,
    PasswordResetConfirmed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AdminLogin => "admin_login",
            AuditAction::SessionRefreshed => "session_refreshed",
            AuditAction::SessionRevokedByUser => "session_revoked_by_user",
            AuditAction::SessionRevoked => "session_revoked",
            AuditAction::SessionRevokeOther => "session_revoke_other",
            AuditAction::InviteCreated => "invite_created",
            AuditAction::InviteAccepted => "invite_accepted",
            AuditAction::PasswordResetRequested => "password_reset_requested",
            AuditAction::PasswordResetConfirmed => "password_reset_confirmed",
        }
    }
}

/// One audit entry, ready to append. The sink stamps id and timestamp.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub restaurant_id: i64,
    pub actor_email: String,
    pub action: AuditAction,
    pub payload: serde_json::Value,
    pub ip: String,
}

impl AuditEvent {
    /// Create a new audit event for an admin action.
    pub fn admin_action(
        restaurant_id: i64,
        actor_email: impl Into<String>,
        action: AuditAction,
        payload: serde_json::Value,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            restaurant_id,
            actor_email: actor_email.into(),
            action,
            payload,
            ip: ip.into(),
        }
    }
}
