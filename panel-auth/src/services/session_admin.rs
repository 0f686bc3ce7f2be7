//! Tenant-scoped session listing and revocation for signed-in admins.

use serde_json::json;

use crate::models::{AuditAction, Capability, Requester, SessionInfo};

use super::{AuditRecorder, ServiceError, SessionService};

#[derive(Clone)]
pub struct SessionAdminService {
    sessions: SessionService,
    audit: AuditRecorder,
}

impl SessionAdminService {
    pub fn new(sessions: SessionService, audit: AuditRecorder) -> Self {
        Self { sessions, audit }
    }

    /// Owners see every session of their restaurant, everyone else only their own.
    pub async fn list_sessions(
        &self,
        requester: &Requester,
        restaurant_id: i64,
        current_session_id: Option<i64>,
    ) -> Result<Vec<SessionInfo>, ServiceError> {
        if requester.restaurant_id != restaurant_id {
            tracing::warn!(
                requester_restaurant = requester.restaurant_id,
                target_restaurant = restaurant_id,
                "Cross-tenant session listing rejected"
            );
            return Err(ServiceError::Forbidden);
        }

        let email_filter = if requester.role.allows(Capability::ViewTenantSessions) {
            None
        } else {
            Some(requester.email.as_str())
        };

        let sessions = self.sessions.list(restaurant_id, email_filter, 0).await?;

        Ok(sessions
            .into_iter()
            .map(|s| {
                let mut info = SessionInfo::from(s);
                info.is_current = Some(info.id) == current_session_id;
                info
            })
            .collect())
    }

    #[tracing::instrument(skip(self, requester, ip), fields(requester_restaurant = requester.restaurant_id))]
    pub async fn revoke(
        &self,
        requester: &Requester,
        session_id: i64,
        ip: &str,
    ) -> Result<(), ServiceError> {
        let session = self.sessions.find_by_id(session_id).await?;

        let own_session = session.restaurant_id == requester.restaurant_id
            && session.admin_email == requester.email;
        let tenant_owner = session.restaurant_id == requester.restaurant_id
            && requester.role.allows(Capability::RevokeTenantSessions);

        if !own_session && !tenant_owner {
            tracing::warn!(session_id, "Session revoke rejected: not owner of session");
            return Err(ServiceError::Forbidden);
        }

        self.sessions.revoke(session.id).await?;

        self.audit
            .record(
                requester.restaurant_id,
                &requester.email,
                AuditAction::SessionRevoked,
                json!({
                    "revoked_session_id": session.id,
                    "revoked_for": session.admin_email,
                }),
                ip,
            )
            .await;

        Ok(())
    }

    /// Sign out every other device of (restaurant, email). Returns how many
    /// sessions were revoked.
    pub async fn revoke_all_others(
        &self,
        restaurant_id: i64,
        email: &str,
        current_session_id: Option<i64>,
        ip: &str,
    ) -> Result<u64, ServiceError> {
        let revoked = self
            .sessions
            .revoke_all_except(restaurant_id, email, current_session_id)
            .await?;

        self.audit
            .record(
                restaurant_id,
                email,
                AuditAction::SessionRevokeOther,
                json!({ "revoked_count": revoked }),
                ip,
            )
            .await;

        tracing::info!(restaurant_id, revoked, "Other sessions revoked");
        Ok(revoked)
    }
}
