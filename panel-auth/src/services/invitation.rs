use chrono::{DateTime, Duration, Utc};
use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::{
    models::{normalize_email, AdminIdentity, AuditAction, Capability, Invitation, Requester, Role},
    services::{
        secret::{fingerprint, generate_secret, RawSecret, SECRET_BYTES},
        AuditRecorder, InvitationStore, Notifier, ServiceError,
    },
    utils::{hash_password, Password},
};

/// Result of issuing an invitation. `raw` is the only copy of the token.
#[derive(Debug)]
pub struct IssuedInvitation {
    pub raw: RawSecret,
    pub invitation: Invitation,
    pub invite_url: RawSecret,
}

impl IssuedInvitation {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.invitation.expires_at
    }
}

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn InvitationStore>,
    audit: AuditRecorder,
    notifier: Notifier,
    frontend_url: String,
    expiry_hours: i64,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn InvitationStore>,
        audit: AuditRecorder,
        notifier: Notifier,
        frontend_url: String,
        expiry_hours: i64,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
            frontend_url,
            expiry_hours,
        }
    }

    /// Issue (or re-issue) an invitation. Re-inviting the same address
    /// replaces the previous token, which stops working.
    #[tracing::instrument(skip(self, requester, ip), fields(requester_restaurant = requester.restaurant_id))]
    pub async fn invite(
        &self,
        requester: &Requester,
        restaurant_id: i64,
        email: &str,
        role: Role,
        ip: &str,
    ) -> Result<IssuedInvitation, ServiceError> {
        if requester.restaurant_id != restaurant_id || !requester.role.allows(Capability::InviteAdmins) {
            tracing::warn!(
                requester_restaurant = requester.restaurant_id,
                target_restaurant = restaurant_id,
                role = %requester.role,
                "Invite rejected: requester is not an owner of the target restaurant"
            );
            return Err(ServiceError::Forbidden);
        }

        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(ServiceError::Validation("Invalid email format".to_string()));
        }

        let raw = generate_secret(SECRET_BYTES)?;
        let expires_at = Utc::now() + Duration::hours(self.expiry_hours);

        let invitation = self
            .store
            .upsert_invitation(
                restaurant_id,
                &email,
                role,
                &fingerprint(raw.expose_secret()),
                expires_at,
            )
            .await?;

        let invite_url = RawSecret::new(format!(
            "{}/invite/accept?token={}&restaurantId={}",
            self.frontend_url,
            raw.expose_secret(),
            restaurant_id
        ));

        self.notifier
            .invitation(&email, invite_url.expose_secret(), role, self.expiry_hours);

        self.audit
            .record(
                restaurant_id,
                &requester.email,
                AuditAction::InviteCreated,
                json!({ "invited_email": email, "role": role.as_str() }),
                ip,
            )
            .await;

        tracing::info!(invitation_id = invitation.id, restaurant_id, "Invitation issued");

        Ok(IssuedInvitation {
            raw,
            invitation,
            invite_url,
        })
    }

    /// Redeem an invitation and provision the identity with the chosen password.
    #[tracing::instrument(skip(self, raw, password, ip))]
    pub async fn accept(
        &self,
        raw: &str,
        password: &Password,
        ip: &str,
    ) -> Result<AdminIdentity, ServiceError> {
        let token_hash = fingerprint(raw);

        // Cheap rejection before paying for the password hash
        match self.store.find_invitation_by_hash(&token_hash).await? {
            Some(invitation) if invitation.is_valid() => {}
            Some(invitation) => {
                tracing::info!(state = invitation.state().as_str(), "Invitation not redeemable");
                return Err(ServiceError::InvalidOrExpired);
            }
            None => return Err(ServiceError::InvalidOrExpired),
        }

        let password_hash = hash_password(password).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let (invitation, identity) = self
            .store
            .redeem_invitation(&token_hash, password_hash.as_str())
            .await?
            .ok_or(ServiceError::InvalidOrExpired)?;

        self.audit
            .record(
                invitation.restaurant_id,
                &identity.email,
                AuditAction::InviteAccepted,
                json!({ "invitation_id": invitation.id }),
                ip,
            )
            .await;

        self.notifier.welcome(&identity.email, identity.role);

        tracing::info!(
            invitation_id = invitation.id,
            admin_id = identity.id,
            "Invitation accepted"
        );

        Ok(identity)
    }
}
