use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use serde_json::json;
use std::sync::Arc;

use crate::{
    models::{normalize_email, AuditAction, PasswordReset},
    services::{
        secret::{fingerprint, generate_secret, RawSecret, SECRET_BYTES},
        AuditRecorder, CredentialStore, Notifier, PasswordResetStore, ResetRedemption,
        ServiceError,
    },
    utils::{hash_password, Password},
};

#[derive(Debug)]
pub struct IssuedReset {
    pub raw: RawSecret,
    pub reset: PasswordReset,
    pub reset_url: RawSecret,
}

#[derive(Clone)]
pub struct PasswordResetService {
    credentials: Arc<dyn CredentialStore>,
    resets: Arc<dyn PasswordResetStore>,
    audit: AuditRecorder,
    notifier: Notifier,
    frontend_url: String,
    expiry_minutes: i64,
}

impl PasswordResetService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        resets: Arc<dyn PasswordResetStore>,
        audit: AuditRecorder,
        notifier: Notifier,
        frontend_url: String,
        expiry_minutes: i64,
    ) -> Self {
        Self {
            credentials,
            resets,
            audit,
            notifier,
            frontend_url,
            expiry_minutes,
        }
    }

    /// Start a reset. Returns `None`, not an error, for unknown accounts so
    /// callers cannot tell whether the address exists.
    #[tracing::instrument(skip(self, email, ip))]
    pub async fn request(
        &self,
        restaurant_id: i64,
        email: &str,
        ip: &str,
    ) -> Result<Option<IssuedReset>, ServiceError> {
        let email = normalize_email(email);

        if !self.credentials.admin_exists(restaurant_id, &email).await? {
            tracing::info!(restaurant_id, "Password reset requested for unknown account");
            return Ok(None);
        }

        let raw = generate_secret(SECRET_BYTES)?;
        let expires_at = Utc::now() + Duration::minutes(self.expiry_minutes);

        let reset = self
            .resets
            .upsert_password_reset(
                restaurant_id,
                &email,
                &fingerprint(raw.expose_secret()),
                expires_at,
            )
            .await?;

        let reset_url = RawSecret::new(format!(
            "{}/password-reset/confirm?token={}&restaurantId={}",
            self.frontend_url,
            raw.expose_secret(),
            restaurant_id
        ));

        self.notifier
            .password_reset(&email, reset_url.expose_secret(), self.expiry_minutes);

        self.audit
            .record(
                restaurant_id,
                &email,
                AuditAction::PasswordResetRequested,
                json!({ "email": email }),
                ip,
            )
            .await;

        tracing::info!(reset_id = reset.id, restaurant_id, "Password reset issued");

        Ok(Some(IssuedReset {
            raw,
            reset,
            reset_url,
        }))
    }

    /// Redeem a reset token and replace the password hash.
    #[tracing::instrument(skip(self, raw, password, ip))]
    pub async fn confirm(
        &self,
        raw: &str,
        password: &Password,
        ip: &str,
    ) -> Result<PasswordReset, ServiceError> {
        let token_hash = fingerprint(raw);

        match self.resets.find_password_reset_by_hash(&token_hash).await? {
            Some(reset) if reset.is_redeemable() => {}
            _ => return Err(ServiceError::InvalidOrExpired),
        }

        let password_hash = hash_password(password).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let reset = match self
            .resets
            .redeem_password_reset(&token_hash, password_hash.as_str())
            .await?
        {
            ResetRedemption::Redeemed(reset) => reset,
            ResetRedemption::InvalidOrExpired => return Err(ServiceError::InvalidOrExpired),
            ResetRedemption::AccountMissing => {
                tracing::warn!("Password reset token valid but account no longer exists");
                return Err(ServiceError::AccountNotFound);
            }
        };

        self.audit
            .record(
                reset.restaurant_id,
                &reset.admin_email,
                AuditAction::PasswordResetConfirmed,
                json!({ "token_id": reset.id }),
                ip,
            )
            .await;

        self.notifier.password_changed(&reset.admin_email);

        tracing::info!(reset_id = reset.id, "Password reset confirmed");
        Ok(reset)
    }
}
