use chrono::Duration;
use serde_json::json;
use std::sync::Arc;

use crate::{
    models::{normalize_email, AdminIdentity, AuditAction, Role},
    services::{
        AccessTokenClaims, AuditRecorder, ClientContext, CredentialStore, IssuedSession,
        JwtService, ServiceError, SessionService,
    },
    utils::{verify_against_dummy, verify_password, Password, PasswordHashString},
};

/// Access token plus the refresh session that backs it.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub role: Role,
    pub expires_in: i64,
    pub session: IssuedSession,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    jwt: JwtService,
    sessions: SessionService,
    audit: AuditRecorder,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        jwt: JwtService,
        sessions: SessionService,
        audit: AuditRecorder,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            jwt,
            sessions,
            audit,
            refresh_ttl,
        }
    }

    /// Unknown account and wrong password fail identically.
    pub async fn verify_credentials(
        &self,
        restaurant_id: i64,
        email: &str,
        password: &Password,
    ) -> Result<AdminIdentity, ServiceError> {
        let email = normalize_email(email);

        let Some(identity) = self.credentials.find_admin(restaurant_id, &email).await? else {
            verify_against_dummy(password);
            tracing::warn!(restaurant_id, "Login failed: unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = PasswordHashString::new(identity.password_hash.clone());
        if !verify_password(password, &hash) {
            tracing::warn!(restaurant_id, admin_id = identity.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(identity)
    }

    #[tracing::instrument(skip(self, password, client))]
    pub async fn login(
        &self,
        restaurant_id: i64,
        email: &str,
        password: &Password,
        client: &ClientContext,
    ) -> Result<LoginOutcome, ServiceError> {
        let identity = self.verify_credentials(restaurant_id, email, password).await?;

        let access_token =
            self.jwt
                .generate_access_token(identity.restaurant_id, &identity.email, identity.role)?;

        let session = self
            .sessions
            .create(
                identity.restaurant_id,
                &identity.email,
                client,
                Some(self.refresh_ttl),
            )
            .await?;

        self.audit
            .record(
                identity.restaurant_id,
                &identity.email,
                AuditAction::AdminLogin,
                json!({ "session_id": session.session.id }),
                &client.ip,
            )
            .await;

        tracing::info!(
            admin_id = identity.id,
            session_id = session.session.id,
            "Admin logged in"
        );

        Ok(LoginOutcome {
            access_token,
            role: identity.role,
            expires_in: self.jwt.access_token_expiry_seconds(),
            session,
        })
    }

    /// Rotate the refresh secret and mint a fresh access token for its owner.
    #[tracing::instrument(skip(self, raw, client))]
    pub async fn refresh(
        &self,
        raw: &str,
        client: &ClientContext,
    ) -> Result<LoginOutcome, ServiceError> {
        let (previous, session) = self
            .sessions
            .rotate(raw, client, Some(self.refresh_ttl))
            .await?;

        let identity = match self
            .credentials
            .find_admin(previous.restaurant_id, &previous.admin_email)
            .await?
        {
            Some(identity) => identity,
            None => {
                // Account removed while the session was live
                self.sessions.revoke(session.session.id).await?;
                tracing::warn!(
                    restaurant_id = previous.restaurant_id,
                    session_id = previous.id,
                    "Refresh rejected: account no longer exists"
                );
                return Err(ServiceError::InvalidSession);
            }
        };

        let access_token =
            self.jwt
                .generate_access_token(identity.restaurant_id, &identity.email, identity.role)?;

        self.audit
            .record(
                identity.restaurant_id,
                &identity.email,
                AuditAction::SessionRefreshed,
                json!({
                    "previous_session_id": previous.id,
                    "session_id": session.session.id,
                }),
                &client.ip,
            )
            .await;

        Ok(LoginOutcome {
            access_token,
            role: identity.role,
            expires_in: self.jwt.access_token_expiry_seconds(),
            session,
        })
    }

    /// Revoke the session behind `raw`, if any. Unknown secrets are ignored.
    pub async fn logout(&self, raw: Option<&str>, client: &ClientContext) -> Result<(), ServiceError> {
        let Some(raw) = raw else {
            return Ok(());
        };

        let session = match self.sessions.revoke_by_raw(raw).await {
            Ok(session) => session,
            Err(ServiceError::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.audit
            .record(
                session.restaurant_id,
                &session.admin_email,
                AuditAction::SessionRevokedByUser,
                json!({ "session_id": session.id }),
                &client.ip,
            )
            .await;

        tracing::info!(session_id = session.id, "Admin logged out");
        Ok(())
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, ServiceError> {
        self.jwt.verify(token)
    }
}
