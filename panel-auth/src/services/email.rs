use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use panel_core::error::AppError;
use secrecy::ExposeSecret;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{NotificationConfig, SmtpConfig};
use crate::models::Role;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpEmailService {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::EmailError(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(timeout))
            .build();

        tracing::info!(host = %config.host, port = config.port, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::EmailError(e.to_string()))?;

        // lettre's SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// Used when no SMTP relay is configured: logs and drops every message.
#[derive(Clone, Default)]
pub struct DisabledEmailService;

#[async_trait]
impl EmailProvider for DisabledEmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        _plain_body: &str,
        _html_body: &str,
    ) -> Result<(), AppError> {
        tracing::warn!(to = %to_email, subject = %subject, "SMTP not configured, email skipped");
        Ok(())
    }
}

/// One message captured by `MockEmailService`.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub plain_body: String,
}

/// Records every message instead of sending it.
#[derive(Clone, Default)]
pub struct MockEmailService {
    outbox: Arc<Mutex<Vec<SentEmail>>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: &str,
        _html_body: &str,
    ) -> Result<(), AppError> {
        let mut outbox = self
            .outbox
            .lock()
            .map_err(|e| AppError::EmailError(format!("outbox poisoned: {}", e)))?;
        outbox.push(SentEmail {
            to: to_email.to_string(),
            subject: subject.to_string(),
            plain_body: plain_body.to_string(),
        });
        Ok(())
    }
}

/// Picks the SMTP relay when configured, otherwise the logging no-op.
pub fn email_provider_from_config(
    config: &NotificationConfig,
) -> Result<Arc<dyn EmailProvider>, AppError> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(SmtpEmailService::new(
            smtp,
            Duration::from_secs(config.timeout_seconds),
        )?)),
        None => Ok(Arc::new(DisabledEmailService)),
    }
}

/// Builds notification messages and sends them off the request path.
///
/// Every send is spawned after the triggering transition committed and is
/// bounded by the configured timeout. Failures are logged, never returned.
#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailProvider>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(email: Arc<dyn EmailProvider>, timeout: Duration) -> Self {
        Self { email, timeout }
    }

    pub fn dispatch(&self, to_email: &str, subject: &str, plain_body: String, html_body: String) {
        let email = self.email.clone();
        let timeout = self.timeout;
        let to_email = to_email.to_string();
        let subject = subject.to_string();

        tokio::spawn(async move {
            let send = email.send_email(&to_email, &subject, &plain_body, &html_body);
            match tokio::time::timeout(timeout, send).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, to = %to_email, subject = %subject, "Notification failed");
                }
                Err(_) => {
                    tracing::warn!(
                        to = %to_email,
                        subject = %subject,
                        timeout_secs = timeout.as_secs(),
                        "Notification timed out"
                    );
                }
            }
        });
    }

    pub fn invitation(&self, to_email: &str, invite_url: &str, role: Role, expiry_hours: i64) {
        let plain_body = format!(
            "You have been invited to the restaurant admin panel as {role}.\n\n\
             Set your password here:\n\n{invite_url}\n\n\
             This link expires in {expiry_hours} hours.",
        );
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>You have been invited</h2>
        <p>You have been invited to the restaurant admin panel as <strong>{role}</strong>.</p>
        <p>
            <a href="{invite_url}" style="background-color: #4CAF50; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Accept invitation
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">This link expires in {expiry_hours} hours.</p>
    </body>
</html>"###,
        );

        self.dispatch(to_email, "Admin panel invitation", plain_body, html_body);
    }

    pub fn welcome(&self, to_email: &str, role: Role) {
        let plain_body = format!(
            "Your admin panel account is ready. You can now sign in as {role}.",
        );
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Welcome</h2>
        <p>Your admin panel account is ready. You can now sign in as <strong>{role}</strong>.</p>
    </body>
</html>"###,
        );

        self.dispatch(to_email, "Welcome to the admin panel", plain_body, html_body);
    }

    pub fn password_reset(&self, to_email: &str, reset_url: &str, expiry_minutes: i64) {
        let plain_body = format!(
            "We received a request to reset your password.\n\n\
             Set a new password here:\n\n{reset_url}\n\n\
             This link expires in {expiry_minutes} minutes. If you didn't request this, ignore this email.",
        );
        let html_body = format!(
            r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Password reset request</h2>
        <p>We received a request to reset your password.</p>
        <p>
            <a href="{reset_url}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                Reset password
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link expires in {expiry_minutes} minutes. If you didn't request this, ignore this email.
        </p>
    </body>
</html>"###,
        );

        self.dispatch(to_email, "Reset your password", plain_body, html_body);
    }

    pub fn password_changed(&self, to_email: &str) {
        let plain_body = "Your admin panel password was changed. \
                          If this wasn't you, contact the restaurant owner immediately."
            .to_string();
        let html_body = r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Password changed</h2>
        <p>Your admin panel password was changed.</p>
        <p style="color: #666; font-size: 12px;">If this wasn't you, contact the restaurant owner immediately.</p>
    </body>
</html>"###
            .to_string();

        self.dispatch(to_email, "Your password was changed", plain_body, html_body);
    }
}
