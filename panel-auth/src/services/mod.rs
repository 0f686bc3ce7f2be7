//! Services layer for panel-auth.
//!
//! Business logic for credentials, refresh sessions, one-time tokens and
//! session administration, plus the persistence seams they run on.

mod audit;
mod auth;
mod database;
mod email;
pub mod error;
mod invitation;
mod jwt;
mod memory;
pub mod metrics;
mod password_reset;
pub mod secret;
mod session_admin;
mod sessions;
mod store;

pub use audit::AuditRecorder;
pub use auth::{AuthService, LoginOutcome};
pub use database::Database;
pub use email::{
    email_provider_from_config, DisabledEmailService, EmailProvider, MockEmailService, Notifier,
    SentEmail, SmtpEmailService,
};
pub use error::ServiceError;
pub use invitation::{InvitationService, IssuedInvitation};
pub use jwt::{AccessTokenClaims, JwtService};
pub use memory::MemoryStore;
pub use password_reset::{IssuedReset, PasswordResetService};
pub use session_admin::SessionAdminService;
pub use sessions::{ClientContext, IssuedSession, SessionService, DEFAULT_LIST_LIMIT};
pub use store::{
    AuditSink, CredentialStore, InvitationStore, PanelStore, PasswordResetStore, ResetRedemption,
    SessionRotation, SessionStore,
};
