pub mod admin;
pub mod audit_event;
pub mod invitation;
pub mod password_reset;
pub mod refresh_session;

pub use admin::{normalize_email, AdminIdentity, Capability, Requester, Role};
pub use audit_event::{AuditAction, AuditEvent};
pub use invitation::{Invitation, InvitationState};
pub use password_reset::PasswordReset;
pub use refresh_session::{NewRefreshSession, RefreshSession, SessionInfo};
