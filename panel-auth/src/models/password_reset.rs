use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Outstanding password-reset request. One row per admin email.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: i64,
    pub restaurant_id: i64,
    pub admin_email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordReset {
    pub fn is_redeemable(&self) -> bool {
        self.used_at.is_none() && self.expires_at > Utc::now()
    }
}
