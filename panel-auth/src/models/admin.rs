//! Admin identity model - panel accounts scoped to a restaurant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Closed set of panel roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Chef,
    Owner,
}

/// Actions gated by role rather than by session ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Issue invitations for the restaurant.
    InviteAdmins,
    /// See every session of the restaurant, not only one's own.
    ViewTenantSessions,
    /// Revoke sessions belonging to other admins of the restaurant.
    RevokeTenantSessions,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Chef => "chef",
            Role::Owner => "owner",
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Owner, _) => true,
            (Role::Chef, Capability::InviteAdmins)
            | (Role::Chef, Capability::ViewTenantSessions)
            | (Role::Chef, Capability::RevokeTenantSessions) => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chef" => Ok(Role::Chef),
            "owner" => Ok(Role::Owner),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Admin identity entity.
#[derive(Debug, Clone, FromRow)]
pub struct AdminIdentity {
    pub id: i64,
    pub restaurant_id: i64,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(json)]
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Authenticated caller of an administrative operation, taken from access token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub restaurant_id: i64,
    pub email: String,
    pub role: Role,
}

/// Normalizes an email address for lookups and uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
