//! User and role domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_USER};

/// Authorization role row. Pre-seeded in the backend; this application only
/// reads and assigns roles, never creates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Check if this is the administrator role
    pub fn is_admin(&self) -> bool {
        self.name == ROLE_ADMIN
    }
}

/// Outcome of joining a user row with its role row.
///
/// The join is nullable at the backend: a user row can reference a role the
/// query failed to expand. Rather than silently guessing, the resolution is
/// tagged and the caller decides whether missing-role is an error or a
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleResolution {
    Resolved(String),
    Missing,
}

impl RoleResolution {
    /// Role name for display purposes. Falls back to "user" when the join
    /// yielded no row, matching the legacy console behavior.
    pub fn display_name(&self) -> &str {
        match self {
            RoleResolution::Resolved(name) => name,
            RoleResolution::Missing => ROLE_USER,
        }
    }

    /// Strict admin check. A missing role is never treated as admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, RoleResolution::Resolved(name) if name == ROLE_ADMIN)
    }
}

/// Denormalized user profile: the persisted user row enriched with the
/// resolved role name. Recomputed on every profile refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    /// Immutable post-creation in this console
    pub email: String,
    pub full_name: String,
    pub role_id: Uuid,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub role: RoleResolution,
}

impl UserProfile {
    /// Role name for display (with the legacy "user" fallback)
    pub fn role_name(&self) -> &str {
        self.role.display_name()
    }

    /// Whether this profile may access admin-only views
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
