//! Wire-facing records exchanged with the backend service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{RoleResolution, UserProfile};

/// Expanded `roles(name)` relation on a user query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleName {
    pub name: String,
}

/// User row as returned by the directory query, with the role relation
/// expanded. `role` is `None` when the join yielded no row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role_id: Uuid,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "roles")]
    pub role: Option<RoleName>,
}

impl ProfileRecord {
    /// Convert into the view model, tagging the role join outcome explicitly
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            role_id: self.role_id,
            profile_picture_url: self.profile_picture_url,
            created_at: self.created_at,
            role: match self.role {
                Some(role) => RoleResolution::Resolved(role.name),
                None => RoleResolution::Missing,
            },
        }
    }
}

/// Profile row inserted right after identity creation. The id must equal the
/// auth identity's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role_id: Uuid,
}

/// Partial update of a user row. Only the populated fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl UserUpdate {
    pub fn full_name(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn avatar(url: impl Into<String>) -> Self {
        Self {
            profile_picture_url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.role_id.is_none() && self.profile_picture_url.is_none()
    }
}

/// Options forwarded with an object storage upload
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub cache_control: Option<String>,
    pub upsert: bool,
}
