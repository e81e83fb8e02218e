//! Admin service - user listing and account administration.
//!
//! Backs the administrative user table: the full joined listing is loaded
//! per view activation (no pagination at this scale) and searched
//! client-side.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::{Backend, UserUpdate};
use crate::config::ROLE_USER;
use crate::domain::{Role, UserProfile};
use crate::errors::AppResult;

/// Administrative operations on user accounts
#[async_trait]
pub trait AdminService: Send + Sync {
    /// All user rows joined with role names, newest first
    async fn list_users(&self) -> AppResult<Vec<UserProfile>>;

    /// Change a user's display name and role assignment
    async fn update_user(&self, id: Uuid, full_name: String, role_id: Uuid) -> AppResult<()>;

    /// Delete a user by removing its auth identity. The profile row is
    /// assumed cascaded by the backend.
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    /// All assignable roles, ordered by name
    async fn list_roles(&self) -> AppResult<Vec<Role>>;
}

/// Concrete implementation delegating to the backend client
pub struct AdminDirectory<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> AdminDirectory<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: Backend> AdminService for AdminDirectory<B> {
    async fn list_users(&self) -> AppResult<Vec<UserProfile>> {
        let records = self.backend.directory().list_profiles().await?;
        Ok(records.into_iter().map(|r| r.into_profile()).collect())
    }

    async fn update_user(&self, id: Uuid, full_name: String, role_id: Uuid) -> AppResult<()> {
        let update = UserUpdate {
            full_name: Some(full_name),
            role_id: Some(role_id),
            profile_picture_url: None,
        };
        self.backend.directory().update_user(id, update).await
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.backend.auth().admin_delete_user(id).await?;
        tracing::info!(user_id = %id, "user account deleted");
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.backend.directory().list_roles().await
    }
}

/// Case-insensitive substring search on full name or email
pub fn filter_users<'a>(users: &'a [UserProfile], term: &str) -> Vec<&'a UserProfile> {
    if term.is_empty() {
        return users.iter().collect();
    }

    let term = term.to_lowercase();
    users
        .iter()
        .filter(|u| {
            u.full_name.to_lowercase().contains(&term) || u.email.to_lowercase().contains(&term)
        })
        .collect()
}

/// Role preselected by the registration form: the one named "user"
pub fn default_role_id(roles: &[Role]) -> Option<Uuid> {
    roles.iter().find(|r| r.name == ROLE_USER).map(|r| r.id)
}
