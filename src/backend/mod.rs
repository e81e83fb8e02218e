//! Backend service client - capability surface of the managed platform
//!
//! All persistence, authentication and file storage are delegated to a
//! managed backend service. This module defines the interface-level
//! capability traits the rest of the application consumes, plus the REST
//! implementation talking to the real service. Wire details never leak past
//! this layer.

mod models;
mod rest;

pub use models::{NewUserRecord, ProfileRecord, RoleName, UploadOptions, UserUpdate};
pub use rest::RestBackend;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::{Role, Session, SessionChange};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Session issuance and validation.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Get the session restored for this client, if any
    async fn current_session(&self) -> AppResult<Option<Session>>;

    /// Create a new auth identity and return its initial session
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Password authentication
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Invalidate the current session
    async fn sign_out(&self) -> AppResult<()>;

    /// Subscribe to session change notifications (sign-in, sign-out, silent
    /// token refresh)
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    /// Delete an auth identity. Row cleanup is assumed cascaded by the
    /// backend; this client does not verify it.
    async fn admin_delete_user(&self, id: Uuid) -> AppResult<()>;
}

/// Row-level reads and writes on the `users` and `roles` tables.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Fetch a single user row joined with its role name (maybe-single)
    async fn fetch_profile(&self, user_id: Uuid) -> AppResult<Option<ProfileRecord>>;

    /// Insert the profile row matching a freshly created auth identity
    async fn insert_user(&self, record: NewUserRecord) -> AppResult<()>;

    /// Patch a user row
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> AppResult<()>;

    /// All user rows joined with role names, newest first
    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>>;

    /// All role rows, ordered by name
    async fn list_roles(&self) -> AppResult<Vec<Role>>;
}

/// Object storage with public URL derivation.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Upload an object. Fails if the path exists and `upsert` is off.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> AppResult<()>;

    /// Derive the public URL for an object path
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Access to the backend capabilities, grouped by concern.
///
/// The store and services depend on this trait rather than on a concrete
/// client, so tests can swap in fakes per capability.
pub trait Backend: Send + Sync + 'static {
    fn auth(&self) -> Arc<dyn AuthApi>;

    fn directory(&self) -> Arc<dyn DirectoryApi>;

    fn storage(&self) -> Arc<dyn StorageApi>;
}
