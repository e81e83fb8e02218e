//! Profile service - the signed-in user's own edits.
//!
//! Writes go straight to the backend; the caller asks the session store for
//! a `refresh_profile()` after a successful write, since the store does not
//! observe these writes itself.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::backend::{Backend, UploadOptions, UserUpdate};
use crate::config::{AVATAR_BUCKET, AVATAR_CACHE_CONTROL};
use crate::domain::AvatarUpload;
use crate::errors::{AppError, AppResult};

/// Profile operations available to the signed-in user
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Change the user's display name
    async fn update_full_name(&self, user_id: Uuid, full_name: &str) -> AppResult<()>;

    /// Validate, upload and record a new profile picture; returns the
    /// public URL written to the user row
    async fn upload_avatar(&self, user_id: Uuid, upload: AvatarUpload) -> AppResult<String>;
}

/// Concrete implementation delegating to the backend client
pub struct ProfileManager<B: Backend> {
    backend: Arc<B>,
}

impl<B: Backend> ProfileManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: Backend> ProfileService for ProfileManager<B> {
    async fn update_full_name(&self, user_id: Uuid, full_name: &str) -> AppResult<()> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::validation("Full name is required"));
        }

        self.backend
            .directory()
            .update_user(user_id, UserUpdate::full_name(full_name))
            .await
    }

    async fn upload_avatar(&self, user_id: Uuid, upload: AvatarUpload) -> AppResult<String> {
        upload.validate()?;

        let path = upload.storage_path(user_id);
        let storage = self.backend.storage();

        storage
            .upload(
                AVATAR_BUCKET,
                &path,
                upload.bytes,
                &upload.content_type,
                UploadOptions {
                    cache_control: Some(AVATAR_CACHE_CONTROL.to_string()),
                    upsert: false,
                },
            )
            .await?;

        let url = storage.public_url(AVATAR_BUCKET, &path);

        self.backend
            .directory()
            .update_user(user_id, UserUpdate::avatar(url.clone()))
            .await?;

        tracing::info!(%user_id, %path, "profile picture updated");
        Ok(url)
    }
}
