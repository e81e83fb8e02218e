//! Profile picture upload value object.

use chrono::Utc;
use uuid::Uuid;

use crate::config::{is_allowed_avatar_type, MAX_AVATAR_BYTES};
use crate::errors::{AppError, AppResult};

/// A file picked for upload as a profile picture.
///
/// Validation happens client-side, before any network call: files over the
/// size limit or outside the image allow-list never reach the backend.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Check size and MIME type.
    ///
    /// # Errors
    /// Returns `AppError::Storage` with a user-facing message on rejection.
    pub fn validate(&self) -> AppResult<()> {
        if self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(AppError::storage("File size must be less than 5MB"));
        }

        if !is_allowed_avatar_type(&self.content_type) {
            return Err(AppError::storage(
                "Only JPEG, PNG, GIF, and WebP images are allowed",
            ));
        }

        Ok(())
    }

    /// Derive the storage object path: `{user_id}/{millis}.{ext}`.
    ///
    /// The timestamp keeps successive uploads from colliding, since the
    /// upload is issued without upsert.
    pub fn storage_path(&self, user_id: Uuid) -> String {
        format!(
            "{}/{}.{}",
            user_id,
            Utc::now().timestamp_millis(),
            self.extension()
        )
    }

    /// File extension from the picked file's name, falling back to one
    /// derived from the MIME type
    fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((prefix, ext)) if !prefix.is_empty() && !ext.is_empty() => ext,
            _ => match self.content_type.as_str() {
                "image/jpeg" => "jpg",
                "image/png" => "png",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "bin",
            },
        }
    }
}
