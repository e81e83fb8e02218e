//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Authentication
// =============================================================================

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_USER: &str = "user";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Avatar Uploads
// =============================================================================

/// Maximum profile picture size in bytes (5 MiB)
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for profile pictures
pub const ALLOWED_AVATAR_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Storage bucket holding profile pictures
pub const AVATAR_BUCKET: &str = "profile-pictures";

/// Cache-Control value sent with avatar uploads (seconds)
pub const AVATAR_CACHE_CONTROL: &str = "3600";

/// Check if a MIME type is an accepted avatar type
pub fn is_allowed_avatar_type(content_type: &str) -> bool {
    ALLOWED_AVATAR_TYPES.contains(&content_type)
}

// =============================================================================
// Backend Service
// =============================================================================

/// Default backend base URL (for development)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:54321";
