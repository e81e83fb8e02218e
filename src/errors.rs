//! Centralized error handling.
//!
//! Provides a unified error type for the entire application. Every
//! asynchronous operation returns a success/error result to the initiating
//! caller; nothing in this crate panics on a failed backend call.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Backend auth failure surfaced verbatim (weak password, duplicate
    /// account, unknown account).
    #[error("{0}")]
    Auth(String),

    // Client-side validation (fails fast, before any network call)
    #[error("{0}")]
    Validation(String),

    // Profile row insert/update/fetch failure
    #[error("{0}")]
    Profile(String),

    // Object storage upload rejected (client-side size/type checks or
    // backend quota/permissions)
    #[error("{0}")]
    Storage(String),

    #[error("Resource not found")]
    NotFound,

    /// Auth identity was created, the profile row insert failed, and the
    /// compensating identity deletion failed as well. The account is left
    /// half-registered and needs manual cleanup.
    #[error("Partial signup: {0}")]
    PartialSignup(String),

    // External service errors
    #[error("Request failed")]
    Http(#[from] reqwest::Error),

    #[error("Malformed backend response")]
    Decode(#[from] serde_json::Error),
}

impl AppError {
    /// Get error code for client rendering
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Profile(_) => "PROFILE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::PartialSignup(_) => "PARTIAL_SIGNUP",
            AppError::Http(_) => "NETWORK_ERROR",
            AppError::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Get user-facing message (hides transport details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http(e) => {
                tracing::error!("HTTP error: {:?}", e);
                "Could not reach the backend service".to_string()
            }
            AppError::Decode(e) => {
                tracing::error!("Decode error: {:?}", e);
                "Unexpected response from the backend service".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        AppError::Profile(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AppError::Storage(msg.into())
    }

    pub fn partial_signup(msg: impl Into<String>) -> Self {
        AppError::PartialSignup(msg.into())
    }
}
