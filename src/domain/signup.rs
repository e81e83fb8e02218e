//! Registration form with client-side validation.
//!
//! Validation runs before any network call so obviously bad submissions
//! fail fast without consuming backend quota.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Data captured by the registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    /// Selected role; `None` when the role picker was left untouched
    pub role_id: Option<Uuid>,
}

impl SignUpForm {
    /// Run all client-side checks, in the order the form reports them.
    ///
    /// # Errors
    /// Returns `AppError::Validation` on the first failing check.
    pub fn validated(&self) -> AppResult<Uuid> {
        if self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
            || self.full_name.trim().is_empty()
        {
            return Err(AppError::validation("All fields are required"));
        }

        let role_id = self
            .role_id
            .ok_or_else(|| AppError::validation("All fields are required"))?;

        if let Err(errors) = self.validate() {
            return Err(AppError::validation(first_message(&errors)));
        }

        if self.password != self.confirm_password {
            return Err(AppError::validation("Passwords do not match"));
        }

        Ok(role_id)
    }
}

/// Pick the first human-readable message out of a validator error set
fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}
