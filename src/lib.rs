//! user-console - Core library for a user-management console
//!
//! End users edit their own profile and avatar; administrators list, edit
//! and delete accounts. All persistence, authentication and file storage are
//! delegated to a managed backend service consumed through capability
//! traits; this crate owns the session/profile state and the use cases the
//! presentation layer binds to.
//!
//! # Architecture Layers
//!
//! - **config**: Deployment configuration and constants
//! - **domain**: Users, roles, sessions and validated value objects
//! - **backend**: Capability traits for the managed service + REST client
//! - **store**: Session/profile store (the authentication state machine)
//! - **services**: Profile and admin use cases
//! - **errors**: Centralized error handling

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod services;
pub mod store;

// Re-export commonly used types at crate root
pub use backend::{Backend, RestBackend};
pub use config::Config;
pub use domain::{AvatarUpload, Role, Session, SignUpForm, UserProfile};
pub use errors::{AppError, AppResult};
pub use store::{AuthPhase, AuthSnapshot, SessionStore};
