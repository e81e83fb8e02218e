//! Domain layer - Core entities and value objects
//!
//! Models the console's business concepts independent of the backend
//! transport: users and roles, the session issued by the auth service, and
//! the validated form/upload value objects.

pub mod avatar;
pub mod session;
pub mod signup;
pub mod user;

pub use avatar::AvatarUpload;
pub use session::{Session, SessionChange, SessionEvent};
pub use signup::SignUpForm;
pub use user::{Role, RoleResolution, UserProfile};
