//! Application services - use cases built on the backend client
//!
//! Services perform their own reads and writes against the backend; after a
//! successful write the initiating view asks the session store to refresh.

mod admin_service;
mod profile_service;

pub use admin_service::{default_role_id, filter_users, AdminDirectory, AdminService};
pub use profile_service::{ProfileManager, ProfileService};
