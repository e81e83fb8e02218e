//! Session/Profile store - the application's authentication core

mod session_store;

pub use session_store::{AuthPhase, AuthSnapshot, SessionStore};
