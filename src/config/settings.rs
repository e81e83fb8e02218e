//! Application settings loaded from environment variables.

use std::env;

use super::constants::DEFAULT_BACKEND_URL;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Base URL of the managed backend service
    pub backend_url: String,
    /// Publishable API key provisioned for this deployment
    backend_key: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("backend_url", &self.backend_url)
            .field("backend_key", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if BACKEND_KEY is not set in a release build.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let backend_key = env::var("BACKEND_KEY").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("BACKEND_KEY not set, using placeholder for development");
                "dev-anon-key".to_string()
            } else {
                panic!("BACKEND_KEY environment variable must be set in production");
            }
        });

        Self {
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            backend_key,
        }
    }

    /// Create configuration explicitly (tests, embedding applications)
    pub fn new(backend_url: impl Into<String>, backend_key: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            backend_key: backend_key.into(),
        }
    }

    /// Get the API key for backend requests
    pub fn backend_key(&self) -> &str {
        &self.backend_key
    }
}
