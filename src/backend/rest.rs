//! REST client for the managed backend service.
//!
//! Talks to the service's own protocol: the auth endpoints under
//! `/auth/v1`, row-level queries under `/rest/v1` and object storage under
//! `/storage/v1`. The rest of the application only sees the capability
//! traits; everything wire-level stays in this file.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{
    AuthApi, Backend, DirectoryApi, NewUserRecord, ProfileRecord, StorageApi, UploadOptions,
    UserUpdate,
};
use crate::config::Config;
use crate::domain::{Role, Session, SessionChange};
use crate::errors::{AppError, AppResult};

/// Column projection used for user queries, with the role relation expanded
const PROFILE_SELECT: &str =
    "id,email,full_name,role_id,profile_picture_url,created_at,roles(name)";

/// Capacity of the session change channel; slow subscribers lag, they do not
/// block auth operations
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// REST implementation of the backend capability surface.
///
/// Holds the only mutable client-side state the service owns: the current
/// session, replaced wholesale on every auth event.
#[derive(Clone)]
pub struct RestBackend {
    core: Arc<RestCore>,
}

impl RestBackend {
    /// Create a client from deployment configuration.
    ///
    /// # Errors
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            core: Arc::new(RestCore {
                http: Client::builder().build()?,
                base_url: config.backend_url.trim_end_matches('/').to_string(),
                api_key: config.backend_key().to_string(),
                session: RwLock::new(None),
                events,
            }),
        })
    }

    /// Exchange the refresh token for a new session and notify subscribers
    /// with a `TokenRefreshed` event.
    pub async fn refresh_session(&self) -> AppResult<Session> {
        self.core.refresh_session().await
    }
}

impl Backend for RestBackend {
    fn auth(&self) -> Arc<dyn AuthApi> {
        self.core.clone()
    }

    fn directory(&self) -> Arc<dyn DirectoryApi> {
        self.core.clone()
    }

    fn storage(&self) -> Arc<dyn StorageApi> {
        self.core.clone()
    }
}

struct RestCore {
    http: Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionChange>,
}

/// Session payload returned by the auth endpoints
#[derive(Debug, Deserialize)]
struct AuthSessionResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUserResponse,
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: Uuid,
    email: Option<String>,
}

impl AuthSessionResponse {
    fn into_session(self, fallback_email: &str) -> Session {
        Session {
            user_id: self.user.id,
            email: self.user.email.unwrap_or_else(|| fallback_email.to_string()),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

/// Error body shapes the service emits across its sub-APIs
#[derive(Debug, Deserialize, Default)]
struct ApiErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    body.msg
        .or(body.message)
        .or(body.error_description)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

impl RestCore {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for table/storage requests: the session token when
    /// authenticated, the publishable key otherwise
    async fn bearer(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.api_key.clone())
    }

    async fn install_session(&self, session: Session, change: SessionChange) {
        *self.session.write().await = Some(session);
        // Nobody listening is fine; the store subscribes lazily
        let _ = self.events.send(change);
    }

    async fn refresh_session(&self) -> AppResult<Session> {
        let (token, email) = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| (s.refresh_token.clone(), s.email.clone()))
            .ok_or_else(|| AppError::auth("No session to refresh"))?;

        let response = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::auth(error_message(response).await));
        }

        let session = response
            .json::<AuthSessionResponse>()
            .await?
            .into_session(&email);
        self.install_session(session.clone(), SessionChange::refreshed(session.clone()))
            .await;
        Ok(session)
    }
}

#[async_trait]
impl AuthApi for RestCore {
    async fn current_session(&self) -> AppResult<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::auth(error_message(response).await));
        }

        let session = response
            .json::<AuthSessionResponse>()
            .await?
            .into_session(email);
        self.install_session(session.clone(), SessionChange::signed_in(session.clone()))
            .await;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
                return Err(AppError::InvalidCredentials);
            }
            return Err(AppError::auth(error_message(response).await));
        }

        let session = response
            .json::<AuthSessionResponse>()
            .await?
            .into_session(email);
        self.install_session(session.clone(), SessionChange::signed_in(session.clone()))
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        let token = self
            .session
            .write()
            .await
            .take()
            .map(|s| s.access_token);

        // The local session is gone either way; subscribers see the sign-out
        // even if the revocation request fails.
        let result = match token {
            Some(token) => {
                let response = self
                    .http
                    .post(self.url("/auth/v1/logout"))
                    .header("apikey", &self.api_key)
                    .bearer_auth(token)
                    .send()
                    .await?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(AppError::auth(error_message(response).await))
                }
            }
            None => Ok(()),
        };

        let _ = self.events.send(SessionChange::signed_out());
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }

    async fn admin_delete_user(&self, id: Uuid) -> AppResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("/auth/v1/admin/users/{id}")))
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::auth(error_message(response).await));
        }

        Ok(())
    }
}

#[async_trait]
impl DirectoryApi for RestCore {
    async fn fetch_profile(&self, user_id: Uuid) -> AppResult<Option<ProfileRecord>> {
        let id_filter = format!("eq.{user_id}");
        let response = self
            .http
            .get(self.url("/rest/v1/users"))
            .query(&[("select", PROFILE_SELECT), ("id", id_filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::profile(error_message(response).await));
        }

        let mut rows: Vec<ProfileRecord> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert_user(&self, record: NewUserRecord) -> AppResult<()> {
        let response = self
            .http
            .post(self.url("/rest/v1/users"))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(self.bearer().await)
            .json(&record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::profile(error_message(response).await));
        }

        Ok(())
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> AppResult<()> {
        // The query layer rejects an empty patch
        if update.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .patch(self.url("/rest/v1/users"))
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(self.bearer().await)
            .json(&update)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::profile(error_message(response).await));
        }

        Ok(())
    }

    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>> {
        let response = self
            .http
            .get(self.url("/rest/v1/users"))
            .query(&[("select", PROFILE_SELECT), ("order", "created_at.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::profile(error_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let response = self
            .http
            .get(self.url("/rest/v1/roles"))
            .query(&[("select", "*"), ("order", "name.asc")])
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::profile(error_message(response).await));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl StorageApi for RestCore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> AppResult<()> {
        let mut request = self
            .http
            .post(self.url(&format!("/storage/v1/object/{bucket}/{path}")))
            .header("apikey", &self.api_key)
            .header("content-type", content_type)
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .bearer_auth(self.bearer().await);

        if let Some(cache_control) = &options.cache_control {
            request = request.header("cache-control", cache_control.as_str());
        }

        let response = request.body(bytes).send().await?;

        if !response.status().is_success() {
            return Err(AppError::storage(error_message(response).await));
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}
