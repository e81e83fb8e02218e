//! Shared test support: a stateful in-memory backend double.
//!
//! Tracks per-capability call counts so tests can assert that client-side
//! validation short-circuits before any backend call, and supports gating
//! profile fetches to order completions deterministically.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::{broadcast, oneshot, watch};
use uuid::Uuid;

use user_console::backend::{
    AuthApi, Backend, DirectoryApi, NewUserRecord, ProfileRecord, RoleName, StorageApi,
    UploadOptions, UserUpdate,
};
use user_console::domain::{Role, Session, SessionChange};
use user_console::errors::{AppError, AppResult};
use user_console::store::AuthSnapshot;

/// Registered auth identity
struct Identity {
    email: String,
    password: String,
}

/// Persisted user row
struct StoredRow {
    email: String,
    full_name: String,
    role_id: Uuid,
    profile_picture_url: Option<String>,
    created_at: DateTime<Utc>,
}

/// One recorded storage upload
pub struct UploadRecord {
    pub bucket: String,
    pub path: String,
    pub size: usize,
    pub content_type: String,
    pub cache_control: Option<String>,
    pub upsert: bool,
}

pub struct FakeCore {
    identities: Mutex<HashMap<Uuid, Identity>>,
    rows: Mutex<HashMap<Uuid, StoredRow>>,
    roles: Mutex<Vec<Role>>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionChange>,
    insert_seq: AtomicUsize,

    // Per-capability call counters
    pub auth_calls: AtomicUsize,
    pub directory_calls: AtomicUsize,
    pub storage_calls: AtomicUsize,

    // Failure switches
    pub fail_insert: AtomicBool,
    pub fail_admin_delete: AtomicBool,

    // Profile fetch gating (claim order = vector order)
    gate_fetches: AtomicBool,
    pending_fetches: Mutex<Vec<oneshot::Sender<Option<ProfileRecord>>>>,

    pub uploads: Mutex<Vec<UploadRecord>>,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub core: Arc<FakeCore>,
}

impl FakeBackend {
    /// Fake backend seeded with the pre-provisioned "admin" and "user" roles
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        let base = Utc::now();

        let roles = vec![
            Role {
                id: Uuid::new_v4(),
                name: "admin".to_string(),
                description: "Administrator".to_string(),
                created_at: base,
            },
            Role {
                id: Uuid::new_v4(),
                name: "user".to_string(),
                description: "Standard user".to_string(),
                created_at: base,
            },
        ];

        Self {
            core: Arc::new(FakeCore {
                identities: Mutex::new(HashMap::new()),
                rows: Mutex::new(HashMap::new()),
                roles: Mutex::new(roles),
                session: Mutex::new(None),
                events,
                insert_seq: AtomicUsize::new(0),
                auth_calls: AtomicUsize::new(0),
                directory_calls: AtomicUsize::new(0),
                storage_calls: AtomicUsize::new(0),
                fail_insert: AtomicBool::new(false),
                fail_admin_delete: AtomicBool::new(false),
                gate_fetches: AtomicBool::new(false),
                pending_fetches: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl Backend for FakeBackend {
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

impl FakeCore {
    pub fn total_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
            + self.directory_calls.load(Ordering::SeqCst)
            + self.storage_calls.load(Ordering::SeqCst)
    }

    pub fn role_id(&self, name: &str) -> Uuid {
        self.roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.id)
            .expect("role not seeded")
    }

    /// Register an identity and the matching profile row
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role_id: Uuid,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.identities.lock().unwrap().insert(
            id,
            Identity {
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        self.insert_row(
            id,
            NewUserRecord {
                id,
                email: email.to_string(),
                full_name: full_name.to_string(),
                role_id,
            },
        );
        id
    }

    /// Set the restored session without emitting a change event
    pub fn install_session(&self, user_id: Uuid, email: &str) -> Session {
        let session = self.make_session(user_id, email);
        *self.session.lock().unwrap() = Some(session.clone());
        session
    }

    pub fn emit(&self, change: SessionChange) {
        let _ = self.events.send(change);
    }

    pub fn current(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    pub fn has_identity(&self, id: Uuid) -> bool {
        self.identities.lock().unwrap().contains_key(&id)
    }

    /// Gate subsequent profile fetches; each fetch blocks until the test
    /// responds through `respond_fetch`
    pub fn gate_fetches(&self) {
        self.gate_fetches.store(true, Ordering::SeqCst);
    }

    pub async fn wait_for_pending_fetches(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.pending_fetches.lock().unwrap().len() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} pending fetches"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Complete the pending fetch at `index` (claim order) with `record`
    pub fn respond_fetch(&self, index: usize, record: Option<ProfileRecord>) {
        let tx = self.pending_fetches.lock().unwrap().remove(index);
        let _ = tx.send(record);
    }

    /// Build an arbitrary joined record, for gated responses
    pub fn record(&self, id: Uuid, email: &str, full_name: &str, role_name: &str) -> ProfileRecord {
        ProfileRecord {
            id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role_id: self.role_id(role_name),
            profile_picture_url: None,
            created_at: Utc::now(),
            role: Some(RoleName {
                name: role_name.to_string(),
            }),
        }
    }

    fn make_session(&self, user_id: Uuid, email: &str) -> Session {
        Session {
            user_id,
            email: email.to_string(),
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        }
    }

    fn insert_row(&self, id: Uuid, record: NewUserRecord) {
        // Strictly increasing created_at so listing order is deterministic
        let seq = self.insert_seq.fetch_add(1, Ordering::SeqCst) as i64;
        self.rows.lock().unwrap().insert(
            id,
            StoredRow {
                email: record.email,
                full_name: record.full_name,
                role_id: record.role_id,
                profile_picture_url: None,
                created_at: Utc::now() + ChronoDuration::milliseconds(seq),
            },
        );
    }

    fn row_to_record(&self, id: Uuid, row: &StoredRow) -> ProfileRecord {
        let role = self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == row.role_id)
            .map(|r| RoleName {
                name: r.name.clone(),
            });

        ProfileRecord {
            id,
            email: row.email.clone(),
            full_name: row.full_name.clone(),
            role_id: row.role_id,
            profile_picture_url: row.profile_picture_url.clone(),
            created_at: row.created_at,
            role,
        }
    }
}

#[async_trait]
impl AuthApi for FakeCore {
    async fn current_session(&self) -> AppResult<Option<Session>> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.current())
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);

        let mut identities = self.identities.lock().unwrap();
        if identities.values().any(|i| i.email == email) {
            return Err(AppError::auth("User already registered"));
        }

        let id = Uuid::new_v4();
        identities.insert(
            id,
            Identity {
                email: email.to_string(),
                password: password.to_string(),
            },
        );
        drop(identities);

        let session = self.make_session(id, email);
        *self.session.lock().unwrap() = Some(session.clone());
        self.emit(SessionChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);

        let matched = self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|(_, i)| i.email == email && i.password == password)
            .map(|(id, _)| *id);

        match matched {
            Some(id) => {
                let session = self.make_session(id, email);
                *self.session.lock().unwrap() = Some(session.clone());
                self.emit(SessionChange::signed_in(session.clone()));
                Ok(session)
            }
            None => Err(AppError::InvalidCredentials),
        }
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        *self.session.lock().unwrap() = None;
        self.emit(SessionChange::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }

    async fn admin_delete_user(&self, id: Uuid) -> AppResult<()> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_admin_delete.load(Ordering::SeqCst) {
            return Err(AppError::auth("identity deletion rejected"));
        }

        self.identities.lock().unwrap().remove(&id);
        // Row cleanup cascades in the real backend
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl DirectoryApi for FakeCore {
    async fn fetch_profile(&self, user_id: Uuid) -> AppResult<Option<ProfileRecord>> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        if self.gate_fetches.load(Ordering::SeqCst) {
            let (tx, rx) = oneshot::channel();
            self.pending_fetches.lock().unwrap().push(tx);
            return Ok(rx.await.unwrap_or(None));
        }

        let rows = self.rows.lock().unwrap();
        let record = rows.get(&user_id).map(|row| self.row_to_record(user_id, row));
        Ok(record)
    }

    async fn insert_user(&self, record: NewUserRecord) -> AppResult<()> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::profile("profile row insert rejected"));
        }

        self.insert_row(record.id, record);
        Ok(())
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> AppResult<()> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::profile("no row matched the update"))?;

        if let Some(full_name) = update.full_name {
            row.full_name = full_name;
        }
        if let Some(role_id) = update.role_id {
            row.role_id = role_id;
        }
        if let Some(url) = update.profile_picture_url {
            row.profile_picture_url = Some(url);
        }
        Ok(())
    }

    async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        let rows = self.rows.lock().unwrap();
        let mut records: Vec<ProfileRecord> = rows
            .iter()
            .map(|(id, row)| self.row_to_record(*id, row))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);

        let mut roles = self.roles.lock().unwrap().clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl StorageApi for FakeCore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        options: UploadOptions,
    ) -> AppResult<()> {
        self.storage_calls.fetch_add(1, Ordering::SeqCst);

        let mut uploads = self.uploads.lock().unwrap();
        if !options.upsert && uploads.iter().any(|u| u.bucket == bucket && u.path == path) {
            return Err(AppError::storage("The resource already exists"));
        }

        uploads.push(UploadRecord {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size: bytes.len(),
            content_type: content_type.to_string(),
            cache_control: options.cache_control,
            upsert: options.upsert,
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://cdn.test/{bucket}/{path}")
    }
}

/// A backend assembled from independent capability implementations, so
/// single tests can inject mockall mocks per concern
pub struct MixedBackend {
    pub auth: Arc<dyn AuthApi>,
    pub directory: Arc<dyn DirectoryApi>,
    pub storage: Arc<dyn StorageApi>,
}

impl Backend for MixedBackend {
    fn auth(&self) -> Arc<dyn AuthApi> {
        self.auth.clone()
    }

    fn directory(&self) -> Arc<dyn DirectoryApi> {
        self.directory.clone()
    }

    fn storage(&self) -> Arc<dyn StorageApi> {
        self.storage.clone()
    }
}

/// Wait until the published snapshot satisfies `pred`, or fail after 2s
pub async fn wait_until(
    rx: &mut watch::Receiver<AuthSnapshot>,
    mut pred: impl FnMut(&AuthSnapshot) -> bool,
) -> AuthSnapshot {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return snapshot;
            }
            rx.changed().await.expect("session store dropped");
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}
