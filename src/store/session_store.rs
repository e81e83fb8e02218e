//! Session/Profile store - process-wide authentication state.
//!
//! Single authority for "who is logged in and what is their profile". Two
//! independent inputs converge here: the startup session query and the
//! backend's session change subscription. Both run the same sequence: set
//! the session reference, fetch the joined profile row for the subject id,
//! publish the new snapshot to every subscriber.
//!
//! Completions are stamped with a monotonic sequence number; a fetch that
//! finishes after a newer one has been applied is discarded instead of
//! overwriting fresher state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::backend::{Backend, NewUserRecord};
use crate::domain::{Session, SignUpForm, UserProfile};
use crate::errors::{AppError, AppResult};

/// Phase of the authentication state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup session query not yet resolved
    Uninitialized,
    /// No session; profile is cleared and admin views are hidden
    Unauthenticated,
    /// Session set, profile fetch in flight
    Loading,
    /// Session set, profile fetch completed (the profile may still be absent
    /// if the fetch failed or yielded no row)
    Ready,
}

/// Published authentication state. Replaced wholesale on every transition.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub phase: AuthPhase,
    pub session: Option<Session>,
    pub profile: Option<UserProfile>,
}

impl AuthSnapshot {
    fn initial() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            session: None,
            profile: None,
        }
    }

    /// Whether admin-only views are reachable right now
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

/// Process-wide session/profile store.
///
/// Constructed once and passed explicitly to consuming views, which observe
/// it through [`SessionStore::subscribe`]. Views never mutate the snapshot
/// directly; after performing their own writes they call
/// [`SessionStore::refresh_profile`].
pub struct SessionStore<B: Backend> {
    backend: Arc<B>,
    state: watch::Sender<AuthSnapshot>,
    /// Stamp source for profile fetches
    fetch_seq: AtomicU64,
    /// Stamp of the last applied completion
    applied_seq: Mutex<u64>,
}

impl<B: Backend> SessionStore<B> {
    pub fn new(backend: Arc<B>) -> Arc<Self> {
        let (state, _) = watch::channel(AuthSnapshot::initial());

        Arc::new(Self {
            backend,
            state,
            fetch_seq: AtomicU64::new(0),
            applied_seq: Mutex::new(0),
        })
    }

    /// Spawn the session change listener and run the startup session query.
    ///
    /// The subscription is taken before the startup query so no event is
    /// missed; if both race, the sequence stamps decide which completion
    /// wins.
    pub async fn start(self: &Arc<Self>) {
        let mut changes = self.backend.auth().subscribe();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        tracing::debug!(event = ?change.event, "session change received");
                        store.apply_session(change.session).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session change listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        match self.backend.auth().current_session().await {
            Ok(session) => self.apply_session(session).await,
            Err(e) => {
                tracing::error!(error = %e, "startup session query failed");
                self.apply_session(None).await;
            }
        }
    }

    /// Observe snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Current snapshot for non-subscribing callers
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Register a new account: create the auth identity, then insert the
    /// matching profile row under the identity's subject id.
    ///
    /// If the row insert fails the freshly created identity is deleted
    /// again; when that compensation fails too the error escalates to
    /// [`AppError::PartialSignup`].
    ///
    /// # Errors
    /// `Validation` before any network call, `Auth` if identity creation
    /// fails, `Profile` if the row insert fails (identity compensated),
    /// `PartialSignup` if compensation fails as well.
    pub async fn sign_up(&self, form: &SignUpForm) -> AppResult<Session> {
        let role_id = form.validated()?;

        let auth = self.backend.auth();
        let session = auth.sign_up(&form.email, &form.password).await?;

        let record = NewUserRecord {
            id: session.user_id,
            email: form.email.clone(),
            full_name: form.full_name.clone(),
            role_id,
        };

        if let Err(insert_err) = self.backend.directory().insert_user(record).await {
            tracing::error!(
                user_id = %session.user_id,
                error = %insert_err,
                "profile insert failed after identity creation, compensating"
            );

            return match auth.admin_delete_user(session.user_id).await {
                Ok(()) => Err(insert_err),
                Err(comp_err) => Err(AppError::partial_signup(format!(
                    "{insert_err}; identity cleanup failed: {comp_err}"
                ))),
            };
        }

        Ok(session)
    }

    /// Password sign-in. Backend errors are surfaced verbatim; the snapshot
    /// updates through the change subscription.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        self.backend.auth().sign_in(email, password).await
    }

    /// Invalidate the session. Always succeeds from the caller's
    /// perspective; failures are logged and the local state is cleared
    /// through the change subscription regardless.
    pub async fn sign_out(&self) {
        if let Err(e) = self.backend.auth().sign_out().await {
            tracing::warn!(error = %e, "sign-out request failed");
        }
    }

    /// Re-fetch the joined profile row for the current subject.
    ///
    /// No-op without an active session. Views call this after their own
    /// direct writes to the user row, since the store does not observe those
    /// writes itself.
    pub async fn refresh_profile(&self) {
        let session = self.state.borrow().session.clone();
        let Some(session) = session else {
            return;
        };

        let seq = self.next_seq();
        let profile = self.fetch_profile(session.user_id).await;
        self.publish(
            seq,
            AuthSnapshot {
                phase: AuthPhase::Ready,
                session: Some(session),
                profile,
            },
        );
    }

    /// Shared transition for the startup query and change events
    async fn apply_session(&self, session: Option<Session>) {
        let seq = self.next_seq();

        match session {
            None => self.publish(
                seq,
                AuthSnapshot {
                    phase: AuthPhase::Unauthenticated,
                    session: None,
                    profile: None,
                },
            ),
            Some(session) => {
                self.publish(
                    seq,
                    AuthSnapshot {
                        phase: AuthPhase::Loading,
                        session: Some(session.clone()),
                        profile: None,
                    },
                );

                let profile = self.fetch_profile(session.user_id).await;
                self.publish(
                    seq,
                    AuthSnapshot {
                        phase: AuthPhase::Ready,
                        session: Some(session),
                        profile,
                    },
                );
            }
        }
    }

    /// Fetch the joined row, degrading to `None` on error. Fetch errors are
    /// logged, not surfaced; views render against an absent profile.
    async fn fetch_profile(&self, user_id: Uuid) -> Option<UserProfile> {
        match self.backend.directory().fetch_profile(user_id).await {
            Ok(Some(record)) => Some(record.into_profile()),
            Ok(None) => {
                tracing::warn!(%user_id, "no profile row for authenticated subject");
                None
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "profile fetch failed");
                None
            }
        }
    }

    fn next_seq(&self) -> u64 {
        self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a completion unless a newer one has already been applied
    fn publish(&self, seq: u64, snapshot: AuthSnapshot) {
        let mut applied = match self.applied_seq.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seq < *applied {
            tracing::debug!(seq, applied = *applied, "discarding stale completion");
            return;
        }
        *applied = seq;
        self.state.send_replace(snapshot);
    }
}
