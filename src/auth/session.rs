//! Session bridge: publishes the authenticated user's profile
//!
//! Holds the one shared "current user" value as a watch channel. The
//! bridge task is the only writer; screens and command handlers read.
//! Every publication is liveness-guarded so a profile load finishing
//! after teardown is dropped on the floor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::api;
use crate::backend::{Backend, BackendError, BackendResult};
use crate::models::{NewUser, User, UserUpdate};

use super::{AuthApi, AuthEvent};

/// Published auth state: uninitialized -> loading -> authenticated with a
/// profile, or unauthenticated. Re-entered on every session change.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

pub struct SessionBridge {
    auth: Arc<dyn AuthApi>,
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<SessionState>>,
    live: Arc<AtomicBool>,
    listener: JoinHandle<()>,
}

impl SessionBridge {
    /// Restore any stored session, publish the resulting state, and keep
    /// listening for auth events until the bridge is closed.
    pub async fn start(auth: Arc<dyn AuthApi>, backend: Arc<dyn Backend>) -> Self {
        let state = Arc::new(watch::channel(SessionState { user: None, loading: true }).0);
        let live = Arc::new(AtomicBool::new(true));

        // Subscribe before the initial load so no event can fall between.
        let events = auth.subscribe();

        match auth.current_session().await {
            Ok(Some(session)) => {
                load_profile(backend.as_ref(), &state, &live, &session.user_id).await;
            }
            Ok(None) => publish(&state, &live, |s| {
                s.user = None;
                s.loading = false;
            }),
            Err(e) => {
                tracing::error!("Failed to restore session: {}", e);
                publish(&state, &live, |s| s.loading = false);
            }
        }

        let listener = tokio::spawn(listen(
            events,
            Arc::clone(&backend),
            Arc::clone(&state),
            Arc::clone(&live),
        ));

        Self { auth, backend, state, live, listener }
    }

    /// Watch the published state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<()> {
        publish(&self.state, &self.live, |s| s.loading = true);
        match self.auth.sign_in(email, password).await {
            Ok(session) => {
                load_profile(self.backend.as_ref(), &self.state, &self.live, &session.user_id)
                    .await;
                Ok(())
            }
            Err(e) => {
                publish(&self.state, &self.live, |s| s.loading = false);
                Err(e)
            }
        }
    }

    /// Register an account, then create its profile row before reporting
    /// success.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &NewUser,
    ) -> BackendResult<User> {
        publish(&self.state, &self.live, |s| s.loading = true);
        let session = match self.auth.sign_up(email, password).await {
            Ok(session) => session,
            Err(e) => {
                publish(&self.state, &self.live, |s| s.loading = false);
                return Err(e);
            }
        };

        let created = api::create_user_profile(
            self.backend.as_ref(),
            &session.user_id,
            &session.email,
            profile,
        )
        .await;

        match created {
            Ok(user) => {
                let published = user.clone();
                publish(&self.state, &self.live, move |s| {
                    s.user = Some(published);
                    s.loading = false;
                });
                Ok(user)
            }
            Err(e) => {
                publish(&self.state, &self.live, |s| s.loading = false);
                Err(e)
            }
        }
    }

    /// Sign out and clear the published user. The local session is
    /// cleared even when remote revocation fails.
    pub async fn sign_out(&self) -> BackendResult<()> {
        let result = self.auth.sign_out().await;
        publish(&self.state, &self.live, |s| {
            s.user = None;
            s.loading = false;
        });
        result
    }

    /// Write-through profile update; the stored row is re-published.
    pub async fn update_profile(&self, updates: &UserUpdate) -> BackendResult<User> {
        let Some(user) = self.current_user() else {
            return Err(BackendError::unauthorized("no user signed in"));
        };

        let updated =
            api::update_user_profile(self.backend.as_ref(), &user.id, updates).await?;
        let published = updated.clone();
        publish(&self.state, &self.live, move |s| s.user = Some(published));
        Ok(updated)
    }

    /// Tear the bridge down. In-flight loads can no longer publish.
    pub fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.listener.abort();
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        self.close();
    }
}

fn publish(
    state: &watch::Sender<SessionState>,
    live: &AtomicBool,
    update: impl FnOnce(&mut SessionState),
) {
    if !live.load(Ordering::SeqCst) {
        return;
    }
    state.send_modify(update);
}

async fn load_profile(
    backend: &dyn Backend,
    state: &watch::Sender<SessionState>,
    live: &AtomicBool,
    user_id: &str,
) {
    match api::get_user_profile(backend, user_id).await {
        Ok(user) => publish(state, live, move |s| {
            s.user = Some(user);
            s.loading = false;
        }),
        Err(e) => {
            tracing::error!("Failed to load user profile: {}", e);
            publish(state, live, |s| s.loading = false);
        }
    }
}

async fn listen(
    mut events: broadcast::Receiver<AuthEvent>,
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<SessionState>>,
    live: Arc<AtomicBool>,
) {
    loop {
        match events.recv().await {
            Ok(AuthEvent::SignedIn(session)) | Ok(AuthEvent::TokenRefreshed(session)) => {
                publish(&state, &live, |s| s.loading = true);
                load_profile(backend.as_ref(), &state, &live, &session.user_id).await;
            }
            Ok(AuthEvent::SignedOut) => publish(&state, &live, |s| {
                s.user = None;
                s.loading = false;
            }),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {} auth events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
