//! Session store: who is signed in and which role they hold.
//!
//! SYSTEM CONTEXT
//! ==============
//! The composition root owns one [`SessionStore`] and mirrors its snapshots
//! into a Leptos signal. Route guards and the post-login redirector only read
//! those snapshots; every write goes through the store.
//!
//! DESIGN
//! ======
//! Readiness tracks the *session* lookup only. The profile row is fetched
//! afterwards without blocking readiness, so a snapshot can legitimately hold
//! an identity whose profile is still [`ProfileState::Pending`]. Auth changes
//! are applied strictly one at a time; a change to a different identity drops
//! any profile lookup still in flight for the previous one.
//!
//! ERROR HANDLING
//! ==============
//! Lookup failures and timeouts are logged and degrade to "signed out" (session)
//! or "no profile" (profile). Nothing is surfaced to the caller.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable, Either, LocalBoxFuture, select};
use futures::{FutureExt, StreamExt};
use leptos::logging::{log, warn};

use crate::net::backend::{AuthBackend, AuthChanges, AuthSubscription, Timer, TimedOut, Unsubscribe, bounded};
use crate::net::types::{AuthEvent, Identity, Profile, Role, Session};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bounds on the two lookups the store performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_timeout: Duration,
    pub profile_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { session_timeout: DEFAULT_SESSION_TIMEOUT, profile_timeout: DEFAULT_PROFILE_TIMEOUT }
    }
}

/// Whether the initial session lookup has completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Readiness {
    #[default]
    Loading,
    Resolved,
}

/// Local mirror of the profile row for the current identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProfileState {
    /// Identity present, lookup still in flight.
    Pending,
    /// No row: signed out, not found, lookup failed, or timed out.
    #[default]
    Missing,
    Loaded(Profile),
}

impl ProfileState {
    pub fn loaded(&self) -> Option<&Profile> {
        match self {
            ProfileState::Loaded(profile) => Some(profile),
            ProfileState::Pending | ProfileState::Missing => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.loaded().map(|profile| profile.role)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ProfileState::Pending)
    }
}

/// Immutable snapshot handed to every consumer.
///
/// Fields are private so the "no identity implies no profile" invariant can
/// only be broken from inside this module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    readiness: Readiness,
    identity: Option<Identity>,
    profile: ProfileState,
}

/// What the caller should do about the profile lookup after a session change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileFetch {
    /// Look up the profile for this identity id.
    Start(String),
    /// Leave any lookup in flight alone.
    Keep,
    /// Drop any lookup in flight.
    Cancel,
}

impl SessionState {
    /// State before the first session lookup completes.
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn signed_out() -> Self {
        Self { readiness: Readiness::Resolved, identity: None, profile: ProfileState::Missing }
    }

    /// A resolved snapshot with an identity. `profile` may be `Pending`.
    pub fn signed_in(identity: Identity, profile: ProfileState) -> Self {
        Self { readiness: Readiness::Resolved, identity: Some(identity), profile }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Resolved
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn profile(&self) -> &ProfileState {
        &self.profile
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.role()
    }

    /// Mirror a session report from the auth service.
    ///
    /// Re-reporting the identity already held leaves the snapshot untouched; a
    /// profile that previously failed to load is retried in the background.
    pub(crate) fn apply_session(&mut self, session: Option<&Session>) -> ProfileFetch {
        self.readiness = Readiness::Resolved;
        let Some(user) = session.map(|session| &session.user) else {
            self.identity = None;
            self.profile = ProfileState::Missing;
            return ProfileFetch::Cancel;
        };

        match &self.identity {
            Some(current) if current.id == user.id => {
                if current != user {
                    self.identity = Some(user.clone());
                }
                match self.profile {
                    ProfileState::Missing => ProfileFetch::Start(user.id.clone()),
                    ProfileState::Pending | ProfileState::Loaded(_) => ProfileFetch::Keep,
                }
            }
            _ => {
                self.identity = Some(user.clone());
                self.profile = ProfileState::Pending;
                ProfileFetch::Start(user.id.clone())
            }
        }
    }

    /// Store a profile lookup result. Returns `false` when the result belongs
    /// to an identity that is no longer current.
    pub(crate) fn apply_profile(&mut self, identity_id: &str, profile: Option<Profile>) -> bool {
        if self.identity.as_ref().map(|identity| identity.id.as_str()) != Some(identity_id) {
            return false;
        }
        self.profile = profile.map_or(ProfileState::Missing, ProfileState::Loaded);
        true
    }
}

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Token returned by [`SessionStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Inner {
    state: SessionState,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
}

/// Single source of truth for the signed-in identity and its profile.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("state", &self.snapshot()).field("config", &self.config).finish()
    }
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())), config }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Register a listener called with every changed snapshot.
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + Send + Sync + 'static) -> ListenerId {
        let mut inner = self.lock();
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.push((id, Arc::new(listener)));
        ListenerId(id)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.lock().listeners.retain(|(listener_id, _)| *listener_id != id.0);
    }

    /// Check the current session once at startup.
    ///
    /// Readiness resolves as soon as the session lookup finishes; the returned
    /// directive tells the caller whether a profile lookup should follow.
    pub async fn initialize<B: AuthBackend + ?Sized>(&self, backend: &B, timer: &dyn Timer) -> ProfileFetch {
        let lookup = bounded(backend.current_session(), timer.sleep(self.config.session_timeout)).await;
        let session = match lookup {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                warn!("session lookup failed: {e}");
                None
            }
            Err(TimedOut) => {
                warn!("session lookup timed out after {:?}", self.config.session_timeout);
                None
            }
        };
        self.update(|state| state.apply_session(session.as_ref()))
    }

    /// Apply one auth-state change. Idempotent for repeated identical sessions.
    pub fn on_auth_state_change(&self, event: AuthEvent, session: Option<&Session>) -> ProfileFetch {
        log!("auth event: {event:?}");
        self.update(|state| state.apply_session(session))
    }

    /// Look up and store the profile for `identity_id`.
    pub async fn fetch_profile<B: AuthBackend + ?Sized>(&self, backend: &B, timer: &dyn Timer, identity_id: &str) {
        let lookup = bounded(backend.profile_by_identity(identity_id), timer.sleep(self.config.profile_timeout)).await;
        let profile = match lookup {
            Ok(Ok(Some(profile))) => Some(profile),
            Ok(Ok(None)) => {
                warn!("no profile row for user {identity_id}");
                None
            }
            Ok(Err(e)) => {
                warn!("profile lookup failed for user {identity_id}: {e}");
                None
            }
            Err(TimedOut) => {
                warn!("profile lookup for user {identity_id} timed out after {:?}", self.config.profile_timeout);
                None
            }
        };
        if !self.update(|state| state.apply_profile(identity_id, profile)) {
            log!("discarding profile for superseded user {identity_id}");
        }
    }

    /// Replace the local profile mirror after an explicit profile edit.
    pub fn set_profile(&self, profile: Profile) -> bool {
        let identity_id = profile.id.clone();
        self.update(|state| state.apply_profile(&identity_id, Some(profile)))
    }

    /// Apply auth changes in delivery order until the stream ends.
    pub async fn run<B: AuthBackend + ?Sized>(
        &self,
        backend: &B,
        timer: &dyn Timer,
        mut changes: AuthChanges,
        initial: ProfileFetch,
    ) {
        let mut in_flight = match initial {
            ProfileFetch::Start(identity_id) => Some(self.profile_lookup(backend, timer, identity_id)),
            ProfileFetch::Keep | ProfileFetch::Cancel => None,
        };

        loop {
            let change = match in_flight.take() {
                None => changes.next().await,
                Some(fetch) => match select(changes.next(), fetch).await {
                    Either::Left((change, fetch)) => {
                        in_flight = Some(fetch);
                        change
                    }
                    Either::Right(((), _)) => continue,
                },
            };

            let Some(change) = change else {
                if let Some(fetch) = in_flight {
                    fetch.await;
                }
                break;
            };

            match self.on_auth_state_change(change.event, change.session.as_ref()) {
                ProfileFetch::Start(identity_id) => in_flight = Some(self.profile_lookup(backend, timer, identity_id)),
                ProfileFetch::Keep => {}
                ProfileFetch::Cancel => in_flight = None,
            }
        }
    }

    fn profile_lookup<'a, B: AuthBackend + ?Sized>(
        &'a self,
        backend: &'a B,
        timer: &'a dyn Timer,
        identity_id: String,
    ) -> LocalBoxFuture<'a, ()> {
        Box::pin(async move { self.fetch_profile(backend, timer, &identity_id).await })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the snapshot and notify listeners if it changed.
    fn update<R>(&self, mutate: impl FnOnce(&mut SessionState) -> R) -> R {
        let (result, notify) = {
            let mut inner = self.lock();
            let before = inner.state.clone();
            let result = mutate(&mut inner.state);
            let notify = (inner.state != before).then(|| {
                let listeners = inner.listeners.iter().map(|(_, listener)| listener.clone()).collect::<Vec<_>>();
                (inner.state.clone(), listeners)
            });
            (result, notify)
        };

        if let Some((state, listeners)) = notify {
            for listener in listeners {
                listener(&state);
            }
        }
        result
    }
}

/// Handle for stopping a running session task.
#[derive(Debug)]
pub struct SessionHandle {
    abort: AbortHandle,
    unsubscribe: Unsubscribe,
}

impl SessionHandle {
    /// Detach from the auth change stream and stop applying updates.
    pub fn teardown(mut self) {
        self.unsubscribe.unsubscribe();
        self.abort.abort();
    }
}

/// Build the long-running session task: subscribe, initialize, then follow changes.
///
/// The subscription is taken before the initial lookup so changes that land
/// while it is in flight are buffered and applied afterwards.
pub fn session_task<B, T>(store: SessionStore, backend: B, timer: T) -> (impl Future<Output = ()>, SessionHandle)
where
    B: AuthBackend + 'static,
    T: Timer + 'static,
{
    let AuthSubscription { changes, unsubscribe } = backend.on_auth_state_change();
    let (abort, registration) = AbortHandle::new_pair();

    let task = async move {
        let initial = store.initialize(&backend, &timer).await;
        store.run(&backend, &timer, changes, initial).await;
    };

    (Abortable::new(task, registration).map(|_| ()), SessionHandle { abort, unsubscribe })
}
