use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use futures::executor::block_on;

use super::*;
use crate::net::error::BackendError;
use crate::net::types::{AuthChange, Role};

// =============================================================
// Fakes
// =============================================================

#[derive(Clone)]
enum Reply<T> {
    Ready(Result<T, BackendError>),
    Hang,
}

struct FakeBackend {
    session: Reply<Option<Session>>,
    profiles: HashMap<String, Reply<Option<Profile>>>,
    profile_calls: RefCell<Vec<String>>,
    changes: RefCell<Option<mpsc::UnboundedReceiver<AuthChange>>>,
    unsubscribed: Arc<AtomicUsize>,
}

impl FakeBackend {
    fn new(session: Reply<Option<Session>>) -> Self {
        Self {
            session,
            profiles: HashMap::new(),
            profile_calls: RefCell::new(Vec::new()),
            changes: RefCell::new(None),
            unsubscribed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_profile(mut self, id: &str, reply: Reply<Option<Profile>>) -> Self {
        self.profiles.insert(id.to_owned(), reply);
        self
    }

    fn with_changes(self, rx: mpsc::UnboundedReceiver<AuthChange>) -> Self {
        *self.changes.borrow_mut() = Some(rx);
        self
    }
}

#[async_trait::async_trait(?Send)]
impl AuthBackend for FakeBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        match self.session.clone() {
            Reply::Ready(result) => result,
            Reply::Hang => futures::future::pending().await,
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let changes = self.changes.borrow_mut().take();
        let unsubscribed = self.unsubscribed.clone();
        let stream: AuthChanges = match changes {
            Some(rx) => Box::pin(rx),
            None => Box::pin(futures::stream::empty()),
        };
        AuthSubscription::new(stream, move || {
            unsubscribed.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn profile_by_identity(&self, identity_id: &str) -> Result<Option<Profile>, BackendError> {
        self.profile_calls.borrow_mut().push(identity_id.to_owned());
        match self.profiles.get(identity_id).cloned().unwrap_or(Reply::Ready(Ok(None))) {
            Reply::Ready(result) => result,
            Reply::Hang => futures::future::pending().await,
        }
    }
}

struct NeverTimer;

impl Timer for NeverTimer {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(futures::future::pending())
    }
}

struct ImmediateTimer;

impl Timer for ImmediateTimer {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

fn identity(id: &str) -> Identity {
    let mut user_metadata = serde_json::Map::new();
    user_metadata.insert("username".to_owned(), serde_json::json!(format!("name-{id}")));
    Identity { id: id.to_owned(), email: Some(format!("{id}@example.com")), user_metadata }
}

fn session(id: &str) -> Session {
    Session {
        access_token: format!("token-{id}"),
        refresh_token: Some("refresh".to_owned()),
        expires_at: Some(1_900_000_000),
        expires_in: Some(3600),
        user: identity(id),
    }
}

fn profile(id: &str, role: Role) -> Profile {
    Profile {
        id: id.to_owned(),
        display_name: Some(format!("name-{id}")),
        email: None,
        role,
        avatar_url: None,
        phone: None,
        created_at: Some("2025-01-01T00:00:00Z".to_owned()),
    }
}

fn change(event: AuthEvent, session: Option<Session>) -> AuthChange {
    AuthChange { event, session }
}

// =============================================================
// SessionState transitions
// =============================================================

#[test]
fn default_state_is_loading_without_identity() {
    let state = SessionState::loading();
    assert_eq!(state.readiness(), Readiness::Loading);
    assert!(state.identity().is_none());
    assert_eq!(state.profile(), &ProfileState::Missing);
}

#[test]
fn apply_session_with_new_identity_marks_profile_pending() {
    let mut state = SessionState::loading();
    let fetch = state.apply_session(Some(&session("u-1")));
    assert_eq!(fetch, ProfileFetch::Start("u-1".to_owned()));
    assert!(state.is_ready());
    assert_eq!(state.identity().map(|i| i.id.as_str()), Some("u-1"));
    assert!(state.profile().is_pending());
}

#[test]
fn apply_session_without_session_clears_identity_and_profile() {
    let mut state = SessionState::signed_in(identity("u-1"), ProfileState::Loaded(profile("u-1", Role::User)));
    let fetch = state.apply_session(None);
    assert_eq!(fetch, ProfileFetch::Cancel);
    assert_eq!(state, SessionState::signed_out());
}

#[test]
fn apply_session_same_identity_keeps_loaded_profile() {
    let mut state = SessionState::signed_in(identity("u-1"), ProfileState::Loaded(profile("u-1", Role::Admin)));
    let before = state.clone();
    assert_eq!(state.apply_session(Some(&session("u-1"))), ProfileFetch::Keep);
    assert_eq!(state, before);
}

#[test]
fn apply_session_same_identity_retries_missing_profile_without_changing_state() {
    let mut state = SessionState::signed_in(identity("u-1"), ProfileState::Missing);
    let before = state.clone();
    assert_eq!(state.apply_session(Some(&session("u-1"))), ProfileFetch::Start("u-1".to_owned()));
    assert_eq!(state, before);
}

#[test]
fn apply_session_same_id_updates_identity_fields() {
    let mut state = SessionState::signed_in(identity("u-1"), ProfileState::Loaded(profile("u-1", Role::User)));
    let mut refreshed = session("u-1");
    refreshed.user.email = Some("new@example.com".to_owned());
    assert_eq!(state.apply_session(Some(&refreshed)), ProfileFetch::Keep);
    assert_eq!(state.identity().and_then(|i| i.email.as_deref()), Some("new@example.com"));
    assert_eq!(state.role(), Some(Role::User));
}

#[test]
fn apply_profile_ignores_superseded_identity() {
    let mut state = SessionState::signed_in(identity("u-2"), ProfileState::Pending);
    assert!(!state.apply_profile("u-1", Some(profile("u-1", Role::Admin))));
    assert!(state.profile().is_pending());
}

#[test]
fn apply_profile_without_identity_is_ignored() {
    let mut state = SessionState::signed_out();
    assert!(!state.apply_profile("u-1", Some(profile("u-1", Role::Admin))));
    assert_eq!(state.profile(), &ProfileState::Missing);
}

// =============================================================
// Initialize
// =============================================================

#[test]
fn initialize_with_active_session_resolves_before_profile() {
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1"))))).with_profile("u-1", Reply::Hang);
    let store = SessionStore::new(SessionConfig::default());

    let fetch = block_on(store.initialize(&backend, &NeverTimer));

    assert_eq!(fetch, ProfileFetch::Start("u-1".to_owned()));
    let state = store.snapshot();
    assert!(state.is_ready());
    assert!(state.profile().is_pending());
    assert!(backend.profile_calls.borrow().is_empty());
}

#[test]
fn initialize_without_session_resolves_signed_out() {
    let backend = FakeBackend::new(Reply::Ready(Ok(None)));
    let store = SessionStore::new(SessionConfig::default());
    assert_eq!(block_on(store.initialize(&backend, &NeverTimer)), ProfileFetch::Cancel);
    assert_eq!(store.snapshot(), SessionState::signed_out());
}

#[test]
fn initialize_network_error_degrades_to_signed_out() {
    let backend = FakeBackend::new(Reply::Ready(Err(BackendError::Network("offline".to_owned()))));
    let store = SessionStore::new(SessionConfig::default());
    block_on(store.initialize(&backend, &NeverTimer));
    let state = store.snapshot();
    assert_eq!(state.readiness(), Readiness::Resolved);
    assert!(state.identity().is_none());
}

#[test]
fn initialize_times_out_hung_session_lookup() {
    let backend = FakeBackend::new(Reply::Hang);
    let store = SessionStore::new(SessionConfig::default());
    assert_eq!(block_on(store.initialize(&backend, &ImmediateTimer)), ProfileFetch::Cancel);
    assert_eq!(store.snapshot(), SessionState::signed_out());
}

// =============================================================
// FetchProfile
// =============================================================

#[test]
fn fetch_profile_stores_found_row() {
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1")))))
        .with_profile("u-1", Reply::Ready(Ok(Some(profile("u-1", Role::Admin)))));
    let store = SessionStore::new(SessionConfig::default());
    block_on(async {
        store.initialize(&backend, &NeverTimer).await;
        store.fetch_profile(&backend, &NeverTimer, "u-1").await;
    });
    assert_eq!(store.snapshot().role(), Some(Role::Admin));
}

#[test]
fn fetch_profile_zero_rows_resolves_to_explicit_null() {
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1"))))).with_profile("u-1", Reply::Ready(Ok(None)));
    let store = SessionStore::new(SessionConfig::default());
    block_on(async {
        store.initialize(&backend, &NeverTimer).await;
        store.fetch_profile(&backend, &NeverTimer, "u-1").await;
    });
    let state = store.snapshot();
    assert_eq!(state.profile(), &ProfileState::Missing);
    assert!(state.identity().is_some());
}

#[test]
fn fetch_profile_error_resolves_to_explicit_null() {
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1")))))
        .with_profile("u-1", Reply::Ready(Err(BackendError::from_status(500, "boom"))));
    let store = SessionStore::new(SessionConfig::default());
    block_on(async {
        store.initialize(&backend, &NeverTimer).await;
        store.fetch_profile(&backend, &NeverTimer, "u-1").await;
    });
    assert_eq!(store.snapshot().profile(), &ProfileState::Missing);
}

#[test]
fn fetch_profile_timeout_resolves_to_explicit_null() {
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1"))))).with_profile("u-1", Reply::Hang);
    let store = SessionStore::new(SessionConfig::default());
    block_on(async {
        store.initialize(&backend, &NeverTimer).await;
        store.fetch_profile(&backend, &ImmediateTimer, "u-1").await;
    });
    assert_eq!(store.snapshot().profile(), &ProfileState::Missing);
}

// =============================================================
// OnAuthStateChange
// =============================================================

#[test]
fn identity_tracks_most_recent_session_for_any_sequence() {
    let sequences: Vec<Vec<Option<&str>>> = vec![
        vec![Some("u-1")],
        vec![None],
        vec![Some("u-1"), None],
        vec![None, Some("u-2")],
        vec![Some("u-1"), Some("u-2"), Some("u-1")],
        vec![Some("u-1"), Some("u-1"), None, None, Some("u-3")],
    ];

    for sequence in sequences {
        let store = SessionStore::new(SessionConfig::default());
        for entry in &sequence {
            let event = if entry.is_some() { AuthEvent::SignedIn } else { AuthEvent::SignedOut };
            store.on_auth_state_change(event, entry.map(session).as_ref());
        }
        let last = sequence.last().copied().flatten();
        let state = store.snapshot();
        assert_eq!(state.identity().map(|i| i.id.as_str()), last, "sequence {sequence:?}");
        if last.is_none() {
            assert_eq!(state.profile(), &ProfileState::Missing);
        }
    }
}

#[test]
fn repeated_identical_change_leaves_snapshot_byte_for_byte_unchanged() {
    let store = SessionStore::new(SessionConfig::default());
    let active = session("u-1");
    store.on_auth_state_change(AuthEvent::SignedIn, Some(&active));
    assert!(store.set_profile(profile("u-1", Role::User)));

    let identity_before = serde_json::to_vec(&store.snapshot().identity().cloned()).unwrap();
    let profile_before = serde_json::to_vec(&store.snapshot().profile().loaded().cloned()).unwrap();

    let fetch = store.on_auth_state_change(AuthEvent::SignedIn, Some(&active));

    assert_eq!(fetch, ProfileFetch::Keep);
    assert_eq!(serde_json::to_vec(&store.snapshot().identity().cloned()).unwrap(), identity_before);
    assert_eq!(serde_json::to_vec(&store.snapshot().profile().loaded().cloned()).unwrap(), profile_before);
}

#[test]
fn listeners_fire_only_on_change() {
    let store = SessionStore::new(SessionConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |state| sink.lock().unwrap().push(state.clone()));

    let active = session("u-1");
    store.on_auth_state_change(AuthEvent::SignedIn, Some(&active));
    store.on_auth_state_change(AuthEvent::TokenRefreshed, Some(&active));
    store.on_auth_state_change(AuthEvent::SignedOut, None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].profile().is_pending());
    assert_eq!(seen[1], SessionState::signed_out());
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let store = SessionStore::new(SessionConfig::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let id = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    store.unsubscribe(id);
    store.on_auth_state_change(AuthEvent::SignedIn, Some(&session("u-1")));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn set_profile_for_other_identity_is_rejected() {
    let store = SessionStore::new(SessionConfig::default());
    store.on_auth_state_change(AuthEvent::SignedIn, Some(&session("u-1")));
    assert!(!store.set_profile(profile("u-2", Role::Admin)));
    assert!(store.snapshot().profile().is_pending());
}

// =============================================================
// Run loop / session task
// =============================================================

#[test]
fn run_applies_changes_and_loads_profiles_in_order() {
    let (tx, rx) = mpsc::unbounded();
    let backend = FakeBackend::new(Reply::Ready(Ok(None)))
        .with_profile("u-1", Reply::Ready(Ok(Some(profile("u-1", Role::Admin)))))
        .with_changes(rx);
    let store = SessionStore::new(SessionConfig::default());

    tx.unbounded_send(change(AuthEvent::SignedIn, Some(session("u-1")))).unwrap();
    drop(tx);

    let (task, _handle) = session_task(store.clone(), backend, NeverTimer);
    block_on(task);

    let state = store.snapshot();
    assert!(state.is_ready());
    assert_eq!(state.role(), Some(Role::Admin));
}

#[test]
fn newer_identity_supersedes_in_flight_profile_lookup() {
    let (tx, rx) = mpsc::unbounded();
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1")))))
        .with_profile("u-1", Reply::Hang)
        .with_profile("u-2", Reply::Ready(Ok(Some(profile("u-2", Role::User)))))
        .with_changes(rx);
    let store = SessionStore::new(SessionConfig::default());

    tx.unbounded_send(change(AuthEvent::SignedIn, Some(session("u-2")))).unwrap();
    drop(tx);

    let (task, _handle) = session_task(store.clone(), backend, NeverTimer);
    block_on(task);

    let state = store.snapshot();
    assert_eq!(state.identity().map(|i| i.id.as_str()), Some("u-2"));
    assert_eq!(state.role(), Some(Role::User));
}

#[test]
fn sign_out_cancels_in_flight_profile_lookup() {
    let (tx, rx) = mpsc::unbounded();
    let backend = FakeBackend::new(Reply::Ready(Ok(Some(session("u-1"))))).with_profile("u-1", Reply::Hang).with_changes(rx);
    let store = SessionStore::new(SessionConfig::default());

    tx.unbounded_send(change(AuthEvent::SignedOut, None)).unwrap();
    drop(tx);

    let (task, _handle) = session_task(store.clone(), backend, NeverTimer);
    block_on(task);

    assert_eq!(store.snapshot(), SessionState::signed_out());
}

#[test]
fn teardown_unsubscribes_and_stops_the_task() {
    let (_tx, rx) = mpsc::unbounded();
    let backend = FakeBackend::new(Reply::Ready(Ok(None))).with_changes(rx);
    let unsubscribed = backend.unsubscribed.clone();
    let store = SessionStore::new(SessionConfig::default());

    let (task, handle) = session_task(store, backend, NeverTimer);
    handle.teardown();
    // Aborted before the first poll, so this completes instead of waiting on the open stream.
    block_on(task);

    assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
}
