//! Contract the session core expects from the backend service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` only ever talks to the backend through [`AuthBackend`] and
//! waits through [`Timer`], so the whole access gate runs on the host in unit
//! tests with scripted fakes. [`crate::net::api::SupabaseClient`] is the
//! browser implementation.

use std::future::Future;
use std::time::Duration;

use futures::future::{Either, LocalBoxFuture, select};
use futures::stream::LocalBoxStream;

use super::error::BackendError;
use super::types::{AuthChange, Profile, Session};

/// Stream of auth-state changes, delivered one at a time in order.
pub type AuthChanges = LocalBoxStream<'static, AuthChange>;

/// Live subscription to auth-state changes.
pub struct AuthSubscription {
    pub changes: AuthChanges,
    pub unsubscribe: Unsubscribe,
}

impl AuthSubscription {
    pub fn new(changes: AuthChanges, unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { changes, unsubscribe: Unsubscribe(Some(Box::new(unsubscribe))) }
    }
}

/// Handle that detaches a subscription from the backend's broadcast list.
pub struct Unsubscribe(Option<Box<dyn FnOnce() + Send + Sync>>);

impl Unsubscribe {
    /// Detach the subscription. Calling twice is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.0.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Unsubscribe").field(&self.0.is_some()).finish()
    }
}

/// Auth + profile lookups the access gate depends on.
#[async_trait::async_trait(?Send)]
pub trait AuthBackend {
    /// One-shot lookup of the current session, `Ok(None)` when signed out.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribe to login/logout/refresh notifications for the app lifetime.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Single-row profile lookup; a missing row is `Ok(None)`, not an error.
    async fn profile_by_identity(&self, identity_id: &str) -> Result<Option<Profile>, BackendError>;
}

/// Source of deadlines for bounded waits.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Browser timer backed by `setTimeout`. Host builds never fire, so waits
/// outside the browser are unbounded.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        #[cfg(feature = "csr")]
        {
            Box::pin(gloo_timers::future::sleep(duration))
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = duration;
            Box::pin(futures::future::pending())
        }
    }
}

/// The deadline elapsed before the work finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedOut;

/// Race `work` against `deadline`; the work wins ties.
pub async fn bounded<F: Future>(work: F, deadline: LocalBoxFuture<'static, ()>) -> Result<F::Output, TimedOut> {
    let work = std::pin::pin!(work);
    match select(work, deadline).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(TimedOut),
    }
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;
