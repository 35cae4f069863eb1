//! HTTP client for the hosted auth, REST, and storage endpoints.
//!
//! Client-side (csr): real HTTP calls via `gloo-net`.
//! Host builds: every request fails with [`BackendError::Unavailable`]; the
//! URL building, query encoding, and response decoding below stay pure so
//! they are unit-tested without a browser.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`SupabaseClient`] is the one backend handle the app root creates. It
//! implements [`AuthBackend`] for the session store and exposes table and
//! storage access for the pages. The signed-in session is persisted in
//! `localStorage` and every auth transition is broadcast to subscribers.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx replies become [`BackendError::Status`] carrying the service's own
//! message. Undecodable bodies become [`BackendError::Decode`].

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::mpsc::{self, UnboundedSender};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::{AuthBackend, AuthSubscription};
use super::error::BackendError;
use super::types::{AuthChange, AuthEvent, Identity, Profile, Session};
use crate::config::AppConfig;
use crate::util::storage;

/// `localStorage` key holding the persisted session.
pub const SESSION_STORAGE_KEY: &str = "ciptain.auth.session";

/// Refresh the access token this many seconds before it expires.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// PostgREST query parameters, kept as raw pairs until the transport encodes them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns)
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    #[must_use]
    pub fn order(self, column: &str, order: SortOrder) -> Self {
        let direction = match order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        self.param("order", format!("{column}.{direction}"))
    }

    #[must_use]
    pub fn limit(self, rows: usize) -> Self {
        self.param("limit", rows.to_string())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_owned(), value.into()));
        self
    }
}

enum Body {
    Empty,
    Json(String),
    #[cfg(feature = "csr")]
    File(web_sys::File),
}

struct Call {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(&'static str, String)>,
    body: Body,
}

impl Call {
    fn new(method: Method, url: String) -> Self {
        Self { method, url, query: Vec::new(), headers: Vec::new(), body: Body::Empty }
    }

    fn query(mut self, query: &Query) -> Self {
        self.query.extend(query.params().iter().cloned());
        self
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, BackendError> {
        let raw = serde_json::to_string(body).map_err(|e| BackendError::Decode(e.to_string()))?;
        self.body = Body::Json(raw);
        Ok(self)
    }
}

/// Raw transport reply before status checking.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Reply {
    status: u16,
    body: String,
    content_range: Option<String>,
}

impl Reply {
    fn ok(self) -> Result<Self, BackendError> {
        if (200..300).contains(&self.status) {
            Ok(self)
        } else {
            Err(BackendError::from_status(self.status, &self.body))
        }
    }
}

type Listeners = Arc<Mutex<Vec<(u64, UnboundedSender<AuthChange>)>>>;

/// Handle to the hosted backend. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    session: Arc<Mutex<Option<Session>>>,
    listeners: Listeners,
    next_listener: Arc<AtomicU64>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Build a client and resume any session persisted by a previous page load.
    pub fn new(config: &AppConfig) -> Self {
        let restored = storage::load_json::<Session>(SESSION_STORAGE_KEY);
        Self {
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            session: Arc::new(Mutex::new(restored)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Access token of the stored session, if any, without refreshing it.
    pub fn access_token(&self) -> Option<String> {
        self.stored_session().map(|session| session.access_token)
    }

    // ---------------------------------------------------------------------
    // Auth
    // ---------------------------------------------------------------------

    /// Exchange email + password for a session.
    ///
    /// # Errors
    ///
    /// Returns the auth service's rejection (e.g. invalid credentials) or a transport error.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let call = Call::new(Method::Post, self.auth_url("token"))
            .query(&Query::new().param("grant_type", "password"))
            .json(&payload)?;
        let reply = self.send_as_anon(call).await?;
        let session =
            decode_session_reply(&reply.body, now_secs())?.ok_or_else(|| BackendError::Decode("missing session".to_owned()))?;
        self.store_session(Some(session.clone()), AuthEvent::SignedIn);
        Ok(session)
    }

    /// Register a new account. `metadata` lands in the identity's sign-up metadata.
    ///
    /// Returns `None` when the service requires email confirmation before the
    /// first sign-in.
    ///
    /// # Errors
    ///
    /// Returns the auth service's rejection (e.g. weak password) or a transport error.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Map<String, serde_json::Value>,
        redirect_to: Option<&str>,
    ) -> Result<Option<Session>, BackendError> {
        let payload = serde_json::json!({ "email": email, "password": password, "data": metadata });
        let mut query = Query::new();
        if let Some(redirect_to) = redirect_to {
            query = query.param("redirect_to", redirect_to);
        }
        let call = Call::new(Method::Post, self.auth_url("signup")).query(&query).json(&payload)?;
        let reply = self.send_as_anon(call).await?;
        let session = decode_session_reply(&reply.body, now_secs())?;
        if let Some(session) = &session {
            self.store_session(Some(session.clone()), AuthEvent::SignedIn);
        }
        Ok(session)
    }

    /// End the session. The local session is cleared even when the service
    /// cannot be reached.
    pub async fn sign_out(&self) {
        if let Some(token) = self.access_token() {
            let call = Call::new(Method::Post, self.auth_url("logout")).header("Authorization", format!("Bearer {token}"));
            if let Err(e) = self.send_with_key(call).await {
                leptos::logging::warn!("sign out request failed: {e}");
            }
        }
        self.store_session(None, AuthEvent::SignedOut);
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotSignedIn`] without a session, otherwise the
    /// service's rejection or a transport error.
    pub async fn update_password(&self, password: &str) -> Result<(), BackendError> {
        let token = self.current_access_token().await?.ok_or(BackendError::NotSignedIn)?;
        let call = Call::new(Method::Put, self.auth_url("user"))
            .header("Authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({ "password": password }))?;
        let reply = self.send_with_key(call).await?;
        let user: Identity = decode_json(&reply.body)?;
        if let Some(mut session) = self.stored_session() {
            session.user = user;
            self.store_session(Some(session), AuthEvent::UserUpdated);
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        let call = Call::new(Method::Post, self.auth_url("token"))
            .query(&Query::new().param("grant_type", "refresh_token"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))?;
        let reply = self.send_as_anon(call).await?;
        decode_session_reply(&reply.body, now_secs())?.ok_or_else(|| BackendError::Decode("missing session".to_owned()))
    }

    async fn current_access_token(&self) -> Result<Option<String>, BackendError> {
        Ok(self.current_session().await?.map(|session| session.access_token))
    }

    // ---------------------------------------------------------------------
    // Tables
    // ---------------------------------------------------------------------

    /// Fetch all rows of `table` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a status error for rejected queries or a decode error for unexpected rows.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>, BackendError> {
        let call = Call::new(Method::Get, self.rest_url(table)).query(query);
        let reply = self.send(call).await?;
        decode_json(&reply.body)
    }

    /// Fetch at most one row; more than one is an error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select`], plus [`BackendError::MultipleRows`].
    pub async fn select_single<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Option<T>, BackendError> {
        let call = Call::new(Method::Get, self.rest_url(table)).query(query);
        let reply = self.send(call).await?;
        decode_single(&reply.body)
    }

    /// Insert rows and return them as stored.
    ///
    /// # Errors
    ///
    /// Returns a status error when the insert is rejected.
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let call = Call::new(Method::Post, self.rest_url(table)).header("Prefer", "return=representation").json(rows)?;
        let reply = self.send(call).await?;
        decode_json(&reply.body)
    }

    /// Patch every row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a status error when the update is rejected.
    pub async fn update<B: Serialize + ?Sized>(&self, table: &str, query: &Query, patch: &B) -> Result<(), BackendError> {
        let call = Call::new(Method::Patch, self.rest_url(table))
            .query(query)
            .header("Prefer", "return=minimal")
            .json(patch)?;
        self.send(call).await.map(|_| ())
    }

    /// Delete every row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a status error when the delete is rejected.
    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), BackendError> {
        let call = Call::new(Method::Delete, self.rest_url(table)).query(query).header("Prefer", "return=minimal");
        self.send(call).await.map(|_| ())
    }

    /// Exact row count for `query`, read from the `Content-Range` header.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the service omits the total.
    pub async fn count(&self, table: &str, query: &Query) -> Result<u64, BackendError> {
        let call = Call::new(Method::Get, self.rest_url(table))
            .query(query)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0");
        let reply = self.send(call).await?;
        reply
            .content_range
            .as_deref()
            .and_then(content_range_total)
            .ok_or_else(|| BackendError::Decode("missing row count".to_owned()))
    }

    // ---------------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------------

    /// Upload a browser file to `bucket/path`. With `upsert` an existing
    /// object at the same path is overwritten instead of rejected.
    ///
    /// # Errors
    ///
    /// Returns a status error when the upload is rejected.
    #[cfg(feature = "csr")]
    pub async fn upload(&self, bucket: &str, path: &str, file: web_sys::File, upsert: bool) -> Result<(), BackendError> {
        let mut call = self.upload_call(bucket, path, &file.type_(), upsert);
        call.body = Body::File(file);
        self.send(call).await.map(|_| ())
    }

    #[cfg_attr(not(feature = "csr"), allow(dead_code))]
    fn upload_call(&self, bucket: &str, path: &str, content_type: &str, upsert: bool) -> Call {
        let mut call =
            Call::new(Method::Post, self.object_url(bucket, path)).header("x-upsert", if upsert { "true" } else { "false" });
        if !content_type.is_empty() {
            call = call.header("Content-Type", content_type);
        }
        call
    }

    /// Delete objects from `bucket`.
    ///
    /// # Errors
    ///
    /// Returns a status error when the removal is rejected.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        if paths.is_empty() {
            return Ok(());
        }
        let call = Call::new(Method::Delete, format!("{}/storage/v1/object/{bucket}", self.base_url))
            .json(&serde_json::json!({ "prefixes": paths }))?;
        self.send(call).await.map(|_| ())
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(&self.base_url, bucket, path)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send with the user's token when signed in, the anon key otherwise.
    async fn send(&self, call: Call) -> Result<Reply, BackendError> {
        let token = match self.current_access_token().await {
            Ok(token) => token,
            Err(e) => {
                leptos::logging::warn!("session refresh failed, sending anonymously: {e}");
                None
            }
        };
        let token = token.unwrap_or_else(|| self.anon_key.clone());
        self.send_with_key(call.header("Authorization", format!("Bearer {token}"))).await
    }

    async fn send_as_anon(&self, call: Call) -> Result<Reply, BackendError> {
        let token = self.anon_key.clone();
        self.send_with_key(call.header("Authorization", format!("Bearer {token}"))).await
    }

    async fn send_with_key(&self, call: Call) -> Result<Reply, BackendError> {
        log::debug!("{:?} {}", call.method, call.url);
        transport(call.header("apikey", self.anon_key.clone())).await?.ok()
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stored_session(&self) -> Option<Session> {
        self.lock_session().clone()
    }

    /// Replace the stored session, persist it, and tell every subscriber.
    fn store_session(&self, session: Option<Session>, event: AuthEvent) {
        *self.lock_session() = session.clone();
        match &session {
            Some(session) => storage::save_json(SESSION_STORAGE_KEY, session),
            None => storage::remove(SESSION_STORAGE_KEY),
        }
        broadcast(&self.listeners, &AuthChange { event, session });
    }
}

#[async_trait::async_trait(?Send)]
impl AuthBackend for SupabaseClient {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(session) = self.stored_session() else {
            return Ok(None);
        };
        if !needs_refresh(&session, now_secs()) {
            return Ok(Some(session));
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            self.store_session(None, AuthEvent::SignedOut);
            return Ok(None);
        };
        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                self.store_session(Some(fresh.clone()), AuthEvent::TokenRefreshed);
                Ok(Some(fresh))
            }
            Err(e) if e.is_unauthorized() || matches!(e, BackendError::Status { status: 400, .. }) => {
                leptos::logging::warn!("stored session rejected: {e}");
                self.store_session(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded();
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).push((id, tx));

        let listeners = self.listeners.clone();
        AuthSubscription::new(Box::pin(rx), move || {
            listeners.lock().unwrap_or_else(PoisonError::into_inner).retain(|(listener, _)| *listener != id);
        })
    }

    async fn profile_by_identity(&self, identity_id: &str) -> Result<Option<Profile>, BackendError> {
        self.select_single("profiles", &profile_query(identity_id)).await
    }
}

/// Deliver `change` to every live subscriber, dropping closed ones.
fn broadcast(listeners: &Listeners, change: &AuthChange) {
    let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
    listeners.retain(|(_, tx)| tx.unbounded_send(change.clone()).is_ok());
}

fn profile_query(identity_id: &str) -> Query {
    Query::new().select("*").eq("id", identity_id)
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

fn decode_single<T: DeserializeOwned>(body: &str) -> Result<Option<T>, BackendError> {
    let mut rows: Vec<T> = decode_json(body)?;
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        n => Err(BackendError::MultipleRows(n)),
    }
}

/// Decode a token/sign-up reply. Sign-up without auto-confirm returns only
/// the user, which yields `None`.
fn decode_session_reply(body: &str, now: i64) -> Result<Option<Session>, BackendError> {
    let value: serde_json::Value = decode_json(body)?;
    if value.get("access_token").is_none() {
        return Ok(None);
    }
    let mut session: Session = serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
    if session.expires_at.is_none() {
        session.expires_at = session.expires_in.map(|secs| now + secs);
    }
    Ok(Some(session))
}

fn needs_refresh(session: &Session, now: i64) -> bool {
    session.expires_at.is_some_and(|expires_at| expires_at - now <= REFRESH_MARGIN_SECS)
}

/// Total from a `Content-Range` value such as `0-0/42` or `*/0`.
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}

pub(crate) fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{base_url}/storage/v1/object/public/{bucket}/{}", path.trim_start_matches('/'))
}

fn now_secs() -> i64 {
    #[cfg(feature = "csr")]
    {
        #[allow(clippy::cast_possible_truncation)]
        let secs = (js_sys::Date::now() / 1000.0) as i64;
        secs
    }
    #[cfg(not(feature = "csr"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
    }
}

#[cfg(feature = "csr")]
async fn transport(call: Call) -> Result<Reply, BackendError> {
    use gloo_net::http::Request;

    let network = |e: gloo_net::Error| BackendError::Network(e.to_string());

    let builder = match call.method {
        Method::Get => Request::get(&call.url),
        Method::Post => Request::post(&call.url),
        Method::Patch => Request::patch(&call.url),
        Method::Put => Request::put(&call.url),
        Method::Delete => Request::delete(&call.url),
    };
    let builder = if call.query.is_empty() {
        builder
    } else {
        builder.query(call.query.iter().map(|(key, value)| (key.as_str(), value.as_str())))
    };
    let builder = call.headers.iter().fold(builder, |builder, (name, value)| builder.header(name, value));
    let request = match call.body {
        Body::Empty => builder.build(),
        Body::Json(raw) => builder.header("Content-Type", "application/json").body(raw),
        Body::File(file) => builder.body(file),
    }
    .map_err(network)?;

    let response = request.send().await.map_err(network)?;
    let status = response.status();
    let content_range = response.headers().get("content-range");
    let body = response.text().await.map_err(network)?;
    Ok(Reply { status, body, content_range })
}

#[cfg(not(feature = "csr"))]
async fn transport(call: Call) -> Result<Reply, BackendError> {
    let Call { method, url, query, headers, body } = call;
    let body_len = match body {
        Body::Empty => 0,
        Body::Json(raw) => raw.len(),
    };
    log::trace!("{method:?} {url} not sent: {} params, {} headers, {body_len} byte body", query.len(), headers.len());
    Err(BackendError::Unavailable)
}
