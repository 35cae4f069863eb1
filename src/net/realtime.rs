//! Realtime row-change subscriptions over the backend's Phoenix websocket.
//!
//! SYSTEM CONTEXT
//! ==============
//! Admin pages keep their tables live by subscribing to `postgres_changes`
//! for one table. Message building and parsing are pure; the socket loop is
//! gated behind `#[cfg(feature = "csr")]` since it needs a browser.
//!
//! ERROR HANDLING
//! ==============
//! Undecodable messages are logged and skipped. A rejected join and socket
//! failures both reconnect with exponential backoff until the subscription is
//! closed; every connect asks the auth client for a fresh access token.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod realtime_test;

use futures::future::AbortHandle;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::backend::AuthBackend;
use super::error::BackendError;

/// Phoenix heartbeat interval expected by the realtime service.
pub const HEARTBEAT_INTERVAL_MS: u32 = 25_000;

/// Which row events a channel asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    All,
    Insert,
    Update,
    Delete,
}

impl ChangeEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeEvent::All => "*",
            ChangeEvent::Insert => "INSERT",
            ChangeEvent::Update => "UPDATE",
            ChangeEvent::Delete => "DELETE",
        }
    }
}

/// One `public.<table>` subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub table: &'static str,
    pub event: ChangeEvent,
}

/// A decoded row change. Deletes only carry the primary key.
#[derive(Clone, Debug, PartialEq)]
pub enum RowChange<T> {
    Insert(T),
    Update(T),
    Delete { id: String },
}

pub fn topic(table: &str) -> String {
    format!("realtime:public:{table}")
}

/// Websocket endpoint derived from the REST base URL.
pub fn socket_url(base_url: &str, anon_key: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_owned()
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={anon_key}&vsn=1.0.0")
}

pub fn join_message(spec: ChannelSpec, access_token: &str, reference: u64) -> serde_json::Value {
    serde_json::json!({
        "topic": topic(spec.table),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": spec.event.as_str(), "schema": "public", "table": spec.table }
                ]
            },
            "access_token": access_token
        },
        "ref": reference.to_string(),
        "join_ref": reference.to_string()
    })
}

pub fn heartbeat_message(reference: u64) -> serde_json::Value {
    serde_json::json!({ "topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": reference.to_string() })
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Option<serde_json::Value>,
    #[serde(default)]
    old_record: Option<serde_json::Value>,
}

/// Decode one socket message. Successful replies, presence, and system
/// messages are `Ok(None)`.
///
/// # Errors
///
/// Returns [`BackendError::ChannelRejected`] for a `phx_reply` whose status is
/// not `ok`, and [`BackendError::Decode`] for malformed JSON or change rows
/// that do not fit `T`.
pub fn parse_change<T: DeserializeOwned>(raw: &str) -> Result<Option<RowChange<T>>, BackendError> {
    let decode = |e: serde_json::Error| BackendError::Decode(e.to_string());

    let envelope: Envelope = serde_json::from_str(raw).map_err(decode)?;
    if envelope.event == "phx_reply" {
        return match envelope.payload.get("status").and_then(serde_json::Value::as_str) {
            None | Some("ok") => Ok(None),
            Some(status) => {
                let reason = envelope
                    .payload
                    .get("response")
                    .and_then(|response| response.get("reason"))
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(status);
                Err(BackendError::ChannelRejected(reason.to_owned()))
            }
        };
    }
    if envelope.event != "postgres_changes" {
        return Ok(None);
    }
    let Some(data) = envelope.payload.get("data").cloned() else {
        return Ok(None);
    };
    let data: ChangeData = serde_json::from_value(data).map_err(decode)?;

    let row = |value: Option<serde_json::Value>| -> Result<T, BackendError> {
        let value = value.ok_or_else(|| BackendError::Decode(format!("{} without record", data.kind)))?;
        serde_json::from_value(value).map_err(decode)
    };

    match data.kind.as_str() {
        "INSERT" => Ok(Some(RowChange::Insert(row(data.record.clone())?))),
        "UPDATE" => Ok(Some(RowChange::Update(row(data.record.clone())?))),
        "DELETE" => {
            let id = data.old_record.as_ref().and_then(|old| old.get("id")).and_then(|id| match id {
                serde_json::Value::String(id) => Some(id.clone()),
                serde_json::Value::Number(id) => Some(id.to_string()),
                _ => None,
            });
            id.map(|id| Some(RowChange::Delete { id }))
                .ok_or_else(|| BackendError::Decode("DELETE without old record id".to_owned()))
        }
        _ => Ok(None),
    }
}

/// Token sent with a channel join: the refreshed user token when signed in,
/// the anon key otherwise.
pub async fn join_token(auth: &impl AuthBackend, anon_key: &str) -> String {
    match auth.current_session().await {
        Ok(Some(session)) => session.access_token,
        Ok(None) => anon_key.to_owned(),
        Err(e) => {
            leptos::logging::warn!("realtime join without user token: {e}");
            anon_key.to_owned()
        }
    }
}

/// Keeps a channel open until [`RealtimeHandle::close`] is called.
#[derive(Debug)]
pub struct RealtimeHandle {
    abort: AbortHandle,
}

impl RealtimeHandle {
    pub fn close(self) {
        self.abort.abort();
    }
}

/// Open a channel and call `on_change` for every decoded row change.
///
/// Host builds return a handle to a channel that never delivers.
pub fn subscribe<T, F>(client: &super::api::SupabaseClient, spec: ChannelSpec, on_change: F) -> RealtimeHandle
where
    T: DeserializeOwned + 'static,
    F: Fn(RowChange<T>) + 'static,
{
    let (abort, registration) = AbortHandle::new_pair();

    #[cfg(feature = "csr")]
    {
        let task = realtime_loop(client.clone(), spec, on_change);
        leptos::task::spawn_local(async move {
            let _ = futures::future::Abortable::new(task, registration).await;
        });
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = (client, spec, on_change, registration);
    }

    RealtimeHandle { abort }
}

#[cfg(feature = "csr")]
async fn realtime_loop<T, F>(client: super::api::SupabaseClient, spec: ChannelSpec, on_change: F)
where
    T: DeserializeOwned,
    F: Fn(RowChange<T>),
{
    let mut backoff_ms: u32 = 1000;
    let max_backoff_ms: u32 = 10_000;

    loop {
        let url = socket_url(client.base_url(), client.anon_key());
        let token = join_token(&client, client.anon_key()).await;
        match connect_and_run(&url, spec, &token, &on_change).await {
            Ok(()) => {
                leptos::logging::log!("realtime channel {} closed", spec.table);
                backoff_ms = 1000;
            }
            Err(e) => leptos::logging::warn!("realtime channel {} error: {e}", spec.table),
        }
        gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(backoff_ms))).await;
        backoff_ms = (backoff_ms * 2).min(max_backoff_ms);
    }
}

#[cfg(feature = "csr")]
async fn connect_and_run<T, F>(url: &str, spec: ChannelSpec, token: &str, on_change: &F) -> Result<(), String>
where
    T: DeserializeOwned,
    F: Fn(RowChange<T>),
{
    use futures::{SinkExt, StreamExt};
    use gloo_net::websocket::Message;
    use gloo_net::websocket::futures::WebSocket;

    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    let (mut ws_write, mut ws_read) = ws.split();

    let mut reference: u64 = 1;
    ws_write
        .send(Message::Text(join_message(spec, token, reference).to_string()))
        .await
        .map_err(|e| e.to_string())?;

    let heartbeat_task = async {
        loop {
            gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(HEARTBEAT_INTERVAL_MS))).await;
            reference += 1;
            if ws_write.send(Message::Text(heartbeat_message(reference).to_string())).await.is_err() {
                break;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Text(raw)) => match parse_change::<T>(&raw) {
                    Ok(Some(change)) => on_change(change),
                    Ok(None) => {}
                    Err(e @ BackendError::ChannelRejected(_)) => return Err(e.to_string()),
                    Err(e) => leptos::logging::warn!("realtime message skipped: {e}"),
                },
                Ok(Message::Bytes(_)) => {}
                Err(e) => {
                    leptos::logging::warn!("realtime recv error: {e}");
                    break;
                }
            }
        }
        Ok(())
    };

    match futures::future::select(Box::pin(heartbeat_task), Box::pin(recv_task)).await {
        futures::future::Either::Left(((), _)) => Ok(()),
        futures::future::Either::Right((result, _)) => result,
    }
}
