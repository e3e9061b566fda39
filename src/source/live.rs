//! Real-time push store client.
//!
//! The store exposes each path as a server-sent-event stream (`put`, `patch`,
//! `keep-alive`, `cancel`, `auth_revoked`). A subscription keeps a local copy
//! of the JSON tree under its path and hands a snapshot to the caller after
//! every change.
//!
//! The client is constructed explicitly and owns its lifecycle: dropping or
//! cancelling a [`Subscription`] stops its task, and [`RealtimeClient::close`]
//! (or dropping the client) stops every subscription created from it.

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::SourceError;

// ---

/// Connection settings for the push store.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    // ---
    /// Base URL of the database, e.g. `https://<project>.firebasedatabase.app`.
    pub database_url: String,
    /// Optional auth token appended as `?auth=`.
    pub auth: Option<String>,
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    // ---
    pub event: String,
    pub data: String,
}

/// Incremental parser for the `text/event-stream` framing.
///
/// Chunks may split lines anywhere, including inside multi-byte characters,
/// so bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    // ---
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        // ---
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
            let line = text.strip_suffix('\r').unwrap_or(text.as_str());

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
        events
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        // ---
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(ServerEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: data.join("\n"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    path: String,
    data: Value,
}

/// Apply a push-store event to the local tree.
///
/// Returns `Ok(true)` when the tree changed, `Ok(false)` for events that
/// carry no data, and an error when the server ends the subscription.
pub fn apply_event(tree: &mut Value, event: &ServerEvent) -> Result<bool, SourceError> {
    // ---
    match event.event.as_str() {
        "put" => {
            let payload: EventPayload = serde_json::from_str(&event.data)?;
            set_at(tree, &payload.path, payload.data);
            Ok(true)
        }
        "patch" => {
            let payload: EventPayload = serde_json::from_str(&event.data)?;
            let Value::Object(children) = payload.data else {
                return Err(SourceError::Parse(format!(
                    "patch at {} is not an object",
                    payload.path
                )));
            };
            let base = payload.path.trim_end_matches('/');
            for (key, value) in children {
                set_at(tree, &format!("{base}/{key}"), value);
            }
            Ok(true)
        }
        "cancel" => Err(SourceError::Subscription(
            "cancelled by the server".to_string(),
        )),
        "auth_revoked" => Err(SourceError::Subscription(
            "credential revoked".to_string(),
        )),
        _ => Ok(false),
    }
}

/// Replace the value at a slash-separated path. `null` deletes.
fn set_at(tree: &mut Value, path: &str, value: Value) {
    // ---
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *tree = value;
        return;
    };

    let mut node = tree;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let parent = ensure_object(node);
    if value.is_null() {
        parent.remove(*last);
    } else {
        parent.insert(last.to_string(), value);
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    // ---
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// Handle to a running subscription. Dropping it cancels the stream.
#[derive(Debug)]
pub struct Subscription {
    // ---
    id: Uuid,
    path: String,
    task: JoinHandle<()>,
}

impl Subscription {
    // ---
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the subscription now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // ---
        if !self.task.is_finished() {
            tracing::debug!(id = %self.id, path = %self.path, "Cancelling subscription");
        }
        self.task.abort();
    }
}

/// Client for the real-time push store.
#[derive(Debug)]
pub struct RealtimeClient {
    // ---
    http: reqwest::Client,
    config: LiveConfig,
    closed: watch::Sender<bool>,
}

impl RealtimeClient {
    // ---
    /// Build a client. No connection is made until [`subscribe`](Self::subscribe).
    pub fn open(config: LiveConfig) -> Result<Self, SourceError> {
        // ---
        let http = reqwest::Client::builder().build()?;
        let (closed, _) = watch::channel(false);

        tracing::info!("Real-time client opened for {}", config.database_url);
        Ok(Self {
            http,
            config,
            closed,
        })
    }

    fn path_url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.config.database_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    /// Subscribe to `path`. `on_value` receives the full value under the path
    /// after every change, or a single error if the stream fails.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, path: &str, query: &[(&str, String)], on_value: F) -> Subscription
    where
        F: FnMut(Result<Value, SourceError>) + Send + 'static,
    {
        // ---
        let id = Uuid::new_v4();
        let mut request = self
            .http
            .get(self.path_url(path))
            .header(ACCEPT, "text/event-stream")
            .query(query);
        if let Some(auth) = &self.config.auth {
            request = request.query(&[("auth", auth)]);
        }

        let closed = self.closed.subscribe();
        let label = path.to_string();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = run_subscription(request, &label, on_value) => {}
                _ = wait_closed(closed) => {
                    tracing::debug!(path = %label, "Subscription stopped by client close");
                }
            }
        });

        tracing::info!(%id, path, "Subscribed to real-time path");
        Subscription {
            id,
            path: path.to_string(),
            task,
        }
    }

    /// Stop every subscription created from this client.
    pub fn close(&self) {
        // ---
        self.closed.send_replace(true);
        tracing::info!("Real-time client closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

/// Resolves once the client is closed or dropped.
async fn wait_closed(mut closed: watch::Receiver<bool>) {
    // ---
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}

async fn run_subscription<F>(request: reqwest::RequestBuilder, path: &str, mut on_value: F)
where
    F: FnMut(Result<Value, SourceError>),
{
    // ---
    if let Err(e) = stream_values(request, &mut on_value).await {
        tracing::error!(path, "Real-time subscription failed: {}", e);
        on_value(Err(e));
    }
}

async fn stream_values<F>(
    request: reqwest::RequestBuilder,
    on_value: &mut F,
) -> Result<(), SourceError>
where
    F: FnMut(Result<Value, SourceError>),
{
    // ---
    let response = request.send().await?.error_for_status()?;
    let mut stream = response.bytes_stream();
    let mut parser = EventStreamParser::new();
    let mut tree = Value::Null;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for event in parser.push(&chunk) {
            if apply_event(&mut tree, &event)? {
                on_value(Ok(tree.clone()));
            }
        }
    }

    Err(SourceError::Subscription("stream ended".to_string()))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn event(name: &str, data: Value) -> ServerEvent {
        ServerEvent {
            event: name.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_parser_handles_split_chunks() {
        // ---
        let mut parser = EventStreamParser::new();

        assert!(parser.push(b"event: put\nda").is_empty());
        let events = parser.push(b"ta: {\"path\":\"/\",\"data\":1}\n\n");

        assert_eq!(
            events,
            vec![ServerEvent {
                event: "put".to_string(),
                data: "{\"path\":\"/\",\"data\":1}".to_string(),
            }]
        );
    }

    #[test]
    fn test_parser_crlf_comments_and_multiline_data() {
        // ---
        let mut parser = EventStreamParser::new();
        let events =
            parser.push(b": hello\r\nevent: keep-alive\r\ndata: null\r\n\r\ndata: a\ndata: b\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "keep-alive");
        assert_eq!(events[1].event, "message");
        assert_eq!(events[1].data, "a\nb");
    }

    #[test]
    fn test_parser_split_inside_utf8() {
        // ---
        let bytes = "data: 28°C\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC2).unwrap() + 1;
        let mut parser = EventStreamParser::new();

        assert!(parser.push(&bytes[..split]).is_empty());
        let events = parser.push(&bytes[split..]);
        assert_eq!(events[0].data, "28°C");
    }

    #[test]
    fn test_put_at_root_replaces_tree() {
        // ---
        let mut tree = json!({"old": 1});
        let changed = apply_event(
            &mut tree,
            &event("put", json!({"path": "/", "data": {"temperature": 27.0}})),
        )
        .unwrap();

        assert!(changed);
        assert_eq!(tree, json!({"temperature": 27.0}));
    }

    #[test]
    fn test_put_at_child_path_and_delete() {
        // ---
        let mut tree = Value::Null;
        let first = event("put", json!({"path": "/-k1", "data": {"timestamp": 1}}));
        let second = event("put", json!({"path": "/-k2/humidity", "data": 70}));
        apply_event(&mut tree, &first).unwrap();
        apply_event(&mut tree, &second).unwrap();
        assert_eq!(tree, json!({"-k1": {"timestamp": 1}, "-k2": {"humidity": 70}}));

        apply_event(&mut tree, &event("put", json!({"path": "/-k1", "data": null}))).unwrap();
        assert_eq!(tree, json!({"-k2": {"humidity": 70}}));
    }

    #[test]
    fn test_patch_merges_children() {
        // ---
        let mut tree = json!({"humidity": 60, "temperature": 25});
        apply_event(
            &mut tree,
            &event("patch", json!({"path": "/", "data": {"humidity": 65, "rainfall": 2}})),
        )
        .unwrap();

        assert_eq!(tree, json!({"humidity": 65, "temperature": 25, "rainfall": 2}));
    }

    #[test]
    fn test_keep_alive_and_server_cancel() {
        // ---
        let mut tree = Value::Null;

        assert!(!apply_event(&mut tree, &event("keep-alive", Value::Null)).unwrap());
        assert!(matches!(
            apply_event(&mut tree, &event("cancel", Value::Null)),
            Err(SourceError::Subscription(_))
        ));
        assert!(matches!(
            apply_event(&mut tree, &event("auth_revoked", Value::Null)),
            Err(SourceError::Subscription(_))
        ));
    }

    #[test]
    fn test_malformed_put_is_parse_error() {
        // ---
        let mut tree = Value::Null;
        let bad = ServerEvent {
            event: "put".to_string(),
            data: "{not json".to_string(),
        };

        assert!(matches!(apply_event(&mut tree, &bad), Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_close_stops_subscriptions() {
        // ---
        let client = RealtimeClient::open(LiveConfig {
            // Nothing listens on port 9; the request fails or is stopped by close.
            database_url: "http://127.0.0.1:9".to_string(),
            auth: None,
        })
        .unwrap();
        let sub = client.subscribe("sensors/latest", &[], |_| {});

        client.close();
        assert!(client.is_closed());

        for _ in 0..100 {
            if sub.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(sub.is_finished());
    }
}
