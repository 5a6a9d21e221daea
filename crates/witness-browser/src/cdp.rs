//! Low-level CDP (Chrome DevTools Protocol) WebSocket client.
//!
//! Commands are sent with auto-incrementing IDs and their responses are
//! correlated back to the caller through oneshot channels. Events fan out
//! over a broadcast channel: the request-interception loop and navigation
//! waits subscribe independently and each sees every event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::BrowserError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// How many events the broadcast channel buffers per subscriber before a
/// slow subscriber starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for a single CDP command round-trip.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// A CDP event received from the browser.
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// The event method name (e.g. "Fetch.requestPaused").
    pub method: String,
    /// The event parameters.
    pub params: Value,
}

/// A CDP command to send to the browser.
#[derive(Debug, Clone, serde::Serialize)]
struct CdpCommand {
    id: u64,
    method: String,
    params: Value,
}

/// A CDP response from the browser.
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// The command ID this response correlates to.
    pub id: u64,
    /// The result value on success.
    pub result: Option<Value>,
    /// The error object on failure.
    pub error: Option<CdpResponseError>,
}

/// Error object in a CDP response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CdpResponseError {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// Low-level CDP client over the DevTools WebSocket.
///
/// Cheap to share behind an `Arc`: all methods take `&self`, and every
/// subscriber gets its own independent event stream.
pub struct CdpClient {
    /// Auto-incrementing command ID counter.
    next_id: AtomicU64,
    /// Pending commands awaiting responses: id -> oneshot sender.
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>,
    /// WebSocket write half.
    writer: Mutex<WsSink>,
    /// Event fan-out. Kept here so new subscribers can join at any time.
    events: broadcast::Sender<CdpEvent>,
    /// Background reader task; ends when the WebSocket closes.
    _reader_handle: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a DevTools page target.
    ///
    /// The `ws_url` is the target's WebSocket debugger URL, of the form
    /// `ws://127.0.0.1:{port}/devtools/page/{target_id}`, as reported by
    /// [`crate::discovery::list_targets`].
    pub async fn connect(ws_url: &str) -> Result<Self, BrowserError> {
        tracing::info!(url = ws_url, "connecting to DevTools WebSocket");

        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| BrowserError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: e.to_string(),
            })?;

        let (writer, reader) = ws_stream.split();

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let pending_clone = Arc::clone(&pending);
        let event_tx_clone = event_tx.clone();
        let reader_handle = tokio::spawn(async move {
            Self::read_loop(reader, pending_clone, event_tx_clone).await;
        });

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            events: event_tx,
            _reader_handle: reader_handle,
        })
    }

    /// Subscribe to the event stream.
    ///
    /// Each subscriber sees every event from the moment it subscribes.
    /// Subscribe *before* issuing the command whose events you wait on.
    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    /// Send a CDP command and wait for its response.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, BrowserError> {
        self.send_command_with_timeout(method, params, COMMAND_TIMEOUT)
            .await
    }

    /// Send a CDP command with a custom response timeout.
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, BrowserError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let cmd = CdpCommand {
            id,
            method: method.to_string(),
            params,
        };
        let json = serde_json::to_string(&cmd).map_err(|e| BrowserError::Protocol {
            detail: format!("failed to serialize command: {e}"),
        })?;

        tracing::debug!(id = id, method = method, "sending CDP command");

        // Register the pending response before sending to avoid races.
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        {
            let mut writer = self.writer.lock().await;
            writer
                .send(Message::Text(json))
                .await
                .map_err(|e| BrowserError::Protocol {
                    detail: format!("failed to send WebSocket message: {e}"),
                })?;
        }

        let response = tokio::time::timeout(timeout, rx)
            .await
            .map_err(|_| BrowserError::Timeout {
                method: method.to_string(),
                duration: timeout,
            })?
            .map_err(|_| BrowserError::Protocol {
                detail: "response channel closed unexpectedly".to_string(),
            })?;

        if let Some(err) = response.error {
            return Err(BrowserError::CdpError {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Enable a CDP domain with empty parameters (e.g. "Page", "Runtime").
    pub async fn enable_domain(&self, domain: &str) -> Result<(), BrowserError> {
        self.enable_domain_with(domain, serde_json::json!({})).await
    }

    /// Enable a CDP domain with explicit parameters.
    ///
    /// The Fetch domain takes its interception patterns here, so enabling
    /// it is not parameterless like Page or Runtime.
    pub async fn enable_domain_with(
        &self,
        domain: &str,
        params: Value,
    ) -> Result<(), BrowserError> {
        let method = format!("{domain}.enable");
        self.send_command(&method, params).await?;
        Ok(())
    }

    /// Background task that reads WebSocket messages and dispatches them.
    ///
    /// Messages with an `id` field are responses to pending commands;
    /// messages with a `method` field (and no `id`) are events.
    async fn read_loop(
        mut reader: WsSource,
        pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>,
        event_tx: broadcast::Sender<CdpEvent>,
    ) {
        while let Some(msg_result) = reader.next().await {
            let msg = match msg_result {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket read error, stopping reader");
                    break;
                }
            };

            let text = match msg {
                Message::Text(t) => t,
                Message::Binary(b) => match String::from_utf8(b) {
                    Ok(s) => s,
                    Err(_) => continue,
                },
                Message::Close(_) => {
                    tracing::info!("WebSocket closed by remote");
                    break;
                }
                _ => continue,
            };

            let json: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse CDP message as JSON");
                    continue;
                }
            };

            if let Some(response) = parse_cdp_response(&json) {
                let mut pending_guard = pending.lock().await;
                if let Some(tx) = pending_guard.remove(&response.id) {
                    let _ = tx.send(response);
                } else {
                    tracing::debug!(id = response.id, "response for unknown command ID");
                }
            } else if let Some(event) = parse_cdp_event(&json) {
                // No subscribers is fine; the event is simply dropped.
                let _ = event_tx.send(event);
            }
        }

        // Cancel all pending commands when the connection drops.
        let mut pending_guard = pending.lock().await;
        for (id, tx) in pending_guard.drain() {
            let _ = tx.send(CdpResponse {
                id,
                result: None,
                error: Some(CdpResponseError {
                    code: -1,
                    message: "WebSocket connection closed".to_string(),
                    data: None,
                }),
            });
        }
    }
}

/// Build a CDP JSON-RPC message (used in tests for validation).
pub fn build_cdp_message(id: u64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Parse a CDP response JSON into its components.
pub fn parse_cdp_response(json: &Value) -> Option<CdpResponse> {
    let id = json.get("id")?.as_u64()?;
    Some(CdpResponse {
        id,
        result: json.get("result").cloned(),
        error: json
            .get("error")
            .and_then(|e| serde_json::from_value(e.clone()).ok()),
    })
}

/// Parse a CDP event JSON into its components.
pub fn parse_cdp_event(json: &Value) -> Option<CdpEvent> {
    // Events have a `method` field but no `id`.
    if json.get("id").is_some() {
        return None;
    }
    let method = json.get("method")?.as_str()?.to_string();
    let params = json.get("params").cloned().unwrap_or(Value::Null);
    Some(CdpEvent { method, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cdp_message() {
        let msg = build_cdp_message(
            42,
            "Fetch.enable",
            serde_json::json!({"patterns": [{"urlPattern": "*"}]}),
        );
        assert_eq!(msg["id"], 42);
        assert_eq!(msg["method"], "Fetch.enable");
        assert_eq!(msg["params"]["patterns"][0]["urlPattern"], "*");
    }

    #[test]
    fn test_parse_cdp_response_success() {
        let json = serde_json::json!({
            "id": 1,
            "result": { "frameId": "abc123" }
        });
        let resp = parse_cdp_response(&json).unwrap();
        assert_eq!(resp.id, 1);
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_parse_cdp_response_error() {
        let json = serde_json::json!({
            "id": 2,
            "error": {
                "code": -32602,
                "message": "Invalid params",
                "data": "missing required field 'url'"
            }
        });
        let resp = parse_cdp_response(&json).unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "Invalid params");
        assert_eq!(err.data.as_deref(), Some("missing required field 'url'"));
    }

    #[test]
    fn test_parse_cdp_response_missing_id() {
        let json = serde_json::json!({
            "method": "Fetch.requestPaused",
            "params": {}
        });
        assert!(parse_cdp_response(&json).is_none());
    }

    #[test]
    fn test_parse_cdp_event_valid() {
        let json = serde_json::json!({
            "method": "Fetch.requestPaused",
            "params": {
                "requestId": "interception-job-1.0",
                "request": { "url": "https://app.test/", "method": "GET" }
            }
        });
        let event = parse_cdp_event(&json).unwrap();
        assert_eq!(event.method, "Fetch.requestPaused");
        assert_eq!(event.params["requestId"], "interception-job-1.0");
    }

    #[test]
    fn test_parse_cdp_event_rejects_response() {
        // A message with an `id` is a response, not an event.
        let json = serde_json::json!({
            "id": 1,
            "method": "Page.navigate",
            "result": {}
        });
        assert!(parse_cdp_event(&json).is_none());
    }

    #[test]
    fn test_parse_cdp_event_no_params() {
        let json = serde_json::json!({ "method": "Page.loadEventFired" });
        let event = parse_cdp_event(&json).unwrap();
        assert_eq!(event.method, "Page.loadEventFired");
        assert_eq!(event.params, Value::Null);
    }

    #[test]
    fn test_cdp_command_serialization() {
        let cmd = CdpCommand {
            id: 7,
            method: "Runtime.evaluate".to_string(),
            params: serde_json::json!({ "expression": "1 + 1" }),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "Runtime.evaluate");
        assert_eq!(json["params"]["expression"], "1 + 1");
    }

    #[tokio::test]
    async fn broadcast_fans_out_to_every_subscriber() {
        let (tx, _) = broadcast::channel::<CdpEvent>(16);
        let mut rx_a = tx.subscribe();
        let mut rx_b = tx.subscribe();

        tx.send(CdpEvent {
            method: "Fetch.requestPaused".into(),
            params: serde_json::json!({"requestId": "r1"}),
        })
        .unwrap();

        let a = rx_a.recv().await.unwrap();
        let b = rx_b.recv().await.unwrap();
        assert_eq!(a.method, "Fetch.requestPaused");
        assert_eq!(b.params["requestId"], "r1");
    }
}
