//! High-level page driver over the CDP client.
//!
//! Wraps a [`CdpClient`] with the operations a verification run needs:
//! navigation with load waits, JavaScript evaluation, local storage
//! seeding, form filling, clicking, and screenshots.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde_json::Value;

use crate::cdp::CdpClient;
use crate::error::BrowserError;

/// Opaque handle to a DOM node, as returned by CDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub i64);

/// High-level browser automation driver for a single page target.
pub struct PageDriver {
    client: Arc<CdpClient>,
}

impl PageDriver {
    /// Connect to a DevTools page target and enable the Page, DOM, and
    /// Runtime domains.
    ///
    /// The Fetch domain is deliberately not enabled here; interception is
    /// registered separately (see [`crate::intercept::register`]) so it can
    /// be installed before any navigation occurs.
    pub async fn connect(ws_url: &str) -> Result<Self, BrowserError> {
        let client = Arc::new(CdpClient::connect(ws_url).await?);

        client.enable_domain("Page").await?;
        client.enable_domain("DOM").await?;
        client.enable_domain("Runtime").await?;

        Ok(Self { client })
    }

    /// The shared CDP client, for registering interception or sending raw
    /// commands.
    pub fn client(&self) -> &Arc<CdpClient> {
        &self.client
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Navigate to a URL without waiting for the load event.
    ///
    /// Browser-level navigation errors (e.g. net::ERR_NAME_NOT_RESOLVED)
    /// are surfaced as [`BrowserError::NavigationFailed`].
    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let result = self
            .client
            .send_command("Page.navigate", serde_json::json!({ "url": url }))
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(BrowserError::NavigationFailed {
                reason: error_text.to_string(),
            });
        }

        Ok(())
    }

    /// Navigate to a URL and wait for `Page.loadEventFired`.
    ///
    /// Subscribes to the event stream before issuing the navigation so the
    /// load event cannot be missed.
    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let mut events = self.client.subscribe();
        self.navigate(url).await?;

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(BrowserError::PageLoadTimeout { duration: timeout });
            }

            match tokio::time::timeout(remaining, events.recv()).await {
                Ok(Ok(event)) => {
                    if event.method == "Page.loadEventFired" {
                        tracing::debug!(url = url, "page load event fired");
                        return Ok(());
                    }
                    // Other events are consumed and ignored here.
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "event subscriber lagged while awaiting load");
                }
                Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                    return Err(BrowserError::Protocol {
                        detail: "WebSocket closed while waiting for page load".to_string(),
                    });
                }
                Err(_) => {
                    return Err(BrowserError::PageLoadTimeout { duration: timeout });
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // JavaScript evaluation
    // -----------------------------------------------------------------------

    /// Evaluate a JavaScript expression in the page context.
    ///
    /// Returns the result as a `serde_json::Value`. A thrown exception is
    /// surfaced as [`BrowserError::JsException`].
    pub async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .client
            .send_command(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|d| d.as_str())
                .or_else(|| exception.get("text").and_then(|t| t.as_str()))
                .unwrap_or("unknown exception")
                .to_string();
            return Err(BrowserError::JsException { message });
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Write a key-value pair into the page's local storage.
    ///
    /// Used to seed boundary state (e.g. an auth token bundle) before
    /// navigating to the page under test.
    pub async fn set_local_storage(&self, key: &str, value: &str) -> Result<(), BrowserError> {
        let expression = format!(
            "localStorage.setItem({}, {})",
            js_string(key),
            js_string(value)
        );
        self.evaluate(&expression).await?;
        Ok(())
    }

    /// The page's visible text (`document.body.innerText`).
    pub async fn body_text(&self) -> Result<String, BrowserError> {
        let value = self.evaluate("document.body ? document.body.innerText : ''").await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    /// The current value of an input element, or `None` if the element does
    /// not exist.
    pub async fn input_value(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let expression = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.value : null; }})()",
            js_string(selector)
        );
        let value = self.evaluate(&expression).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    // -----------------------------------------------------------------------
    // DOM queries
    // -----------------------------------------------------------------------

    /// Get the document root node ID.
    async fn document_root(&self) -> Result<i64, BrowserError> {
        let result = self
            .client
            .send_command("DOM.getDocument", serde_json::json!({}))
            .await?;

        result
            .get("root")
            .and_then(|r| r.get("nodeId"))
            .and_then(|n| n.as_i64())
            .ok_or_else(|| BrowserError::Protocol {
                detail: "DOM.getDocument did not return a root nodeId".to_string(),
            })
    }

    /// Find a single element matching a CSS selector.
    ///
    /// Returns `Ok(None)` if no element matches.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, BrowserError> {
        let root_id = self.document_root().await?;

        let result = self
            .client
            .send_command(
                "DOM.querySelector",
                serde_json::json!({ "nodeId": root_id, "selector": selector }),
            )
            .await?;

        let node_id = result.get("nodeId").and_then(|n| n.as_i64()).unwrap_or(0);

        // CDP reports "not found" as nodeId 0.
        if node_id == 0 {
            Ok(None)
        } else {
            Ok(Some(NodeId(node_id)))
        }
    }

    /// Find an element or fail with [`BrowserError::ElementNotFound`].
    async fn require_element(&self, selector: &str) -> Result<NodeId, BrowserError> {
        self.query_selector(selector)
            .await?
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Element interaction
    // -----------------------------------------------------------------------

    /// Click an element identified by a CSS selector.
    ///
    /// Retrieves the element's content quad via `DOM.getBoxModel`, computes
    /// its center, and dispatches `mousePressed`/`mouseReleased` there.
    pub async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let node_id = self.require_element(selector).await?;

        let result = self
            .client
            .send_command(
                "DOM.getBoxModel",
                serde_json::json!({ "nodeId": node_id.0 }),
            )
            .await?;

        let content: Vec<f64> = result
            .get("model")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_f64()).collect())
            .ok_or_else(|| BrowserError::Protocol {
                detail: "DOM.getBoxModel did not return a content quad".to_string(),
            })?;

        let (cx, cy) = center_of_quad(&content).ok_or_else(|| {
            BrowserError::ElementNotInteractable {
                reason: format!("element {selector} has no usable content quad"),
            }
        })?;

        for event_type in ["mousePressed", "mouseReleased"] {
            self.client
                .send_command(
                    "Input.dispatchMouseEvent",
                    build_mouse_params(event_type, cx, cy),
                )
                .await?;
        }

        Ok(())
    }

    /// Fill an input element with text.
    ///
    /// Focuses the element via `DOM.focus`, then dispatches per-character
    /// `keyDown`/`keyUp` events so the page's input handlers fire as they
    /// would for a real user.
    pub async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let node_id = self.require_element(selector).await?;

        self.client
            .send_command("DOM.focus", serde_json::json!({ "nodeId": node_id.0 }))
            .await?;

        for ch in text.chars() {
            let ch_str = ch.to_string();
            for event_type in ["keyDown", "keyUp"] {
                self.client
                    .send_command(
                        "Input.dispatchKeyEvent",
                        build_key_event_params(event_type, &ch_str),
                    )
                    .await?;
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Screenshots
    // -----------------------------------------------------------------------

    /// Take a PNG screenshot of the current page. Returns the raw bytes.
    pub async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        let result = self
            .client
            .send_command(
                "Page.captureScreenshot",
                serde_json::json!({ "format": "png" }),
            )
            .await?;

        let data_b64 = result
            .get("data")
            .and_then(|d| d.as_str())
            .ok_or_else(|| BrowserError::Protocol {
                detail: "Page.captureScreenshot did not return 'data' field".to_string(),
            })?;

        B64.decode(data_b64).map_err(|e| BrowserError::Protocol {
            detail: format!("failed to decode screenshot base64: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// CDP parameter builders (pure helpers, also used by tests)
// ---------------------------------------------------------------------------

/// Quote a Rust string as a JavaScript string literal.
///
/// Serializing through serde_json gives correct escaping for quotes,
/// backslashes, and control characters.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Build `Input.dispatchMouseEvent` parameters for a left click at (x, y).
pub fn build_mouse_params(event_type: &str, x: f64, y: f64) -> Value {
    serde_json::json!({
        "type": event_type,
        "x": x,
        "y": y,
        "button": "left",
        "clickCount": 1,
    })
}

/// Build `Input.dispatchKeyEvent` parameters for a single character.
pub fn build_key_event_params(event_type: &str, text: &str) -> Value {
    serde_json::json!({
        "type": event_type,
        "text": text,
        "unmodifiedText": text,
        "key": text,
    })
}

/// Compute the center point of a content quad (8-element coordinate array).
///
/// Returns `None` if the quad is invalid or degenerate.
pub fn center_of_quad(quad: &[f64]) -> Option<(f64, f64)> {
    if quad.len() < 8 {
        return None;
    }
    let xs: Vec<f64> = quad.iter().step_by(2).copied().collect();
    let ys: Vec<f64> = quad.iter().skip(1).step_by(2).copied().collect();

    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max_x <= min_x || max_y <= min_y {
        return None;
    }
    Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes_and_backslashes() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string(r#"he said "hi""#), r#""he said \"hi\"""#);
        assert_eq!(js_string("a\\b"), r#""a\\b""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn local_storage_expression_is_well_formed() {
        // The seeded value is itself JSON; the expression must keep its
        // quotes escaped.
        let value = r#"{"idToken":"abc","expiresAt":9999999999999}"#;
        let expr = format!(
            "localStorage.setItem({}, {})",
            js_string("auth_tokens"),
            js_string(value)
        );
        assert!(expr.starts_with("localStorage.setItem(\"auth_tokens\", \"{"));
        assert!(expr.contains(r#"\"idToken\""#));
    }

    #[test]
    fn test_build_mouse_params() {
        let params = build_mouse_params("mousePressed", 100.0, 200.0);
        assert_eq!(params["type"], "mousePressed");
        assert_eq!(params["x"], 100.0);
        assert_eq!(params["y"], 200.0);
        assert_eq!(params["button"], "left");
        assert_eq!(params["clickCount"], 1);
    }

    #[test]
    fn test_build_key_event_params() {
        let params = build_key_event_params("keyDown", "P");
        assert_eq!(params["type"], "keyDown");
        assert_eq!(params["text"], "P");
        assert_eq!(params["unmodifiedText"], "P");
        assert_eq!(params["key"], "P");
    }

    #[test]
    fn test_center_of_quad_basic() {
        let quad = [0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
        let (cx, cy) = center_of_quad(&quad).unwrap();
        assert!((cx - 50.0).abs() < 0.001);
        assert!((cy - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_center_of_quad_offset() {
        let quad = [50.0, 75.0, 250.0, 75.0, 250.0, 175.0, 50.0, 175.0];
        let (cx, cy) = center_of_quad(&quad).unwrap();
        assert!((cx - 150.0).abs() < 0.001);
        assert!((cy - 125.0).abs() < 0.001);
    }

    #[test]
    fn test_center_of_quad_rejects_short_and_degenerate() {
        assert!(center_of_quad(&[0.0, 0.0, 100.0, 0.0]).is_none());
        // Zero-area quad.
        let quad = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        assert!(center_of_quad(&quad).is_none());
    }

    #[test]
    fn parse_query_selector_not_found_is_zero() {
        // CDP returns nodeId 0 when no element matches.
        let response = serde_json::json!({ "nodeId": 0 });
        let node_id = response.get("nodeId").and_then(|n| n.as_i64()).unwrap();
        assert_eq!(node_id, 0);
    }

    #[test]
    fn parse_screenshot_response_roundtrips_base64() {
        let fake_png = vec![0x89, 0x50, 0x4E, 0x47];
        let b64_data = B64.encode(&fake_png);
        let response = serde_json::json!({ "data": b64_data });

        let data_str = response.get("data").and_then(|d| d.as_str()).unwrap();
        assert_eq!(B64.decode(data_str).unwrap(), fake_png);
    }
}
