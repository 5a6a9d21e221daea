//! Error types for the witness-browser crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving the browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Failed to establish a WebSocket connection to the DevTools endpoint.
    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// DevTools target discovery failed (HTTP error or bad payload).
    #[error("target discovery at {url} failed: {reason}")]
    Discovery { url: String, reason: String },

    /// No page-type target with a WebSocket debugger URL was found.
    #[error("no debuggable page target found at {url}")]
    NoPageTarget { url: String },

    /// A CDP command returned an error response.
    #[error("CDP error {code}: {message}")]
    CdpError {
        code: i64,
        message: String,
        data: Option<String>,
    },

    /// A CDP command timed out waiting for a response.
    #[error("CDP command '{method}' timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    /// A protocol-level error (serialization, unexpected message format).
    #[error("CDP protocol error: {detail}")]
    Protocol { detail: String },

    /// The requested DOM element was not found.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// An element could not be interacted with (not visible, zero-size).
    #[error("element not interactable: {reason}")]
    ElementNotInteractable { reason: String },

    /// Navigation failed at the browser level.
    #[error("navigation failed: {reason}")]
    NavigationFailed { reason: String },

    /// JavaScript evaluation threw an exception in the page.
    #[error("JavaScript exception: {message}")]
    JsException { message: String },

    /// The page did not fire its load event within the expected timeout.
    #[error("page load timed out after {duration:?}")]
    PageLoadTimeout { duration: Duration },
}
