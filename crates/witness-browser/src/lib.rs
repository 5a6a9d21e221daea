//! Chrome DevTools Protocol driver with request interception.
//!
//! This crate drives a running Chrome/Chromium instance over its DevTools
//! WebSocket endpoint and installs a [`witness_mock::RoutingInterceptor`]
//! against the browser's Fetch domain, so every outgoing request is either
//! fulfilled from the mock catalog or forwarded to the real network.
//!
//! # Architecture
//!
//! - **`cdp`**: low-level WebSocket client with JSON-RPC command/response
//!   correlation; events fan out over a broadcast channel so the
//!   interception loop and navigation waits can listen independently.
//! - **`discovery`**: queries the browser's `/json` HTTP endpoint for page
//!   targets and their WebSocket debugger URLs.
//! - **`page`**: high-level [`PageDriver`](page::PageDriver) for
//!   navigation, JavaScript evaluation, form filling, clicking, and
//!   screenshots.
//! - **`intercept`**: registers an interceptor against `Fetch.enable` with
//!   a wildcard pattern and answers each `Fetch.requestPaused` event with
//!   `Fetch.fulfillRequest` or `Fetch.continueRequest`.
//!
//! # Chrome Setup
//!
//! Chrome must be running with the `--remote-debugging-port` flag:
//!
//! ```sh
//! chromium --headless --remote-debugging-port=9222
//! ```
//!
//! # Example (conceptual)
//!
//! ```ignore
//! use witness_browser::{discovery, intercept, page::PageDriver};
//!
//! let targets = discovery::list_targets("http://127.0.0.1:9222").await?;
//! let target = discovery::find_page_target(&targets, None).unwrap();
//! let driver = PageDriver::connect(target.ws_url.as_deref().unwrap()).await?;
//! let _session = intercept::register(driver.client().clone(), interceptor).await?;
//! driver.goto("http://localhost:3000", Duration::from_secs(10)).await?;
//! ```

pub mod cdp;
pub mod discovery;
pub mod error;
pub mod intercept;
pub mod page;

pub use cdp::{CdpClient, CdpEvent};
pub use error::BrowserError;
pub use intercept::InterceptionSession;
pub use page::PageDriver;
