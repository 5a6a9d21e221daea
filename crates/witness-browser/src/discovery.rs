//! DevTools target discovery.
//!
//! A browser started with `--remote-debugging-port` serves a JSON list of
//! debuggable targets at `http://{host}:{port}/json`. This module fetches
//! that list and picks the page target to attach to.

use serde::Deserialize;

use crate::error::BrowserError;

/// One debuggable target as reported by the browser's `/json` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DevToolsTarget {
    /// Target identifier.
    pub id: String,
    /// Target kind: "page", "iframe", "service_worker", ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Page title, if any.
    #[serde(default)]
    pub title: String,
    /// Current URL of the target.
    #[serde(default)]
    pub url: String,
    /// WebSocket debugger URL. Absent when another client is attached.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub ws_url: Option<String>,
}

/// Fetch the list of debuggable targets from a DevTools HTTP endpoint.
///
/// `devtools_url` is the base endpoint, e.g. `http://127.0.0.1:9222`.
pub async fn list_targets(devtools_url: &str) -> Result<Vec<DevToolsTarget>, BrowserError> {
    let list_url = format!("{}/json", devtools_url.trim_end_matches('/'));
    tracing::debug!(url = %list_url, "listing DevTools targets");

    let response = reqwest::get(&list_url)
        .await
        .map_err(|e| BrowserError::Discovery {
            url: list_url.clone(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(BrowserError::Discovery {
            url: list_url,
            reason: format!("HTTP {}", response.status()),
        });
    }

    response
        .json::<Vec<DevToolsTarget>>()
        .await
        .map_err(|e| BrowserError::Discovery {
            url: list_url,
            reason: format!("bad target list payload: {e}"),
        })
}

/// Pick the first attachable page target, optionally requiring its URL to
/// contain `url_hint`.
pub fn find_page_target<'a>(
    targets: &'a [DevToolsTarget],
    url_hint: Option<&str>,
) -> Option<&'a DevToolsTarget> {
    targets.iter().find(|t| {
        t.kind == "page"
            && t.ws_url.is_some()
            && url_hint.map_or(true, |hint| t.url.contains(hint))
    })
}

/// Fetch targets and resolve the page target in one step.
pub async fn resolve_page_target(
    devtools_url: &str,
    url_hint: Option<&str>,
) -> Result<DevToolsTarget, BrowserError> {
    let targets = list_targets(devtools_url).await?;
    find_page_target(&targets, url_hint)
        .cloned()
        .ok_or_else(|| BrowserError::NoPageTarget {
            url: devtools_url.to_string(),
        })
}
