//! Request interception over the CDP Fetch domain.
//!
//! [`register`] enables `Fetch` with a wildcard pattern and spawns a task
//! that answers every `Fetch.requestPaused` event with either
//! `Fetch.fulfillRequest` (a catalog rule matched) or
//! `Fetch.continueRequest` (pass-through). Registration is one-way: there
//! is no unregister operation, and closing the browser session ends
//! interception by dropping the event stream.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;

use witness_mock::{FulfillmentDecision, RequestView, RoutingInterceptor};

use crate::cdp::CdpClient;
use crate::error::BrowserError;

/// A request paused by the Fetch domain, reduced to the fields the routing
/// interceptor inspects plus the ID needed to resume it.
#[derive(Debug, Clone)]
pub struct PausedRequest {
    /// Fetch-domain request ID, used to fulfill or continue the request.
    pub request_id: String,
    /// Full request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
}

/// An active interception registration.
///
/// Holding this value keeps the dispatch task alive; it ends on its own
/// when the browser session closes. There is deliberately no unregister
/// operation -- the transition from unregistered to registered is one-way
/// for the life of the session.
pub struct InterceptionSession {
    _task: tokio::task::JoinHandle<()>,
}

/// Register a routing interceptor against every request in the session.
///
/// Must be called before any navigation so the first page load is already
/// intercepted. The returned [`InterceptionSession`] should be kept alive
/// for the duration of the verification run.
pub async fn register(
    client: Arc<CdpClient>,
    interceptor: RoutingInterceptor,
) -> Result<InterceptionSession, BrowserError> {
    // Subscribe before enabling so no early request can slip past.
    let mut events = client.subscribe();

    client
        .enable_domain_with("Fetch", serde_json::json!({
            "patterns": [{ "urlPattern": "*" }],
        }))
        .await?;

    tracing::info!(
        rules = interceptor.catalog().len(),
        "request interception registered"
    );

    let task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "interception loop lagged behind event stream");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if event.method != "Fetch.requestPaused" {
                continue;
            }

            let Some(paused) = parse_request_paused(&event.params) else {
                tracing::warn!("unparseable Fetch.requestPaused event, skipping");
                continue;
            };

            // Decide-and-resume per request on its own task: the browser may
            // pause several requests concurrently, and their fulfillment
            // order is not guaranteed relative to one another.
            let client = Arc::clone(&client);
            let interceptor = interceptor.clone();
            tokio::spawn(async move {
                if let Err(e) = resolve_paused_request(&client, &interceptor, &paused).await {
                    tracing::warn!(
                        request_id = %paused.request_id,
                        url = %paused.url,
                        error = %e,
                        "failed to resolve intercepted request"
                    );
                }
            });
        }
    });

    Ok(InterceptionSession { _task: task })
}

/// Decide one paused request and send the corresponding Fetch command.
async fn resolve_paused_request(
    client: &CdpClient,
    interceptor: &RoutingInterceptor,
    paused: &PausedRequest,
) -> Result<(), BrowserError> {
    // The view borrows from the paused event for the extent of the decision
    // only; the decision's owned parameters are extracted before any await.
    let decision = interceptor.decide(RequestView {
        url: &paused.url,
        method: &paused.method,
    });

    let params = match decision {
        FulfillmentDecision::Fulfill(rule) => {
            tracing::info!(
                rule = rule.label(),
                method = %paused.method,
                url = %paused.url,
                "intercepted"
            );
            build_fulfill_params(
                &paused.request_id,
                rule.status(),
                rule.content_type(),
                rule.body(),
            )
        }
        FulfillmentDecision::PassThrough => {
            return client
                .send_command(
                    "Fetch.continueRequest",
                    build_continue_params(&paused.request_id),
                )
                .await
                .map(|_| ());
        }
    };

    client
        .send_command("Fetch.fulfillRequest", params)
        .await
        .map(|_| ())
}

/// Parse `Fetch.requestPaused` parameters into a [`PausedRequest`].
///
/// Returns `None` when the required fields are missing.
pub fn parse_request_paused(params: &Value) -> Option<PausedRequest> {
    let request_id = params.get("requestId")?.as_str()?.to_string();
    let request = params.get("request")?;
    let url = request.get("url")?.as_str()?.to_string();
    let method = request.get("method")?.as_str()?.to_string();
    Some(PausedRequest {
        request_id,
        url,
        method,
    })
}

/// Build `Fetch.fulfillRequest` parameters.
///
/// The body must be base64-encoded on the wire; the content type travels
/// in `responseHeaders`.
pub fn build_fulfill_params(request_id: &str, status: u16, content_type: &str, body: &str) -> Value {
    serde_json::json!({
        "requestId": request_id,
        "responseCode": status,
        "responseHeaders": [
            { "name": "Content-Type", "value": content_type },
        ],
        "body": B64.encode(body.as_bytes()),
    })
}

/// Build `Fetch.continueRequest` parameters.
pub fn build_continue_params(request_id: &str) -> Value {
    serde_json::json!({ "requestId": request_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_paused_event() {
        let params = serde_json::json!({
            "requestId": "interception-job-1.0",
            "frameId": "F1",
            "resourceType": "XHR",
            "request": {
                "url": "https://app.test/api/users/u-1/profile",
                "method": "PUT",
                "headers": { "Content-Type": "application/json" },
                "postData": "{\"birthCity\":\"Paris\"}"
            }
        });

        let paused = parse_request_paused(&params).expect("should parse");
        assert_eq!(paused.request_id, "interception-job-1.0");
        assert_eq!(paused.url, "https://app.test/api/users/u-1/profile");
        assert_eq!(paused.method, "PUT");
    }

    #[test]
    fn rejects_paused_event_without_request_id() {
        let params = serde_json::json!({
            "request": { "url": "https://app.test/", "method": "GET" }
        });
        assert!(parse_request_paused(&params).is_none());
    }

    #[test]
    fn rejects_paused_event_without_request_fields() {
        let params = serde_json::json!({
            "requestId": "r1",
            "request": { "url": "https://app.test/" }
        });
        assert!(parse_request_paused(&params).is_none());
    }

    #[test]
    fn fulfill_params_carry_status_header_and_base64_body() {
        let body = r#"{"message":"Profile updated successfully"}"#;
        let params = build_fulfill_params("r7", 200, "application/json", body);

        assert_eq!(params["requestId"], "r7");
        assert_eq!(params["responseCode"], 200);
        assert_eq!(params["responseHeaders"][0]["name"], "Content-Type");
        assert_eq!(params["responseHeaders"][0]["value"], "application/json");

        let decoded = B64
            .decode(params["body"].as_str().unwrap())
            .expect("body should be valid base64");
        assert_eq!(String::from_utf8(decoded).unwrap(), body);
    }

    #[test]
    fn fulfill_body_roundtrips_non_ascii() {
        let body = r#"{"standardizedLocationName":"Paris, Île-de-France, France"}"#;
        let params = build_fulfill_params("r8", 200, "application/json", body);
        let decoded = B64.decode(params["body"].as_str().unwrap()).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), body);
    }

    #[test]
    fn continue_params_only_name_the_request() {
        let params = build_continue_params("r9");
        assert_eq!(params, serde_json::json!({ "requestId": "r9" }));
    }
}
