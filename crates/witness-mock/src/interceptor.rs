//! The routing interceptor: per-request fulfill-or-continue decisions.
//!
//! The interceptor owns a read-only catalog and nothing else, so a single
//! instance can be cloned into as many concurrent callbacks as the browser
//! dispatches without locking. Decisions are computed fresh for every
//! request, never cached, never shared across requests.

use std::sync::Arc;

use crate::catalog::ResponseCatalog;
use crate::rule::MockRule;

/// Read-only view of an in-flight outgoing request.
///
/// Borrowed for the duration of the interception callback only; the
/// lifetime prevents the interceptor from retaining it beyond that extent.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    /// Full request URL.
    pub url: &'a str,
    /// HTTP method (GET, POST, ...).
    pub method: &'a str,
}

/// The per-request outcome of interception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FulfillmentDecision<'a> {
    /// Serve this rule's canned response; the request never reaches the
    /// network.
    Fulfill(&'a MockRule),
    /// Forward the request unmodified to the real network.
    PassThrough,
}

impl FulfillmentDecision<'_> {
    /// Whether this decision serves a canned response.
    pub fn is_fulfill(&self) -> bool {
        matches!(self, FulfillmentDecision::Fulfill(_))
    }
}

/// Routes every outgoing request to a fulfill-or-continue decision.
///
/// Registered once per browser session against a wildcard pattern. The
/// interceptor holds no mutable state: cloning shares the underlying
/// catalog, and [`decide`](Self::decide) is safe to call concurrently and
/// re-entrantly for distinct requests.
#[derive(Debug, Clone)]
pub struct RoutingInterceptor {
    catalog: Arc<ResponseCatalog>,
}

impl RoutingInterceptor {
    /// Create an interceptor over a frozen catalog.
    pub fn new(catalog: ResponseCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Decide what to do with one outgoing request.
    ///
    /// Consults the catalog in registration order; the first matching rule
    /// yields [`FulfillmentDecision::Fulfill`], and an unmatched request
    /// yields [`FulfillmentDecision::PassThrough`] by design, not by
    /// failure. Called exactly once per request.
    pub fn decide(&self, request: RequestView<'_>) -> FulfillmentDecision<'_> {
        match self.catalog.find(request.url, request.method) {
            Some(rule) => {
                tracing::debug!(
                    rule = rule.label(),
                    method = request.method,
                    url = request.url,
                    "fulfilling request from catalog"
                );
                FulfillmentDecision::Fulfill(rule)
            }
            None => {
                tracing::debug!(
                    method = request.method,
                    url = request.url,
                    "no rule matched, passing through"
                );
                FulfillmentDecision::PassThrough
            }
        }
    }

    /// The catalog this interceptor consults.
    pub fn catalog(&self) -> &ResponseCatalog {
        &self.catalog
    }
}
