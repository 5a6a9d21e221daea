//! Request matching and mock fulfillment core.
//!
//! This crate decides, for every outgoing HTTP request a browser session
//! makes, whether the request should be answered with a canned response or
//! allowed to reach the real network. It knows nothing about the browser:
//! the caller feeds it `(url, method)` pairs and executes whatever decision
//! comes back.
//!
//! # Overview
//!
//! - [`Matcher`]: a single predicate over a request (URL substring, exact
//!   URL, method equality, or match-all), composed with logical AND
//! - [`MockRule`]: matchers plus the canned response to serve when they all
//!   accept a request
//! - [`ResponseCatalog`]: an immutable, ordered set of rules; the first
//!   matching rule wins
//! - [`RoutingInterceptor`]: turns a catalog lookup into a per-request
//!   [`FulfillmentDecision`]
//!
//! # Example
//!
//! ```
//! use witness_mock::{MockRule, ResponseCatalog, RoutingInterceptor, RequestView};
//! use witness_mock::FulfillmentDecision;
//!
//! let catalog = ResponseCatalog::builder()
//!     .rule(
//!         MockRule::builder("profile-read")
//!             .match_substring("/api/users/u-1/profile")
//!             .method("GET")
//!             .status(200)
//!             .content_type("application/json")
//!             .body(r#"{"userId":"u-1"}"#)
//!             .build()
//!             .unwrap(),
//!     )
//!     .build();
//!
//! let interceptor = RoutingInterceptor::new(catalog);
//! let decision = interceptor.decide(RequestView {
//!     url: "https://app.test/api/users/u-1/profile",
//!     method: "GET",
//! });
//! assert!(matches!(decision, FulfillmentDecision::Fulfill(_)));
//! ```

pub mod catalog;
pub mod error;
pub mod interceptor;
pub mod matcher;
pub mod rule;

pub use catalog::ResponseCatalog;
pub use error::CatalogError;
pub use interceptor::{FulfillmentDecision, RequestView, RoutingInterceptor};
pub use matcher::Matcher;
pub use rule::{MockRule, MockRuleBuilder};
