//! Error types for the witness-mock crate.

use thiserror::Error;

/// Errors raised while building mock rules or a response catalog.
///
/// A malformed rule is a test-authoring bug, not a recoverable runtime
/// condition: these errors surface at construction time and fail the
/// enclosing session setup. Once a catalog is built, every rule in it is
/// well-formed and matching cannot fail.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A rule was built without a required field.
    #[error("mock rule `{rule}` is missing required field `{field}`")]
    MissingField { rule: String, field: &'static str },

    /// A rule was built with no matchers at all.
    #[error("mock rule `{rule}` has no matchers (use match_any for a catch-all)")]
    NoMatchers { rule: String },
}
