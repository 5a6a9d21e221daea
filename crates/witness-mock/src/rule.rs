//! Mock rules: a request matcher paired with a canned response.
//!
//! Rules are constructed through [`MockRuleBuilder`], which validates that
//! every required field is present. A rule that reaches a catalog is
//! guaranteed well-formed.

use serde_json::Value;

use crate::error::CatalogError;
use crate::matcher::Matcher;

/// A declarative pairing of request matchers and a canned response.
///
/// All matchers must accept a request for the rule to apply (logical AND).
/// The response fields are served verbatim when the rule fires.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRule {
    label: String,
    matchers: Vec<Matcher>,
    status: u16,
    content_type: String,
    body: String,
}

impl MockRule {
    /// Start building a rule. The label names the rule in logs and errors.
    pub fn builder(label: impl Into<String>) -> MockRuleBuilder {
        MockRuleBuilder {
            label: label.into(),
            matchers: Vec::new(),
            status: None,
            content_type: None,
            body: None,
        }
    }

    /// Check whether every matcher accepts the given request.
    pub fn matches(&self, url: &str, method: &str) -> bool {
        self.matchers.iter().all(|m| m.accepts(url, method))
    }

    /// The rule's human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The matchers, in the order they were added.
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// HTTP status code of the canned response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Content type of the canned response.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Serialized body of the canned response.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Validating builder for [`MockRule`].
#[derive(Debug)]
pub struct MockRuleBuilder {
    label: String,
    matchers: Vec<Matcher>,
    status: Option<u16>,
    content_type: Option<String>,
    body: Option<String>,
}

impl MockRuleBuilder {
    /// Require the request URL to contain this substring.
    pub fn match_substring(mut self, needle: impl Into<String>) -> Self {
        self.matchers.push(Matcher::Substring(needle.into()));
        self
    }

    /// Require the request URL to equal this string exactly.
    pub fn match_exact(mut self, url: impl Into<String>) -> Self {
        self.matchers.push(Matcher::Exact(url.into()));
        self
    }

    /// Require the request method to equal this one.
    ///
    /// A rule without a method matcher applies to any method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.matchers.push(Matcher::MethodEquals(method.into()));
        self
    }

    /// Match every request. Useful as a terminal catch-all.
    pub fn match_any(mut self) -> Self {
        self.matchers.push(Matcher::Any);
        self
    }

    /// Set the HTTP status code of the canned response.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the content type of the canned response.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the serialized body of the canned response.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body, also setting the content type to `application/json`.
    pub fn json_body(mut self, value: &Value) -> Self {
        self.content_type = Some("application/json".into());
        self.body = Some(value.to_string());
        self
    }

    /// Validate and build the rule.
    ///
    /// Fails with [`CatalogError`] if the rule has no matchers or is missing
    /// the status, content type, or body.
    pub fn build(self) -> Result<MockRule, CatalogError> {
        if self.matchers.is_empty() {
            return Err(CatalogError::NoMatchers { rule: self.label });
        }
        let status = self.status.ok_or_else(|| CatalogError::MissingField {
            rule: self.label.clone(),
            field: "status",
        })?;
        let content_type = self.content_type.ok_or_else(|| CatalogError::MissingField {
            rule: self.label.clone(),
            field: "content_type",
        })?;
        let body = self.body.ok_or_else(|| CatalogError::MissingField {
            rule: self.label.clone(),
            field: "body",
        })?;

        Ok(MockRule {
            label: self.label,
            matchers: self.matchers,
            status,
            content_type,
            body,
        })
    }
}
