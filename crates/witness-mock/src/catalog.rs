//! The response catalog: an immutable, ordered set of mock rules.
//!
//! Rules are consulted in registration order and the first match wins.
//! Overlap between rules is resolved purely by that priority; this is a
//! deliberate simplification for short-lived, purpose-built test fixtures,
//! not a general proxy policy.

use crate::rule::MockRule;

/// An immutable set of canned responses keyed by request matchers.
///
/// Built once before any navigation occurs and never modified afterwards.
/// Lookup is a pure function over the registered rules and the request.
#[derive(Debug, Clone, Default)]
pub struct ResponseCatalog {
    rules: Vec<MockRule>,
}

impl ResponseCatalog {
    /// Start building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder { rules: Vec::new() }
    }

    /// Find the first rule, in registration order, that matches the request.
    ///
    /// Returns `None` when no rule matches, which callers treat as
    /// pass-through rather than an error.
    pub fn find(&self, url: &str, method: &str) -> Option<&MockRule> {
        self.rules.iter().find(|rule| rule.matches(url, method))
    }

    /// The rules in registration order.
    pub fn rules(&self) -> &[MockRule] {
        &self.rules
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog holds no rules (every request passes through).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`ResponseCatalog`]. Registration order is priority order.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    rules: Vec<MockRule>,
}

impl CatalogBuilder {
    /// Register a rule. Earlier registrations win over later ones.
    pub fn rule(mut self, rule: MockRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Freeze the catalog.
    pub fn build(self) -> ResponseCatalog {
        ResponseCatalog { rules: self.rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(label: &str, substring: &str, method: Option<&str>) -> MockRule {
        let mut builder = MockRule::builder(label).match_substring(substring);
        if let Some(m) = method {
            builder = builder.method(m);
        }
        builder
            .status(200)
            .content_type("application/json")
            .body(format!(r#"{{"from":"{label}"}}"#))
            .build()
            .expect("rule should build")
    }

    #[test]
    fn returns_none_when_no_rule_matches() {
        let catalog = ResponseCatalog::builder()
            .rule(rule("profile", "/profile", Some("GET")))
            .build();

        assert!(catalog.find("https://app.test/static/logo.png", "GET").is_none());
    }

    #[test]
    fn first_registered_rule_wins_over_later_overlap() {
        // R1 matches any method on "profile"; R2 is more specific (GET only)
        // but registered second. A GET must resolve via R1.
        let catalog = ResponseCatalog::builder()
            .rule(rule("r1-any-method", "profile", None))
            .rule(rule("r2-get-only", "profile", Some("GET")))
            .build();

        let hit = catalog
            .find("https://app.test/api/users/u-1/profile", "GET")
            .expect("should match");
        assert_eq!(hit.label(), "r1-any-method");
    }

    #[test]
    fn matching_is_deterministic_across_repeated_calls() {
        let catalog = ResponseCatalog::builder()
            .rule(rule("token", "oauth2/token", None))
            .rule(rule("profile", "/profile", Some("GET")))
            .build();

        for _ in 0..100 {
            let hit = catalog
                .find("https://auth.test/oauth2/token", "POST")
                .expect("should match");
            assert_eq!(hit.label(), "token");
        }
    }

    #[test]
    fn method_disambiguates_rules_on_the_same_url() {
        let catalog = ResponseCatalog::builder()
            .rule(rule("read", "/profile", Some("GET")))
            .rule(rule("update", "/profile", Some("PUT")))
            .build();

        let url = "https://app.test/api/users/u-1/profile";
        assert_eq!(catalog.find(url, "GET").unwrap().label(), "read");
        assert_eq!(catalog.find(url, "PUT").unwrap().label(), "update");
        assert!(catalog.find(url, "DELETE").is_none());
    }

    #[test]
    fn empty_catalog_matches_nothing() {
        let catalog = ResponseCatalog::builder().build();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.find("https://app.test/", "GET").is_none());
    }

    #[test]
    fn rules_preserve_registration_order() {
        let catalog = ResponseCatalog::builder()
            .rule(rule("a", "/a", None))
            .rule(rule("b", "/b", None))
            .rule(rule("c", "/c", None))
            .build();

        let labels: Vec<&str> = catalog.rules().iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(catalog.len(), 3);
    }
}
