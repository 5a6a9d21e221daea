//! Request matchers: declarative predicates over an outgoing request.
//!
//! A rule carries a list of matchers that are combined with logical AND.
//! Each matcher constrains one dimension of the request; a rule with no
//! method matcher accepts any method, and [`Matcher::Any`] accepts every
//! request outright.

/// A single predicate over an outgoing request's URL and method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Accepts when the request URL contains this substring.
    Substring(String),
    /// Accepts when the request URL equals this string exactly.
    Exact(String),
    /// Accepts when the request method equals this one (case-insensitive).
    MethodEquals(String),
    /// Accepts every request.
    Any,
}

impl Matcher {
    /// Check whether this matcher accepts the given request.
    pub fn accepts(&self, url: &str, method: &str) -> bool {
        match self {
            Matcher::Substring(needle) => url.contains(needle.as_str()),
            Matcher::Exact(expected) => url == expected,
            Matcher::MethodEquals(expected) => method.eq_ignore_ascii_case(expected),
            Matcher::Any => true,
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Substring(s) => write!(f, "url contains {s:?}"),
            Matcher::Exact(s) => write!(f, "url == {s:?}"),
            Matcher::MethodEquals(m) => write!(f, "method == {m}"),
            Matcher::Any => write!(f, "any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_accepts_containing_url() {
        let m = Matcher::Substring("oauth2/token".into());
        assert!(m.accepts("https://auth.test/oauth2/token", "POST"));
        assert!(m.accepts("https://auth.test/oauth2/token?grant=refresh", "GET"));
    }

    #[test]
    fn substring_rejects_other_url() {
        let m = Matcher::Substring("oauth2/token".into());
        assert!(!m.accepts("https://auth.test/oauth2/authorize", "POST"));
    }

    #[test]
    fn exact_requires_full_url() {
        let m = Matcher::Exact("https://app.test/api/health".into());
        assert!(m.accepts("https://app.test/api/health", "GET"));
        assert!(!m.accepts("https://app.test/api/health?verbose=1", "GET"));
    }

    #[test]
    fn method_equals_is_case_insensitive() {
        let m = Matcher::MethodEquals("GET".into());
        assert!(m.accepts("https://app.test/x", "GET"));
        assert!(m.accepts("https://app.test/x", "get"));
        assert!(!m.accepts("https://app.test/x", "PUT"));
    }

    #[test]
    fn any_accepts_everything() {
        let m = Matcher::Any;
        assert!(m.accepts("", ""));
        assert!(m.accepts("https://anywhere.test", "DELETE"));
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(
            Matcher::Substring("profile".into()).to_string(),
            "url contains \"profile\""
        );
        assert_eq!(Matcher::MethodEquals("PUT".into()).to_string(), "method == PUT");
        assert_eq!(Matcher::Any.to_string(), "any");
    }
}
