//! Canned boundary data for verification runs.
//!
//! Two kinds of fixture live here: the auth token bundle the run seeds
//! into local storage before navigating, and the wire payloads the mock
//! rules serve in place of the real backend. Field names are part of the
//! wire contract and must serialize exactly as the application expects.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use base64::Engine as _;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Local storage key the application reads its token bundle from.
pub const DEFAULT_STORAGE_KEY: &str = "auth_tokens";

/// The token bundle the page under test expects in local storage.
///
/// `expires_at` is epoch milliseconds; the fixture constructor picks a
/// value far enough in the future that no run can see it expire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl TokenBundle {
    /// Build a token bundle for the given user.
    ///
    /// The id token is a syntactically valid signed-token shape (three
    /// base64url segments, JSON header and claims) with a fake signature.
    pub fn fixture(user_id: &str) -> Self {
        Self {
            id_token: fake_signed_token(user_id, "test@example.com"),
            access_token: "test-access-token".to_string(),
            refresh_token: "test-refresh-token".to_string(),
            expires_at: (Utc::now() + ChronoDuration::days(3650)).timestamp_millis(),
        }
    }
}

/// Construct a syntactically valid (if fake) signed token.
///
/// Header and claims are real JSON, base64url-encoded without padding;
/// the signature segment is fake but well-formed. Consumers that split on
/// dots and decode segments will succeed, which is all a verification run
/// needs from it.
pub fn fake_signed_token(subject: &str, email: &str) -> String {
    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let claims = serde_json::json!({
        "sub": subject,
        "email": email,
        "email_verified": true,
    });

    format!(
        "{}.{}.{}",
        B64URL.encode(header.to_string()),
        B64URL.encode(claims.to_string()),
        B64URL.encode(b"witness-test-signature"),
    )
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Token refresh response served for any request to the token endpoint.
///
/// Unlike the rest of the API this endpoint speaks snake_case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRefreshResponse {
    pub id_token: String,
    pub access_token: String,
    /// Lifetime of the fresh token, in seconds.
    pub expires_in: u64,
}

impl TokenRefreshResponse {
    pub fn fixture() -> Self {
        Self {
            id_token: "refreshed-id-token".to_string(),
            access_token: "refreshed-access-token".to_string(),
            expires_in: 3600,
        }
    }
}

/// The nested birth profile inside a profile read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BirthProfile {
    pub birth_name: String,
    pub birth_date: String,
    pub birth_city: String,
    pub birth_state: String,
    pub birth_country: String,
}

/// Profile read response served for the GET profile rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReadResponse {
    pub user_id: String,
    pub created_at: String,
    pub email: String,
    pub profile: BirthProfile,
    pub onboarding_completed: bool,
}

impl ProfileReadResponse {
    /// The pre-update profile: stale location values the run will replace.
    pub fn fixture(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: "2024-01-15T00:00:00Z".to_string(),
            email: "test@example.com".to_string(),
            profile: BirthProfile {
                birth_name: "Jane Doe".to_string(),
                birth_date: "1995-05-20".to_string(),
                birth_city: "Old City".to_string(),
                birth_state: "Old State".to_string(),
                birth_country: "Old Country".to_string(),
            },
            onboarding_completed: true,
        }
    }
}

/// Profile update response served for the PUT profile rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub profile: UpdatedProfile,
}

/// Envelope inside a profile update response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfile {
    pub user_id: String,
    pub profile: StandardizedLocation,
}

/// The geocoded location returned by a profile update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedLocation {
    pub standardized_location_name: String,
}

impl ProfileUpdateResponse {
    pub fn fixture(user_id: &str, standardized_location: &str) -> Self {
        Self {
            message: "Profile updated successfully".to_string(),
            profile: UpdatedProfile {
                user_id: user_id.to_string(),
                profile: StandardizedLocation {
                    standardized_location_name: standardized_location.to_string(),
                },
            },
        }
    }
}
