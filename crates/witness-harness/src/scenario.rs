//! The account-settings location verification scenario.
//!
//! One verification run: register the mock catalog against the session,
//! seed an auth token bundle into local storage, navigate to the settings
//! page, replace the stale birth location with new values, save, and wait
//! for the backend's standardized location to appear in the form -- all
//! without the real backend, whose three endpoints are served from the
//! catalog. Requests the catalog does not cover (static assets, the page
//! itself) pass through to the real server.

use std::path::PathBuf;
use std::time::Duration;

use witness_browser::{intercept, PageDriver};
use witness_mock::{MockRule, ResponseCatalog, RoutingInterceptor};

use crate::error::HarnessError;
use crate::fixtures::{
    ProfileReadResponse, ProfileUpdateResponse, TokenBundle, TokenRefreshResponse,
    DEFAULT_STORAGE_KEY,
};
use crate::poll::{poll_until, PollSpec};

/// CSS selectors for the elements the scenario touches.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub city: String,
    pub state: String,
    pub country: String,
    pub save_button: String,
    pub verified_location: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            city: "input[name=city]".to_string(),
            state: "input[name=state]".to_string(),
            country: "input[name=country]".to_string(),
            save_button: "button[type=submit]".to_string(),
            verified_location: "input[name=verifiedLocation]".to_string(),
        }
    }
}

/// Configuration for one location verification run.
///
/// Every wait bound is explicit and overridable; nothing in the run sleeps
/// on a hidden default.
#[derive(Debug, Clone)]
pub struct LocationScenario {
    /// Application origin, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Path of the settings page under test.
    pub settings_path: String,
    /// User the mocked backend answers for.
    pub user_id: String,
    /// Local storage key the token bundle is seeded under.
    pub storage_key: String,
    /// Elements the run fills, clicks, and reads.
    pub selectors: Selectors,
    /// Heading text that marks the settings page as rendered.
    pub heading_text: String,
    /// Location values typed into the form.
    pub city: String,
    pub state: String,
    pub country: String,
    /// Standardized location the mocked update returns and the form must
    /// eventually display.
    pub expected_location: String,
    /// Bound on each page load.
    pub load_timeout: Duration,
    /// Bounds on DOM-state polls (heading, verified location).
    pub poll: PollSpec,
    /// Where to write the final screenshot, if anywhere.
    pub screenshot_path: Option<PathBuf>,
}

impl LocationScenario {
    /// A scenario against the given application origin, with the canonical
    /// Paris fixture values.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            settings_path: "/account-settings".to_string(),
            user_id: "test-user-001".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            selectors: Selectors::default(),
            heading_text: "Account Settings".to_string(),
            city: "Paris".to_string(),
            state: "Ile-de-France".to_string(),
            country: "France".to_string(),
            expected_location: "Paris, Île-de-France, France".to_string(),
            load_timeout: Duration::from_secs(15),
            poll: PollSpec::default(),
            screenshot_path: None,
        }
    }

    /// Write the final screenshot to this path.
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = Some(path.into());
        self
    }

    /// Override the DOM-state poll bounds.
    pub fn with_poll(mut self, poll: PollSpec) -> Self {
        self.poll = poll;
        self
    }

    /// The URL of the settings page.
    pub fn settings_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.settings_path
        )
    }

    /// Build the three-rule catalog this scenario serves its backend from.
    ///
    /// Rule order is priority order: the token endpoint first (any method),
    /// then the profile read and update. Everything else passes through.
    pub fn catalog(&self) -> Result<ResponseCatalog, HarnessError> {
        let profile_path = format!("/api/users/{}/profile", self.user_id);

        let token_refresh = MockRule::builder("token-refresh")
            .match_substring("oauth2/token")
            .status(200)
            .json_body(&serde_json::to_value(TokenRefreshResponse::fixture())?)
            .build()?;

        let profile_read = MockRule::builder("profile-read")
            .match_substring(&profile_path)
            .method("GET")
            .status(200)
            .json_body(&serde_json::to_value(ProfileReadResponse::fixture(
                &self.user_id,
            ))?)
            .build()?;

        let profile_update = MockRule::builder("profile-update")
            .match_substring(&profile_path)
            .method("PUT")
            .status(200)
            .json_body(&serde_json::to_value(ProfileUpdateResponse::fixture(
                &self.user_id,
                &self.expected_location,
            ))?)
            .build()?;

        Ok(ResponseCatalog::builder()
            .rule(token_refresh)
            .rule(profile_read)
            .rule(profile_update)
            .build())
    }

    /// Execute the verification run against a connected page driver.
    pub async fn run(&self, driver: &PageDriver) -> Result<ScenarioReport, HarnessError> {
        // Interception must be live before the first navigation.
        let catalog = self.catalog()?;
        let interceptor = RoutingInterceptor::new(catalog);
        let _interception = intercept::register(driver.client().clone(), interceptor).await?;

        // Land on the origin so local storage belongs to the right site,
        // then seed the token bundle the settings page requires.
        driver.goto(&self.base_url, self.load_timeout).await?;
        let bundle = TokenBundle::fixture(&self.user_id);
        driver
            .set_local_storage(&self.storage_key, &serde_json::to_string(&bundle)?)
            .await?;

        driver.goto(&self.settings_url(), self.load_timeout).await?;

        // The page is rendered once its heading is visible.
        let heading = self.heading_text.as_str();
        poll_until(self.poll, &format!("heading {heading:?} to appear"), || {
            async move {
                Ok(driver.body_text().await?.contains(heading))
            }
        })
        .await?;

        tracing::info!(url = %self.settings_url(), "settings page rendered, filling form");

        driver.fill(&self.selectors.city, &self.city).await?;
        driver.fill(&self.selectors.state, &self.state).await?;
        driver.fill(&self.selectors.country, &self.country).await?;
        driver.click(&self.selectors.save_button).await?;

        // The save triggers the mocked PUT; the page then renders the
        // standardized location from the canned response.
        let expected = self.expected_location.as_str();
        let selector = self.selectors.verified_location.as_str();
        poll_until(
            self.poll,
            &format!("verified location to equal {expected:?}"),
            || async move {
                Ok(driver.input_value(selector).await?.as_deref() == Some(expected))
            },
        )
        .await?;

        tracing::info!(location = expected, "verified location confirmed");

        let screenshot = match &self.screenshot_path {
            Some(path) => {
                let png = driver.screenshot().await?;
                tokio::fs::write(path, &png)
                    .await
                    .map_err(|source| HarnessError::Screenshot {
                        path: path.clone(),
                        source,
                    })?;
                tracing::info!(path = %path.display(), bytes = png.len(), "screenshot written");
                Some(path.clone())
            }
            None => None,
        };

        Ok(ScenarioReport {
            verified_location: self.expected_location.clone(),
            screenshot,
        })
    }
}

/// What a completed verification run produced.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// The standardized location the form displayed.
    pub verified_location: String,
    /// Path of the captured screenshot, when one was requested.
    pub screenshot: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_mock::{FulfillmentDecision, RequestView};

    fn scenario() -> LocationScenario {
        LocationScenario::new("http://localhost:3000")
    }

    #[test]
    fn settings_url_joins_base_and_path() {
        assert_eq!(
            scenario().settings_url(),
            "http://localhost:3000/account-settings"
        );
        let trailing = LocationScenario::new("http://localhost:3000/");
        assert_eq!(
            trailing.settings_url(),
            "http://localhost:3000/account-settings"
        );
    }

    #[test]
    fn catalog_has_three_rules_in_priority_order() {
        let catalog = scenario().catalog().expect("catalog should build");
        let labels: Vec<&str> = catalog.rules().iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["token-refresh", "profile-read", "profile-update"]);
    }

    #[test]
    fn token_rule_matches_any_method() {
        let catalog = scenario().catalog().expect("catalog should build");
        for method in ["GET", "POST", "PUT"] {
            let rule = catalog
                .find("https://auth.example.test/oauth2/token", method)
                .expect("token rule should match");
            assert_eq!(rule.label(), "token-refresh");
        }
    }

    #[test]
    fn profile_rules_split_on_method() {
        let catalog = scenario().catalog().expect("catalog should build");
        let url = "http://localhost:3000/api/users/test-user-001/profile";

        let read = catalog.find(url, "GET").expect("GET should match");
        assert_eq!(read.label(), "profile-read");
        assert_eq!(read.status(), 200);
        assert!(read.body().contains("Old City"));

        let update = catalog.find(url, "PUT").expect("PUT should match");
        assert_eq!(update.label(), "profile-update");
        assert!(update.body().contains("Paris, Île-de-France, France"));
        assert!(update.body().contains("Profile updated successfully"));
    }

    #[test]
    fn unrelated_requests_pass_through() {
        let catalog = scenario().catalog().expect("catalog should build");
        let interceptor = RoutingInterceptor::new(catalog);

        let decision = interceptor.decide(RequestView {
            url: "http://localhost:3000/static/logo.png",
            method: "GET",
        });
        assert_eq!(decision, FulfillmentDecision::PassThrough);

        let decision = interceptor.decide(RequestView {
            url: "http://localhost:3000/api/users/someone-else/profile",
            method: "GET",
        });
        assert_eq!(decision, FulfillmentDecision::PassThrough);
    }

    #[test]
    fn mock_bodies_are_json() {
        let catalog = scenario().catalog().expect("catalog should build");
        for rule in catalog.rules() {
            assert_eq!(rule.content_type(), "application/json");
            let parsed: Result<serde_json::Value, _> = serde_json::from_str(rule.body());
            assert!(parsed.is_ok(), "rule {} body should be JSON", rule.label());
        }
    }
}
