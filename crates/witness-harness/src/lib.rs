//! Verification-run orchestration for the Witness harness.
//!
//! Ties the mock catalog and the browser driver together into a complete
//! verification run: register interception, seed auth state, navigate,
//! fill the form under test, await the asserted DOM state with a bounded
//! poll, and capture a screenshot.
//!
//! # Overview
//!
//! - [`PollSpec`] / [`poll_until`]: the bounded polling contract -- poll a
//!   condition at an explicit interval for at most an explicit duration,
//!   failing with a named timeout error
//! - [`fixtures`]: the auth token bundle and canned wire payloads served
//!   by the mock rules
//! - [`LocationScenario`]: the account-settings location verification run

pub mod error;
pub mod fixtures;
pub mod poll;
pub mod scenario;

pub use error::HarnessError;
pub use poll::{poll_until, PollSpec};
pub use scenario::{LocationScenario, ScenarioReport, Selectors};
