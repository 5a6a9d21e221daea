//! Error types for the harness crate.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during a verification run.
///
/// Everything here terminates the run; there is no partial-success mode.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A polled condition did not hold within its bounded duration.
    #[error("timed out after {waited:?} waiting for: {expected}")]
    WaitTimeout {
        /// What was being awaited, for the failure report.
        expected: String,
        /// The bounded duration that elapsed.
        waited: Duration,
    },

    /// An error from the browser driver.
    #[error("browser error: {0}")]
    Browser(#[from] witness_browser::BrowserError),

    /// A mock rule or catalog was malformed.
    #[error("mock configuration error: {0}")]
    Catalog(#[from] witness_mock::CatalogError),

    /// A fixture could not be serialized for injection into the page.
    #[error("fixture serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The screenshot could not be written to disk.
    #[error("failed to write screenshot to {path}: {source}")]
    Screenshot {
        path: PathBuf,
        source: std::io::Error,
    },
}
