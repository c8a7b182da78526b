// Error types for storefront-e2e

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for suite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the fixture, page objects, report sink and API client.
///
/// Assertion failures are not represented here: they are panics from
/// `assert!` and travel through [`crate::Evidence::verify`] unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Playwright driver or browser could not be started
    ///
    /// Fatal for the test: nothing ran, so no evidence exists.
    #[error("Failed to launch browser session: {0}")]
    Launch(#[source] playwright_rs::Error),

    /// A browser operation failed after launch (missing element, timeout, closed target)
    #[error("Browser operation failed: {0}")]
    Browser(#[from] playwright_rs::Error),

    /// HTTP transport error talking to the API under test
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (video directory, report files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session closed without leaving a recording behind
    #[error("No video recording found in '{}'", dir.display())]
    MissingVideo { dir: PathBuf },

    /// An environment variable or builder value could not be used
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

impl Error {
    /// Whether the automation itself broke (browser or HTTP transport),
    /// as opposed to the system under test answering wrongly.
    ///
    /// Used to report `broken` rather than `failed` for a case.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Error::Browser(_) | Error::Launch(_) | Error::Http(_))
    }
}
