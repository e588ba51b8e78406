//! Error types for hh-pilot
//!
//! This module provides the error type hierarchy using `thiserror`,
//! plus the classification used to tell "the user closed the page"
//! apart from failures that should abort the run.

use thiserror::Error;

/// The main error type for hh-pilot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Application workflow errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// The page or browser was closed while an operation was in flight
    #[error("Page closed")]
    PageClosed,
}

/// Navigation errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation timeout
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Errors raised while driving the application workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Element not found on the page
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The response modal did not appear in time
    #[error("Response modal did not appear within {0}ms")]
    ModalTimeout(u64),

    /// The cover letter field did not contain the expected message
    #[error("Cover letter verification failed: expected {expected} chars, found {actual} chars")]
    LetterMismatch {
        /// Length of the configured message
        expected: usize,
        /// Length of the value actually present in the field
        actual: usize,
    },

    /// JavaScript evaluation failed
    #[error("JavaScript execution failed: {0}")]
    JsExecutionFailed(String),
}

/// Result type alias for hh-pilot operations
pub type Result<T> = std::result::Result<T, Error>;

/// CDP error fragments that indicate the target (tab or browser) is gone.
///
/// chromiumoxide surfaces tab closure as ordinary command failures, so the
/// distinction between "the user closed the page" and a real fault is made
/// by inspecting the message.
const CLOSED_MARKERS: &[&str] = &[
    "target closed",
    "session closed",
    "session with given id not found",
    "no target with given id",
    "not attached to an active page",
    "channel closed",
    "oneshot canceled",
    "connection closed",
    "browser has been closed",
];

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }

    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Whether this error means the page or browser was closed underneath us.
    ///
    /// Closed-page errors end the run gracefully (exit 0) instead of being
    /// reported as failures.
    pub fn is_page_closed(&self) -> bool {
        match self {
            Error::Browser(BrowserError::PageClosed) => true,
            Error::Cdp(msg) => {
                let lower = msg.to_lowercase();
                CLOSED_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
