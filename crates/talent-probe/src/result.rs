//! Result and error types for talent-probe.
//!
//! Every variant names the condition that was not met, so a failing scenario
//! can be localized from its message alone.

use std::fmt;
use thiserror::Error;

/// Result type for harness operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Why a locator could not be resolved to a single element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Nothing matched within the wait bound
    Missing,
    /// More than one element matched a strict locator
    Ambiguous(usize),
    /// Present but never became visible within the wait bound
    Hidden,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no matching element"),
            Self::Ambiguous(n) => write!(f, "{n} elements matched a strict locator"),
            Self::Hidden => write!(f, "present but not visible"),
        }
    }
}

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A page's load verification never held within the bound
    #[error("{page} did not load within {waited_ms}ms: {condition}")]
    LoadTimeout {
        /// Page abstraction name
        page: String,
        /// The unmet condition
        condition: String,
        /// Time spent polling
        waited_ms: u64,
    },

    /// A required locator resolved to zero, ambiguous or hidden matches
    #[error("{what} not found ({reason}): {locator}")]
    ElementNotFound {
        /// Semantic name of the element (e.g. "drag source")
        what: String,
        /// Rendered locator
        locator: String,
        /// Missing, ambiguous or hidden
        reason: NotFoundReason,
    },

    /// A drag source or target had no measurable bounding box
    #[error("Geometry unavailable for {what}")]
    GeometryUnavailable {
        /// Which side of the drag failed
        what: String,
    },

    /// Seed data cannot exercise the scenario; reported as a skip
    #[error("Precondition unmet: {reason}")]
    PreconditionUnmet {
        /// Why the scenario cannot run
        reason: String,
    },

    /// Element stayed invisible for the whole wait
    #[error("Element not visible after {waited_ms}ms: {locator}")]
    ElementNotVisible {
        /// Rendered locator
        locator: String,
        /// Time spent polling
        waited_ms: u64,
    },

    /// Current URL never matched the expected pattern
    #[error("URL mismatch: expected {expected}, got {actual}")]
    UrlMismatch {
        /// Expected pattern
        expected: String,
        /// Last observed URL
        actual: String,
    },

    /// Element text never matched
    #[error("Text mismatch on {locator}: expected {expected:?}, got {actual:?}")]
    TextMismatch {
        /// Rendered locator
        locator: String,
        /// Expected text (exact or contained)
        expected: String,
        /// Last observed text
        actual: String,
    },

    /// A count assertion failed
    #[error("Count mismatch for {what}: expected {expected}, got {actual}")]
    CountMismatch {
        /// What was counted
        what: String,
        /// Expected count
        expected: usize,
        /// Observed count
        actual: usize,
    },

    /// A generic assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// A stage move did not conserve candidates
    #[error("Conservation violated: {message}")]
    ConservationViolated {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Driver-level failure (CDP call, script evaluation, input dispatch)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms: {what}")]
    Timeout {
        /// What was being waited on
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::PreconditionUnmet {
            reason: reason.into(),
        }
    }

    /// Whether this error reflects environment state rather than a defect
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionUnmet { .. })
    }
}
