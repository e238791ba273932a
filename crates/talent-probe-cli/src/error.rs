//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Harness library error
    #[error("{0}")]
    Probe(#[from] talent_probe::ProbeError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// At least one scenario failed
    #[error("{failed} of {total} scenario(s) failed")]
    ScenariosFailed {
        /// Failed scenarios
        failed: usize,
        /// Scenarios run
        total: usize,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenarios_failed_message() {
        let err = CliError::ScenariosFailed { failed: 2, total: 7 };
        assert_eq!(err.to_string(), "2 of 7 scenario(s) failed");
    }

    #[test]
    fn test_probe_error_passes_through() {
        let err: CliError = talent_probe::ProbeError::precondition("no seed").into();
        assert!(err.to_string().contains("no seed"));
    }
}
