//! Error types and reporting for pipeline stations.

use std::fmt;
use tracing::{error, warn};

/// Errors that can occur during station processing.
#[derive(Debug, Clone)]
pub enum StationError {
    /// Recoverable error that allows the station to continue processing.
    Recoverable(String),
    /// Fatal error that requires the station to shut down.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a station.
    fn report(&self, station: &str, error: &StationError);
}

/// Error reporter that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        match error {
            StationError::Recoverable(msg) => warn!(station, "{}", msg),
            StationError::Fatal(msg) => error!(station, "{}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_error_display() {
        let recoverable = StationError::Recoverable("event channel full".to_string());
        assert_eq!(
            recoverable.to_string(),
            "Recoverable error: event channel full"
        );

        let fatal = StationError::Fatal("session lost".to_string());
        assert_eq!(fatal.to_string(), "Fatal error: session lost");
    }

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        reporter.report("Controller", &StationError::Recoverable("test".to_string()));
        reporter.report("Controller", &StationError::Fatal("test".to_string()));
    }
}
