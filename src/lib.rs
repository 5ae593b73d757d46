//! airwrite - air-writing recognition core
//!
//! Hand landmark frames in, letters, words and a conversation log out.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conversation;
pub mod defaults;
pub mod error;
pub mod gesture;
pub mod landmark;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod recognition;
pub mod session;
pub mod stroke;
pub mod word;

// Composition root
#[cfg(feature = "cli")]
pub mod app;

// Core traits (source → process → classifier)
pub use landmark::LandmarkSource;
pub use recognition::LetterClassifier;

// Pipeline
pub use pipeline::{Command, Pipeline, PipelineConfig, PipelineController, PipelineEvent, PipelineHandle, Snapshot};

// Error handling
pub use error::{AirwriteError, Result};

// Config
pub use config::Config;

// Station framework
pub use pipeline::{ErrorReporter, Station, StationError};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        assert!(version_string().starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        match option_env!("GIT_HASH") {
            Some(hash) if !hash.is_empty() => assert_eq!(ver.split('+').nth(1), Some(hash)),
            _ => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
