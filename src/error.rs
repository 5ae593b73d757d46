//! Error types for airwrite.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirwriteError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Landmark source errors
    #[error("Landmark source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Landmark source read failed: {message}")]
    SourceRead { message: String },

    #[error("Invalid landmark frame on line {line}: {message}")]
    FrameParse { line: usize, message: String },

    // Recognition errors
    #[error("Letter classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("Invalid template set: {message}")]
    TemplateParse { message: String },

    // Pipeline errors
    #[error("Pipeline is not running")]
    PipelineStopped,

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AirwriteError>;
