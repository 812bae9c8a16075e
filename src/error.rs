//! Error types for hawkeye.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HawkeyeError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // External decoder errors
    #[error("Decoder not found: {tool}")]
    DecoderNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    DecoderFailed { tool: String, message: String },

    #[error("{tool} did not finish within {timeout_secs}s")]
    DecoderTimeout { tool: String, timeout_secs: u64 },

    // Audio errors
    #[error("Unsupported audio format: {message}")]
    AudioFormat { message: String },

    #[error("Failed to read audio: {message}")]
    AudioRead { message: String },

    // Output directories
    #[error("Cannot prepare output directory {path}: {message}")]
    OutputDir { path: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HawkeyeError>;
