//! Error types for video overlay operations

use thiserror::Error;

/// Result type alias for video overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Error types surfaced by the session, the player and processor construction
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image buffer errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A selection label that maps to no processor
    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),

    /// Vision processor could not be constructed
    #[error("Can not create image processor: {0}")]
    ProcessorCreation(String),

    /// Detection failed inside a processor
    #[error("Detection error: {0}")]
    Detection(String),

    /// Media player lifecycle or decoding errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// No async runtime available where one is required
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OverlayError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unknown processor error
    pub fn unknown_processor<S: Into<String>>(label: S) -> Self {
        Self::UnknownProcessor(label.into())
    }

    /// Create a new processor creation error
    pub fn processor_creation<S: Into<String>>(msg: S) -> Self {
        Self::ProcessorCreation(msg.into())
    }

    /// Create a new detection error
    pub fn detection<S: Into<String>>(msg: S) -> Self {
        Self::Detection(msg.into())
    }

    /// Create a new playback error
    pub fn playback<S: Into<String>>(msg: S) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a new runtime error
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create playback error naming the player operation and source
    pub fn playback_operation_error(operation: &str, source: Option<&str>, details: &str) -> Self {
        let source_context = match source {
            Some(uri) => format!(" (source: {})", uri),
            None => String::new(),
        };

        Self::Playback(format!(
            "Failed to {}{}: {}",
            operation, source_context, details
        ))
    }
}
