//! Configuration types for video overlay sessions

use crate::{
    error::{OverlayError, Result},
    frame::MAX_FRAME_SIDE,
    pacer::PacerConfig,
    processor::{
        FaceOptions, PoseOptions, ProcessorConfig, ProcessorKind, ProcessorOptions, FACE_DETECTION,
    },
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a video overlay session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Label of the processor created on resume
    pub processor: String,

    /// Mirror the overlay horizontally (front camera style sources)
    pub mirrored: bool,

    /// Scale decoded frames so their larger side matches this size
    /// (None = keep the source size)
    pub desired_frame_size: Option<u32>,

    /// Options handed to the processor factory
    pub options: ProcessorOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            processor: FACE_DETECTION.to_string(),
            mirrored: false,
            desired_frame_size: None,
            options: ProcessorOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use vision_overlay::SessionConfig;
    ///
    /// let config = SessionConfig::builder()
    ///     .processor("Pose Detection")
    ///     .desired_frame_size(720)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.desired_frame_size, Some(720));
    /// ```
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Parse a JSON configuration and validate it
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// - `OverlayError::InvalidConfig` for malformed JSON or invalid values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| OverlayError::invalid_config(format!("Malformed session config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    ///
    /// # Errors
    /// - `OverlayError::Io` when the file cannot be read
    /// - Parse and validation failures as in [`SessionConfig::from_json_str`]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// - `OverlayError::Internal` when serialization fails
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OverlayError::internal(format!("Failed to serialize session config: {}", e)))
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// - `OverlayError::UnknownProcessor` for an unknown processor label
    /// - `OverlayError::InvalidConfig` for out-of-range values
    pub fn validate(&self) -> Result<()> {
        ProcessorKind::from_label(&self.processor)?;

        if let Some(size) = self.desired_frame_size {
            if size == 0 || size > MAX_FRAME_SIDE {
                return Err(OverlayError::config_value_error(
                    "desired frame size",
                    size,
                    &format!("1-{}", MAX_FRAME_SIDE),
                    Some(720),
                ));
            }
        }

        self.options.validate()
    }

    /// Processor selection derived from this configuration
    ///
    /// # Errors
    /// - `OverlayError::UnknownProcessor` for an unknown processor label
    pub fn processor_config(&self) -> Result<ProcessorConfig> {
        Ok(ProcessorConfig {
            kind: ProcessorKind::from_label(&self.processor)?,
            options: self.options.clone(),
        })
    }

    #[must_use]
    pub fn pacer_config(&self) -> PacerConfig {
        PacerConfig {
            mirrored: self.mirrored,
        }
    }
}

/// Builder for `SessionConfig`
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    /// Set the initial processor by label
    #[must_use]
    pub fn processor<S: Into<String>>(mut self, label: S) -> Self {
        self.config.processor = label.into();
        self
    }

    /// Set the initial processor by kind
    #[must_use]
    pub fn processor_kind(mut self, kind: ProcessorKind) -> Self {
        self.config.processor = kind.label().to_string();
        self
    }

    #[must_use]
    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.config.mirrored = mirrored;
        self
    }

    #[must_use]
    pub fn desired_frame_size(mut self, size: u32) -> Self {
        self.config.desired_frame_size = Some(size);
        self
    }

    #[must_use]
    pub fn pose_options(mut self, pose: PoseOptions) -> Self {
        self.config.options.pose = pose;
        self
    }

    #[must_use]
    pub fn face_options(mut self, face: FaceOptions) -> Self {
        self.config.options.face = face;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Validation failures from [`SessionConfig::validate`]
    pub fn build(self) -> Result<SessionConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
