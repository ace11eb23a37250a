//! Processor selection and construction
//!
//! Maps the user-facing selection label to a [`ProcessorKind`] and its options
//! bundle, and (re)creates the vision processor through an injected
//! [`ProcessorFactory`]. Construction failures never escape: they are logged,
//! shown to the user, and leave the pacer without a processor.

use crate::{
    error::{OverlayError, Result},
    pacer::{FramePacer, SubmitOutcome},
    services::{NotificationLevel, Notifier},
    vision::VisionProcessor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Label of the face detection processor
pub const FACE_DETECTION: &str = "Face Detection";

/// Label of the pose detection processor
pub const POSE_DETECTION: &str = "Pose Detection";

/// Processor kinds selectable by the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorKind {
    FaceDetection,
    PoseDetection,
}

impl ProcessorKind {
    /// All kinds, in selector order
    pub const ALL: [ProcessorKind; 2] = [Self::FaceDetection, Self::PoseDetection];

    /// User-facing label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::FaceDetection => FACE_DETECTION,
            Self::PoseDetection => POSE_DETECTION,
        }
    }

    /// Parse a user-facing label
    ///
    /// # Errors
    /// - `OverlayError::UnknownProcessor` for labels that map to no processor
    pub fn from_label(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == label)
            .ok_or_else(|| OverlayError::unknown_processor(label))
    }
}

impl Default for ProcessorKind {
    fn default() -> Self {
        Self::FaceDetection
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Speed/accuracy trade-off of the face detector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacePerformanceMode {
    Fast,
    Accurate,
}

/// Pose detector options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PoseOptions {
    /// Stream mode tracks the pose across consecutive frames
    pub stream_mode: bool,
    /// Use the more accurate (slower) model
    pub accurate: bool,
    pub show_in_frame_likelihood: bool,
    pub visualize_z: bool,
    pub rescale_z_for_visualization: bool,
    pub run_classification: bool,
}

impl Default for PoseOptions {
    fn default() -> Self {
        Self {
            stream_mode: true,
            accurate: false,
            show_in_frame_likelihood: true,
            visualize_z: true,
            rescale_z_for_visualization: true,
            run_classification: false,
        }
    }
}

/// Face detector options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceOptions {
    pub performance_mode: FacePerformanceMode,
    pub detect_landmarks: bool,
    pub detect_contours: bool,
    pub run_classification: bool,
    /// Smallest face to detect, relative to the image width (0.0-1.0)
    pub min_face_size: f32,
    pub enable_tracking: bool,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            performance_mode: FacePerformanceMode::Fast,
            detect_landmarks: false,
            detect_contours: false,
            run_classification: false,
            min_face_size: 0.1,
            enable_tracking: false,
        }
    }
}

/// Options bundle for all processor kinds
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorOptions {
    #[serde(default)]
    pub pose: PoseOptions,
    #[serde(default)]
    pub face: FaceOptions,
}

impl ProcessorOptions {
    /// Validate option ranges
    ///
    /// # Errors
    /// - `OverlayError::InvalidConfig` for an out-of-range minimum face size
    pub fn validate(&self) -> Result<()> {
        let size = self.face.min_face_size;
        if !(0.0..=1.0).contains(&size) || size.is_nan() {
            return Err(OverlayError::config_value_error(
                "min_face_size",
                size,
                "0.0-1.0",
                Some(0.1),
            ));
        }
        Ok(())
    }
}

/// Everything a factory needs to build one processor
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessorConfig {
    pub kind: ProcessorKind,
    pub options: ProcessorOptions,
}

impl ProcessorConfig {
    /// Create a new processor configuration builder
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }
}

/// Builder for `ProcessorConfig`
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProcessorConfig::default(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ProcessorKind) -> Self {
        self.config.kind = kind;
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

    #[must_use]
    pub fn min_face_size(mut self, size: f32) -> Self {
        self.config.options.face.min_face_size = size;
        self
    }

    /// Build the processor configuration
    ///
    /// # Errors
    /// - Option validation failures
    pub fn build(self) -> Result<ProcessorConfig> {
        self.config.options.validate()?;
        Ok(self.config)
    }
}

impl Default for ProcessorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory trait for creating vision processors
pub trait ProcessorFactory: Send + Sync {
    /// Create a processor of the given kind
    ///
    /// # Errors
    ///
    /// Returns `OverlayError` for:
    /// - Unsupported processor kinds
    /// - Model loading failures
    /// - Missing runtime or hardware support
    fn create_processor(
        &self,
        kind: ProcessorKind,
        options: &ProcessorOptions,
    ) -> Result<Box<dyn VisionProcessor>>;

    /// List processor kinds this factory can build
    fn available_processors(&self) -> Vec<ProcessorKind>;
}

/// Default processor factory implementation
pub struct DefaultProcessorFactory;

impl ProcessorFactory for DefaultProcessorFactory {
    fn create_processor(
        &self,
        kind: ProcessorKind,
        _options: &ProcessorOptions,
    ) -> Result<Box<dyn VisionProcessor>> {
        // Detection models live with the host; it must inject its own factory
        Err(OverlayError::invalid_config(format!(
            "{} processor not available in core. Must be injected by the host.",
            kind
        )))
    }

    fn available_processors(&self) -> Vec<ProcessorKind> {
        vec![]
    }
}

/// Selects and (re)creates the active vision processor
pub struct ProcessorSelector {
    config: ProcessorConfig,
    factory: Box<dyn ProcessorFactory>,
    notifier: Arc<dyn Notifier>,
    last_error: Option<String>,
}

impl ProcessorSelector {
    #[must_use]
    pub fn new(
        config: ProcessorConfig,
        factory: Box<dyn ProcessorFactory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            factory,
            notifier,
            last_error: None,
        }
    }

    /// Currently selected kind
    #[must_use]
    pub fn selected(&self) -> ProcessorKind {
        self.config.kind
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Message of the last construction failure, cleared on success
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn available_processors(&self) -> Vec<ProcessorKind> {
        self.factory.available_processors()
    }

    /// Tear down the current processor and create one for the selected kind
    ///
    /// Returns whether a processor is installed afterwards. Failures are
    /// logged and reported through the notifier; there is no retry.
    #[instrument(skip(self, pacer), fields(kind = %self.config.kind))]
    pub fn create_processor(&mut self, pacer: &mut FramePacer) -> bool {
        pacer.stop_processor();

        match self
            .factory
            .create_processor(self.config.kind, &self.config.options)
        {
            Ok(processor) => {
                info!(processor = %processor.name(), "Vision processor created");
                pacer.install_processor(processor);
                self.last_error = None;
                true
            },
            Err(e) => {
                let failure = OverlayError::processor_creation(e.to_string());
                error!(kind = %self.config.kind, error = %e, "{}", failure);
                self.notifier
                    .notify(NotificationLevel::Error, &failure.to_string());
                self.last_error = Some(e.to_string());
                false
            },
        }
    }

    /// Switch to the processor behind `label` and run it on the last frame
    ///
    /// # Errors
    /// - `OverlayError::UnknownProcessor` for unknown labels; nothing changes
    pub fn select(&mut self, label: &str, pacer: &mut FramePacer) -> Result<Option<SubmitOutcome>> {
        let kind = ProcessorKind::from_label(label)?;
        self.config.kind = kind;
        self.create_processor(pacer);
        Ok(pacer.resubmit_last_frame())
    }
}
