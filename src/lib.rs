#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Vision Overlay
//!
//! Video playback with machine-learning overlays. Decoded frames are handed
//! to a vision processor (pose or face detection) whose results are drawn on
//! an overlay aligned with the video.
//!
//! The heart of the crate is the [`FramePacer`]: processors are much slower
//! than the video frame rate, so at most one frame is in flight and only the
//! newest frame that arrived meanwhile is processed next. Everything in
//! between is dropped, which keeps the overlay close to what is on screen.
//!
//! ## Features
//!
//! - **Single-flight pacing**: latest-wins coalescing, no queue
//! - **Processor selection**: face and pose detection through an injected
//!   [`ProcessorFactory`], with user notification when construction fails
//! - **Playback lifecycle**: load, pause and release through [`MediaPlayer`]
//! - **Detector adapter**: run any synchronous [`Detector`] on the tokio
//!   blocking pool via [`DetectorProcessor`]
//! - **FFmpeg player**: decode local files at playback speed
//!   (`video-support` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vision_overlay::{
//!     Annotations, DetectorProcessor, Detector, Frame, LogNotifier, ProcessorFactory,
//!     ProcessorKind, ProcessorOptions, SessionConfig, SharedOverlay, VideoSession,
//!     VisionProcessor, MediaPlayer,
//! };
//!
//! struct NoFaces;
//!
//! impl Detector for NoFaces {
//!     fn detect(&mut self, frame: &Frame) -> vision_overlay::Result<Annotations> {
//!         Ok(Annotations::new(frame.frame_number()))
//!     }
//! }
//!
//! struct Factory;
//!
//! impl ProcessorFactory for Factory {
//!     fn create_processor(
//!         &self,
//!         kind: ProcessorKind,
//!         _options: &ProcessorOptions,
//!     ) -> vision_overlay::Result<Box<dyn VisionProcessor>> {
//!         Ok(Box::new(DetectorProcessor::new(kind.label(), NoFaces)?))
//!     }
//!
//!     fn available_processors(&self) -> Vec<ProcessorKind> {
//!         vec![ProcessorKind::FaceDetection]
//!     }
//! }
//!
//! # async fn example(player: Box<dyn MediaPlayer>, frames: vision_overlay::FrameStream) -> vision_overlay::Result<()> {
//! let overlay = SharedOverlay::new();
//! let mut session = VideoSession::new(
//!     SessionConfig::default(),
//!     player,
//!     Arc::new(overlay.clone()),
//!     Box::new(Factory),
//!     Arc::new(LogNotifier),
//! )?;
//!
//! session.open_video(Some("file:///videos/squats.mp4"))?;
//! session.resume();
//! let stats = session.run(frames).await?;
//! println!("dispatched {} of {} frames", stats.frames_dispatched, stats.frames_submitted);
//! session.destroy()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tracing-init` (default): subscriber setup helpers in [`tracing_config`]
//! - `tracing-json`, `tracing-files`: JSON and file log output
//! - `video-support`: FFmpeg decoding (needs the FFmpeg development libraries)

pub mod annotations;
pub mod backends;
pub mod config;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod pacer;
pub mod player;
pub mod processor;
pub mod services;
pub mod session;
pub mod tracing_config;
pub mod vision;

pub use annotations::{
    Annotation, Annotations, BoundingBox, FaceAnnotation, Landmark, PoseAnnotation,
};
pub use backends::{VideoFormat, VideoMetadata, VideoProbe};
#[cfg(feature = "video-support")]
pub use backends::FfmpegPlayer;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{OverlayError, Result};
pub use frame::{size_for_desired_size, Frame, FrameDimensions, FrameStream};
pub use overlay::{OverlayRenderer, OverlaySnapshot, SharedOverlay};
pub use pacer::{
    CompletionOutcome, FramePacer, FrameProcessedHook, PacerConfig, PacerState, PacingStats,
    SubmitOutcome,
};
pub use player::{MediaPlayer, PlaybackController, PlayerState};
pub use processor::{
    DefaultProcessorFactory, FaceOptions, FacePerformanceMode, PoseOptions, ProcessorConfig,
    ProcessorConfigBuilder, ProcessorFactory, ProcessorKind, ProcessorOptions, ProcessorSelector,
    FACE_DETECTION, POSE_DETECTION,
};
pub use services::{CollectingNotifier, LogNotifier, NoOpNotifier, NotificationLevel, Notifier};
pub use session::VideoSession;
pub use vision::{
    Completion, CompletionEvent, CompletionReceiver, Detector, DetectorProcessor, VisionProcessor,
};
