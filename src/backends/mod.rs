//! Backend implementations for media sources
//!
//! - Video backend: format detection, metadata probing and the FFmpeg-based
//!   player (decoding needs the `video-support` feature)

pub mod video;

// Mock collaborators for unit tests
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "video-support")]
pub use self::video::FfmpegPlayer;

pub use self::video::{VideoFormat, VideoMetadata, VideoProbe};
