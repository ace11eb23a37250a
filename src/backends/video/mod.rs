//! Video source backend module
//!
//! Container format detection and metadata probing for the files a host
//! opens, plus the FFmpeg-backed player (feature `video-support`) that
//! decodes them into a [`FrameStream`] at playback speed.

#[cfg(feature = "video-support")]
pub mod ffmpeg;

#[cfg(feature = "video-support")]
pub use ffmpeg::FfmpegPlayer;

pub use crate::frame::FrameStream;

use crate::error::Result;
use async_trait::async_trait;

/// Video format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    /// MP4 format (H.264/H.265)
    Mp4,
    Avi,
    /// MOV format (QuickTime)
    Mov,
    /// MKV format (Matroska)
    Mkv,
    WebM,
    /// 3GP format, common for phone recordings
    ThreeGp,
}

impl VideoFormat {
    /// All formats in detection order
    pub const ALL: [VideoFormat; 6] = [
        Self::Mp4,
        Self::Avi,
        Self::Mov,
        Self::Mkv,
        Self::WebM,
        Self::ThreeGp,
    ];

    /// Get file extension for the video format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::WebM => "webm",
            Self::ThreeGp => "3gp",
        }
    }

    /// Get MIME type for the video format
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Avi => "video/x-msvideo",
            Self::Mov => "video/quicktime",
            Self::Mkv => "video/x-matroska",
            Self::WebM => "video/webm",
            Self::ThreeGp => "video/3gpp",
        }
    }

    /// Detect format from file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }

    /// Detect format from a file path or URI
    ///
    /// Query strings and fragments are ignored.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file_name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// Video metadata information
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Video duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Container format, when it could be told from the URI
    pub format: Option<VideoFormat>,
    /// Video codec name
    pub codec: String,
    /// Bitrate in bits per second
    pub bitrate: Option<u64>,
    pub has_audio: bool,
}

impl VideoMetadata {
    /// Approximate number of frames
    #[must_use]
    pub fn estimated_frame_count(&self) -> u64 {
        if self.duration <= 0.0 || self.fps <= 0.0 {
            0
        } else {
            (self.duration * self.fps).round() as u64
        }
    }
}

/// Trait for reading video metadata without playing the video
#[async_trait]
pub trait VideoProbe {
    /// Get video metadata without decoding frames
    ///
    /// # Arguments
    /// * `uri` - Path or `file://` URI of the video
    async fn probe(&self, uri: &str) -> Result<VideoMetadata>;

    /// Get supported video formats
    fn supported_formats(&self) -> &[VideoFormat];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(VideoFormat::from_extension("MP4"), Some(VideoFormat::Mp4));
        assert_eq!(VideoFormat::from_extension("3gp"), Some(VideoFormat::ThreeGp));
        assert_eq!(VideoFormat::from_extension("gif"), None);
        assert_eq!(VideoFormat::WebM.mime_type(), "video/webm");
    }

    #[test]
    fn test_format_from_uri() {
        assert_eq!(
            VideoFormat::from_uri("file:///sdcard/Movies/squats.mov"),
            Some(VideoFormat::Mov)
        );
        assert_eq!(
            VideoFormat::from_uri("https://cdn.example.com/clip.webm?token=a.b#t=3"),
            Some(VideoFormat::WebM)
        );
        assert_eq!(VideoFormat::from_uri("content://media/external/video/42"), None);
        assert_eq!(VideoFormat::from_uri("archive.v2/clip"), None);
    }

    #[test]
    fn test_estimated_frame_count() {
        let metadata = VideoMetadata {
            duration: 2.5,
            width: 1280,
            height: 720,
            fps: 30.0,
            format: Some(VideoFormat::Mp4),
            codec: "h264".to_string(),
            bitrate: None,
            has_audio: false,
        };
        assert_eq!(metadata.estimated_frame_count(), 75);

        let unknown = VideoMetadata {
            fps: 0.0,
            ..metadata
        };
        assert_eq!(unknown.estimated_frame_count(), 0);
    }
}
