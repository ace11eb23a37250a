//! FFmpeg-backed media player
//!
//! Decodes the selected video on the tokio blocking pool and releases frames
//! at their presentation time, so the consumer sees the video at playback
//! speed. Frames are converted to RGBA and optionally scaled so their larger
//! side matches a desired size.

use crate::{
    backends::video::{FrameStream, VideoFormat, VideoMetadata, VideoProbe},
    error::{OverlayError, Result},
    frame::{size_for_desired_size, Frame},
    player::MediaPlayer,
};
use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use image::RgbaImage;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Decoded frames buffered between the decoder and the consumer
const FRAME_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Running,
    Paused,
    Stopped,
}

/// Play/pause/stop state shared with the decode thread
#[derive(Debug)]
struct PlaybackControl {
    state: Mutex<DecodeState>,
    changed: Condvar,
}

impl PlaybackControl {
    fn new() -> Self {
        Self {
            state: Mutex::new(DecodeState::Paused),
            changed: Condvar::new(),
        }
    }

    fn set(&self, state: DecodeState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
            self.changed.notify_all();
        }
    }

    /// Block while paused; returns how long, or `None` once stopped
    fn wait_while_paused(&self) -> Option<Duration> {
        let started = Instant::now();
        let mut state = self.state.lock().ok()?;
        while *state == DecodeState::Paused {
            state = self.changed.wait(state).ok()?;
        }
        match *state {
            DecodeState::Stopped => None,
            _ => Some(started.elapsed()),
        }
    }

    /// Sleep until `deadline` unless the state changes; returns the state
    fn sleep_until(&self, deadline: Instant) -> DecodeState {
        let Ok(mut state) = self.state.lock() else {
            return DecodeState::Stopped;
        };
        loop {
            let now = Instant::now();
            if *state != DecodeState::Running || now >= deadline {
                return *state;
            }
            match self.changed.wait_timeout(state, deadline - now) {
                Ok((guard, _)) => state = guard,
                Err(_) => return DecodeState::Stopped,
            }
        }
    }
}

/// Media player that decodes local files with FFmpeg
pub struct FfmpegPlayer {
    runtime: tokio::runtime::Handle,
    desired_size: Option<u32>,
    source: Option<String>,
    metadata: Option<VideoMetadata>,
    control: Arc<PlaybackControl>,
    frames_tx: Option<mpsc::Sender<Result<Frame>>>,
    frames_rx: Option<mpsc::Receiver<Result<Frame>>>,
    decoding: bool,
    released: bool,
}

impl FfmpegPlayer {
    /// Create a player on the current tokio runtime
    ///
    /// # Errors
    /// - `OverlayError::Runtime` outside a tokio runtime
    /// - `OverlayError::Playback` when FFmpeg fails to initialize
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            OverlayError::runtime(format!("The FFmpeg player needs a tokio runtime: {}", e))
        })?;
        Self::with_handle(runtime)
    }

    /// Create a player that decodes on an explicit runtime
    ///
    /// # Errors
    /// - `OverlayError::Playback` when FFmpeg fails to initialize
    pub fn with_handle(runtime: tokio::runtime::Handle) -> Result<Self> {
        ffmpeg::init()
            .map_err(|e| OverlayError::playback(format!("Failed to initialize FFmpeg: {}", e)))?;
        Ok(Self {
            runtime,
            desired_size: None,
            source: None,
            metadata: None,
            control: Arc::new(PlaybackControl::new()),
            frames_tx: None,
            frames_rx: None,
            decoding: false,
            released: false,
        })
    }

    /// Scale decoded frames so their larger side equals `size`
    #[must_use]
    pub fn with_desired_size(mut self, size: u32) -> Self {
        self.desired_size = Some(size);
        self
    }

    /// Metadata of the prepared source
    #[must_use]
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Take the stream of decoded frames for the prepared source
    ///
    /// Can be taken once per `prepare`.
    ///
    /// # Errors
    /// - `OverlayError::Playback` when nothing is prepared or the stream was
    ///   already taken
    pub fn frame_stream(&mut self) -> Result<FrameStream> {
        let rx = self.frames_rx.take().ok_or_else(|| {
            OverlayError::playback_operation_error(
                "take frame stream",
                self.source.as_deref(),
                "no prepared source or stream already taken",
            )
        })?;
        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn ensure_not_released(&self, operation: &str) -> Result<()> {
        if self.released {
            return Err(OverlayError::playback_operation_error(
                operation,
                self.source.as_deref(),
                "player already released",
            ));
        }
        Ok(())
    }

    fn start_decoding(&mut self) -> Result<()> {
        let tx = self.frames_tx.take().ok_or_else(|| {
            OverlayError::playback_operation_error("play", self.source.as_deref(), "not prepared")
        })?;
        let path = self
            .source
            .as_deref()
            .map(local_path)
            .ok_or_else(|| OverlayError::playback("No source set"))?
            .to_string();
        let control = Arc::clone(&self.control);
        let desired_size = self.desired_size;

        self.runtime.spawn_blocking(move || {
            if let Err(e) = decode(&path, desired_size, &control, &tx) {
                log::error!("Decoding {} failed: {}", path, e);
                report_decode_error(&tx, e);
            }
        });
        self.decoding = true;
        Ok(())
    }
}

impl MediaPlayer for FfmpegPlayer {
    fn set_source(&mut self, uri: &str) -> Result<()> {
        self.ensure_not_released("set source")?;
        self.source = Some(uri.to_string());
        self.metadata = None;
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        self.ensure_not_released("prepare")?;
        let uri = self
            .source
            .clone()
            .ok_or_else(|| OverlayError::playback("Cannot prepare without a source"))?;

        self.metadata = Some(read_metadata(&uri)?);
        self.control = Arc::new(PlaybackControl::new());
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        self.frames_tx = Some(tx);
        self.frames_rx = Some(rx);
        self.decoding = false;
        log::debug!("Prepared {}", uri);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.ensure_not_released("play")?;
        if !self.decoding {
            self.start_decoding()?;
        }
        self.control.set(DecodeState::Running);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ensure_not_released("pause")?;
        if self.decoding {
            self.control.set(DecodeState::Paused);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.ensure_not_released("stop")?;
        self.control.set(DecodeState::Stopped);
        self.frames_tx = None;
        self.decoding = false;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.control.set(DecodeState::Stopped);
        self.frames_tx = None;
        self.frames_rx = None;
        self.decoding = false;
        self.released = true;
        Ok(())
    }
}

#[async_trait]
impl VideoProbe for FfmpegPlayer {
    async fn probe(&self, uri: &str) -> Result<VideoMetadata> {
        let uri = uri.to_string();
        tokio::task::spawn_blocking(move || read_metadata(&uri))
            .await
            .map_err(|e| OverlayError::runtime(format!("Metadata probe task failed: {}", e)))?
    }

    fn supported_formats(&self) -> &[VideoFormat] {
        &VideoFormat::ALL
    }
}

fn local_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

fn open_input(uri: &str) -> Result<ffmpeg::format::context::Input> {
    ffmpeg::format::input(&local_path(uri)).map_err(|e| {
        OverlayError::playback_operation_error("open video", Some(uri), &e.to_string())
    })
}

fn read_metadata(uri: &str) -> Result<VideoMetadata> {
    let input = open_input(uri)?;
    let video_stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| OverlayError::playback(format!("No video stream found in {}", uri)))?;

    let decoder = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|e| OverlayError::playback(format!("Failed to create video decoder: {}", e)))?;

    let bitrate = u64::try_from(input.bit_rate()).ok().filter(|rate| *rate > 0);

    Ok(VideoMetadata {
        duration: video_stream.duration() as f64 * f64::from(video_stream.time_base()),
        width: decoder.width(),
        height: decoder.height(),
        fps: f64::from(video_stream.avg_frame_rate()),
        format: VideoFormat::from_uri(uri),
        codec: decoder.id().name().to_string(),
        bitrate,
        has_audio: input.streams().best(ffmpeg::media::Type::Audio).is_some(),
    })
}

/// RGBA conversion, rebuilt when the decoded geometry changes
struct FrameConverter {
    scaler: ffmpeg::software::scaling::Context,
    source: (ffmpeg::format::Pixel, u32, u32),
    target: (u32, u32),
}

impl FrameConverter {
    fn for_frame(frame: &ffmpeg::util::frame::video::Video, desired_size: Option<u32>) -> Result<Self> {
        let (width, height) = (frame.width(), frame.height());
        let target = match desired_size {
            Some(size) => {
                let dims = size_for_desired_size(width, height, size);
                (dims.width.max(1), dims.height.max(1))
            },
            None => (width, height),
        };
        let scaler = ffmpeg::software::scaling::Context::get(
            frame.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGBA,
            target.0,
            target.1,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| OverlayError::playback(format!("Failed to create frame scaler: {}", e)))?;

        Ok(Self {
            scaler,
            source: (frame.format(), width, height),
            target,
        })
    }

    fn matches(&self, frame: &ffmpeg::util::frame::video::Video) -> bool {
        self.source == (frame.format(), frame.width(), frame.height())
    }

    fn convert(&mut self, frame: &ffmpeg::util::frame::video::Video) -> Result<RgbaImage> {
        let mut rgba = ffmpeg::util::frame::video::Video::empty();
        self.scaler
            .run(frame, &mut rgba)
            .map_err(|e| OverlayError::playback(format!("Failed to convert frame to RGBA: {}", e)))?;

        let (width, height) = self.target;
        let row_bytes = width as usize * 4;
        let stride = rgba.stride(0);
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in rgba.data(0).chunks(stride).take(height as usize) {
            let row = row
                .get(..row_bytes)
                .ok_or_else(|| OverlayError::playback("Decoded row shorter than frame width"))?;
            pixels.extend_from_slice(row);
        }

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| OverlayError::playback("Decoded frame buffer has the wrong size"))
    }
}

/// Presentation clock that excludes time spent paused
struct PlaybackClock {
    started: Instant,
    paused_for: Duration,
}

impl PlaybackClock {
    fn due(&self, timestamp: Duration) -> Instant {
        self.started + self.paused_for + timestamp
    }
}

/// Forward a decode failure to the frame stream; false when nobody listens
fn report_decode_error(tx: &mpsc::Sender<Result<Frame>>, error: OverlayError) -> bool {
    match tx.blocking_send(Err(error)) {
        Ok(()) => true,
        Err(_) => {
            log::debug!("Frame stream closed before the decode error was delivered");
            false
        },
    }
}

fn decode(
    uri: &str,
    desired_size: Option<u32>,
    control: &PlaybackControl,
    tx: &mpsc::Sender<Result<Frame>>,
) -> Result<()> {
    let mut input = open_input(uri)?;
    let stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| OverlayError::playback(format!("No video stream found in {}", uri)))?;
    let stream_index = stream.index();
    let time_base = stream.time_base();
    let fps = f64::from(stream.avg_frame_rate());

    let mut decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|context| context.decoder().video())
        .map_err(|e| OverlayError::playback(format!("Failed to create video decoder: {}", e)))?;

    if control.wait_while_paused().is_none() {
        return Ok(());
    }
    let mut clock = PlaybackClock {
        started: Instant::now(),
        paused_for: Duration::ZERO,
    };

    let mut converter: Option<FrameConverter> = None;
    let mut frame_number = 0u64;
    let mut decoded = ffmpeg::util::frame::video::Video::empty();

    let emit = |decoded: &ffmpeg::util::frame::video::Video,
                    converter: &mut Option<FrameConverter>,
                    clock: &mut PlaybackClock,
                    frame_number: &mut u64|
     -> Result<bool> {
        let timestamp = match decoded.pts() {
            Some(pts) if pts >= 0 => Duration::from_secs_f64(pts as f64 * f64::from(time_base)),
            _ if fps > 0.0 => Duration::from_secs_f64(*frame_number as f64 / fps),
            _ => Duration::ZERO,
        };

        if !converter.as_ref().is_some_and(|c| c.matches(decoded)) {
            *converter = Some(FrameConverter::for_frame(decoded, desired_size)?);
        }
        let Some(active) = converter.as_mut() else {
            return Ok(false);
        };
        let image = active.convert(decoded)?;

        loop {
            match control.sleep_until(clock.due(timestamp)) {
                DecodeState::Stopped => return Ok(false),
                DecodeState::Paused => match control.wait_while_paused() {
                    Some(waited) => clock.paused_for += waited,
                    None => return Ok(false),
                },
                DecodeState::Running => break,
            }
        }

        let frame = Frame::new(image, *frame_number, timestamp);
        *frame_number += 1;
        Ok(tx.blocking_send(Ok(frame)).is_ok())
    };

    for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        if let Err(e) = decoder.send_packet(&packet) {
            log::warn!("Failed to send packet to decoder: {}", e);
            continue;
        }
        while decoder.receive_frame(&mut decoded).is_ok() {
            if !emit(&decoded, &mut converter, &mut clock, &mut frame_number)? {
                return Ok(());
            }
        }
    }

    decoder.send_eof().ok();
    while decoder.receive_frame(&mut decoded).is_ok() {
        if !emit(&decoded, &mut converter, &mut clock, &mut frame_number)? {
            return Ok(());
        }
    }

    log::info!("Decoded {} frames from {}", frame_number, uri);
    Ok(())
}
