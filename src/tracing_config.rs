//! Tracing configuration module for structured logging and observability
//!
//! Applications configure subscribers (feature `tracing-init`); the library
//! itself only emits spans and events through the helpers at the bottom of
//! this module.

#[cfg(feature = "tracing-init")]
use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Configuration for tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output with colors and emojis (default)
    Console,
    /// Compact console output for CI environments
    Compact,
    /// JSON structured logging for production environments
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Configuration for tracing output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracingOutput {
    /// Output to stdout/stderr (default)
    Console,
    /// Output to a file
    #[cfg(feature = "tracing-files")]
    File(std::path::PathBuf),
    /// Output to both console and file
    #[cfg(feature = "tracing-files")]
    Both(std::path::PathBuf),
}

/// Tracing configuration builder
#[derive(Debug)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    pub format: TracingFormat,
    pub output: TracingOutput,
    /// Environment filter string (overrides verbosity if set)
    pub env_filter: Option<String>,
    /// Session ID for correlation
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            output: TracingOutput::Console,
            env_filter: None,
            session_id: None,
        }
    }
}

/// Keeps background log writers alive; drop it on shutdown to flush
#[derive(Debug, Default)]
#[must_use]
pub struct TracingGuard {
    #[cfg(feature = "tracing-files")]
    _file: Option<tracing_appender::non_blocking::WorkerGuard>,
}

#[cfg(feature = "tracing-init")]
type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level (0-3+)
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Set custom environment filter
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Set session ID for log correlation
    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",  // Default: lifecycle and selection messages
            1 => "debug", // -v: processor teardown, dimension changes
            _ => "trace", // -vv+: every dispatch and dropped frame
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    /// - Invalid filter directives
    /// - A global subscriber is already installed
    #[cfg(feature = "tracing-init")]
    pub fn init(self) -> anyhow::Result<TracingGuard> {
        let filter = if let Some(env_filter) = &self.env_filter {
            EnvFilter::try_new(env_filter)?
        } else {
            EnvFilter::try_new(self.verbosity_to_filter())?
        };

        #[allow(unused_mut)]
        let mut guard = TracingGuard::default();
        let mut layers: Vec<BoxedLayer> = Vec::new();

        match &self.output {
            TracingOutput::Console => layers.push(console_layer(self.format)),

            #[cfg(feature = "tracing-files")]
            TracingOutput::File(path) => {
                let (writer, file_guard) = file_writer(path);
                guard._file = Some(file_guard);
                layers.push(file_layer(self.format, writer));
            },

            #[cfg(feature = "tracing-files")]
            TracingOutput::Both(path) => {
                let (writer, file_guard) = file_writer(path);
                guard._file = Some(file_guard);
                layers.push(console_layer(self.format));
                layers.push(file_layer(self.format, writer));
            },
        }

        Registry::default().with(filter).with(layers).try_init()?;

        if let Some(session_id) = &self.session_id {
            tracing::info!(session_id = %session_id, "🚀 Video overlay session started");
        }

        Ok(guard)
    }
}

#[cfg(feature = "tracing-init")]
fn console_layer(format: TracingFormat) -> BoxedLayer {
    match format {
        TracingFormat::Console => fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_level(true)
            .compact()
            .boxed(),
        TracingFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .boxed(),
        #[cfg(feature = "tracing-json")]
        TracingFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    }
}

#[cfg(feature = "tracing-files")]
fn file_writer(
    path: &std::path::Path,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    let file_appender = tracing_appender::rolling::never(
        path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        path.file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("vision-overlay.log")),
    );
    tracing_appender::non_blocking(file_appender)
}

#[cfg(feature = "tracing-files")]
fn file_layer(
    format: TracingFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) -> BoxedLayer {
    match format {
        TracingFormat::Console | TracingFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .compact()
            .boxed(),
        #[cfg(feature = "tracing-json")]
        TracingFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    }
}

/// Initialize console tracing with a fresh session ID
///
/// # Errors
/// - A global subscriber is already installed
#[cfg(feature = "tracing-init")]
pub fn init_app_tracing(verbosity: u8) -> anyhow::Result<TracingGuard> {
    let session_id = uuid::Uuid::new_v4().to_string();

    TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(TracingFormat::Console)
        .with_session_id(session_id)
        .init()
}

/// Initialize tracing for library usage, keeping any existing subscriber
#[cfg(feature = "tracing-init")]
pub fn init_library_tracing() {
    if tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .is_ok()
    {
        tracing::debug!("📚 Library tracing initialized");
    }
}

/// Span creation helpers for common operations
pub mod spans {
    use tracing::{Level, Span};

    /// Span covering one session run over a frame stream
    pub fn session(processor: &str, mirrored: bool) -> Span {
        tracing::span!(
            Level::INFO,
            "session",
            processor = %processor,
            mirrored = %mirrored
        )
    }

    /// Span for processor (re)creation
    pub fn processor_creation(kind: &str) -> Span {
        tracing::span!(Level::INFO, "processor_creation", kind = %kind)
    }

    /// Span for a playback lifecycle operation
    pub fn playback(operation: &str, source: Option<&str>) -> Span {
        tracing::span!(
            Level::DEBUG,
            "playback",
            operation = %operation,
            source = %source.unwrap_or("-")
        )
    }
}

/// Event helpers for common logging patterns
pub mod events {
    use crate::pacer::PacingStats;
    use tracing::{error, info};

    /// Log an error with context
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!(
            error = %error,
            context = %context,
            "❌ Operation failed"
        );
    }

    /// Log the pacing counters at the end of a run
    pub fn pacing_summary(stats: &PacingStats) {
        info!(
            submitted = stats.frames_submitted,
            dispatched = stats.frames_dispatched,
            dropped = stats.frames_dropped,
            coalesced = stats.frames_coalesced,
            stale = stats.stale_completions,
            dispatch_rate = %format!("{:.1}%", stats.dispatch_rate()),
            avg_processing_ms = stats.average_processing_time().as_millis() as u64,
            "⏱️  Pacing summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(TracingConfig::new().with_verbosity(0).verbosity_to_filter(), "info");
        assert_eq!(TracingConfig::new().with_verbosity(1).verbosity_to_filter(), "debug");
        assert_eq!(TracingConfig::new().with_verbosity(2).verbosity_to_filter(), "trace");
        assert_eq!(TracingConfig::new().with_verbosity(10).verbosity_to_filter(), "trace");
    }

    #[test]
    fn test_config_builder() {
        let config = TracingConfig::new()
            .with_verbosity(2)
            .with_format(TracingFormat::Compact)
            .with_env_filter("vision_overlay=trace")
            .with_session_id("test-session");

        assert_eq!(config.verbosity, 2);
        assert_eq!(config.format, TracingFormat::Compact);
        assert_eq!(config.env_filter.as_deref(), Some("vision_overlay=trace"));
        assert_eq!(config.session_id.as_deref(), Some("test-session"));
    }

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.format, TracingFormat::Console);
        assert_eq!(config.output, TracingOutput::Console);
        assert!(config.env_filter.is_none());
        assert!(config.session_id.is_none());
    }

    #[test]
    fn test_span_and_event_helpers() {
        let _session = spans::session("Pose Detection", false).entered();
        let _creation = spans::processor_creation("Face Detection").entered();
        let _playback = spans::playback("load source", Some("clip.mp4")).entered();
        events::pacing_summary(&crate::pacer::PacingStats::default());
        events::error_with_context(&crate::OverlayError::playback("decoder gone"), "open video");
    }
}
