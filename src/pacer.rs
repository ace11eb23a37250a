//! Single-flight frame pacer
//!
//! Frames arrive at the player's rate; the vision processor is usually much
//! slower. The pacer keeps at most one frame in flight and remembers only the
//! newest frame that arrived meanwhile. When the in-flight frame completes,
//! that newest frame is dispatched and every frame in between is dropped.
//!
//! There is no queue. Frames that arrive while the processor is busy overwrite
//! each other in a single slot.
//!
//! All state lives on the task that owns the pacer. Processors report back
//! through [`Completion`] handles which the owner feeds into
//! [`FramePacer::on_completion`].

use crate::{
    frame::{Frame, FrameDimensions},
    overlay::OverlayRenderer,
    vision::{completion_channel, Completion, CompletionEvent, CompletionReceiver, VisionProcessor},
};
use instant::{Duration, Instant};
use std::sync::Arc;
use tracing::{debug, span, trace, Level};

/// Callback run after each processed frame
pub type FrameProcessedHook = Box<dyn FnMut(&Frame) + Send>;

/// What happened to a submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No processor configured; the frame was only remembered as the last frame
    Dropped,
    /// The frame was handed to the processor
    Dispatched,
    /// The processor is busy; the frame is now the pending frame
    Pending,
}

/// What a completion led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Completion from a processor that has since been stopped
    Stale,
    /// Nothing was pending; the pacer is idle
    Idle,
    /// The pending frame was submitted right away
    Resubmitted(SubmitOutcome),
}

/// Processing state of the pacer
#[derive(Debug, Clone, Default)]
pub struct PacerState {
    pub busy: bool,
    pub pending_exists: bool,
    pub last_frame: Option<Frame>,
}

/// Counters kept while pacing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacingStats {
    pub frames_submitted: u64,
    pub frames_dispatched: u64,
    /// Frames dropped because no processor was configured
    pub frames_dropped: u64,
    /// Pending frames overwritten by a newer one before dispatch
    pub frames_coalesced: u64,
    pub completions: u64,
    pub stale_completions: u64,
    /// Sum of dispatch-to-completion times of current-generation frames
    pub total_processing_time: Duration,
}

impl PacingStats {
    /// Average dispatch-to-completion time
    #[must_use]
    pub fn average_processing_time(&self) -> Duration {
        if self.completions == 0 {
            Duration::ZERO
        } else {
            self.total_processing_time / self.completions as u32
        }
    }

    /// Share of submitted frames that reached the processor, in percent
    #[must_use]
    pub fn dispatch_rate(&self) -> f64 {
        if self.frames_submitted == 0 {
            0.0
        } else {
            (self.frames_dispatched as f64 / self.frames_submitted as f64) * 100.0
        }
    }
}

/// Pacer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacerConfig {
    /// Passed to the overlay with every dimension update
    pub mirrored: bool,
}

/// Single-flight, latest-wins frame scheduler
pub struct FramePacer {
    config: PacerConfig,
    processor: Option<Box<dyn VisionProcessor>>,
    overlay: Arc<dyn OverlayRenderer>,
    state: PacerState,
    source_dimensions: Option<FrameDimensions>,
    generation: u64,
    dispatched_at: Option<Instant>,
    completions_tx: tokio::sync::mpsc::UnboundedSender<CompletionEvent>,
    on_frame_processed: Option<FrameProcessedHook>,
    stats: PacingStats,
}

impl FramePacer {
    /// Create a pacer and the receiver its completions arrive on
    ///
    /// The receiver must be drained on the same task that owns the pacer.
    pub fn new(
        overlay: Arc<dyn OverlayRenderer>,
        config: PacerConfig,
    ) -> (Self, CompletionReceiver) {
        let (completions_tx, completions) = completion_channel();
        let pacer = Self {
            config,
            processor: None,
            overlay,
            state: PacerState::default(),
            source_dimensions: None,
            generation: 0,
            dispatched_at: None,
            completions_tx,
            on_frame_processed: None,
            stats: PacingStats::default(),
        };
        (pacer, completions)
    }

    /// Submit a frame for processing
    pub fn submit(&mut self, frame: Frame) -> SubmitOutcome {
        self.stats.frames_submitted += 1;
        self.schedule(frame)
    }

    fn schedule(&mut self, frame: Frame) -> SubmitOutcome {
        if self.state.pending_exists {
            self.stats.frames_coalesced += 1;
        }
        self.state.last_frame = Some(frame.clone());

        let Some(processor) = self.processor.as_mut() else {
            self.stats.frames_dropped += 1;
            trace!(frame = frame.frame_number(), "No processor, frame dropped");
            return SubmitOutcome::Dropped;
        };

        self.state.pending_exists = self.state.busy;
        if self.state.busy {
            trace!(frame = frame.frame_number(), "Processor busy, frame pending");
            return SubmitOutcome::Pending;
        }

        self.state.busy = true;

        let dimensions = frame.dimensions();
        if self.source_dimensions != Some(dimensions) {
            self.source_dimensions = Some(dimensions);
            self.overlay.set_source_dimensions(
                dimensions.width,
                dimensions.height,
                self.config.mirrored,
            );
            debug!(%dimensions, mirrored = self.config.mirrored, "Overlay source dimensions changed");
        }

        let _span = span!(
            Level::TRACE,
            "dispatch",
            processor = %processor.name(),
            frame = frame.frame_number(),
            generation = self.generation
        )
        .entered();

        let completion = Completion::new(self.generation, frame.clone(), self.completions_tx.clone());
        self.dispatched_at = Some(Instant::now());
        self.stats.frames_dispatched += 1;
        processor.process(frame, Arc::clone(&self.overlay), completion);

        SubmitOutcome::Dispatched
    }

    /// Handle a completion delivered through the [`CompletionReceiver`]
    pub fn on_completion(&mut self, event: CompletionEvent) -> CompletionOutcome {
        if event.generation() != self.generation || self.processor.is_none() {
            self.stats.stale_completions += 1;
            debug!(
                frame = event.frame().frame_number(),
                generation = event.generation(),
                current = self.generation,
                "Ignoring completion from stopped processor"
            );
            return CompletionOutcome::Stale;
        }

        self.state.busy = false;
        self.stats.completions += 1;
        if let Some(started) = self.dispatched_at.take() {
            self.stats.total_processing_time += started.elapsed();
        }

        let frame = event.into_frame();
        if let Some(hook) = self.on_frame_processed.as_mut() {
            hook(&frame);
        }

        if self.state.pending_exists {
            self.state.pending_exists = false;
            if let Some(latest) = self.state.last_frame.clone() {
                return CompletionOutcome::Resubmitted(self.schedule(latest));
            }
        }

        CompletionOutcome::Idle
    }

    /// Install a processor, stopping the current one first
    ///
    /// The new processor starts idle. The last frame is not resubmitted; use
    /// [`FramePacer::resubmit_last_frame`] for that.
    pub fn install_processor(&mut self, processor: Box<dyn VisionProcessor>) {
        self.stop_processor();
        debug!(processor = %processor.name(), generation = self.generation, "Processor installed");
        self.processor = Some(processor);
    }

    /// Stop and remove the current processor, resetting the processing state
    ///
    /// Completions still in flight for the old processor become stale. The
    /// last frame and the cached overlay dimensions are kept.
    pub fn stop_processor(&mut self) {
        if let Some(mut processor) = self.processor.take() {
            processor.stop();
            self.generation += 1;
            self.state.busy = false;
            self.state.pending_exists = false;
            self.dispatched_at = None;
            debug!(processor = %processor.name(), generation = self.generation, "Processor torn down");
        }
    }

    /// Submit the last seen frame again, if there is one
    pub fn resubmit_last_frame(&mut self) -> Option<SubmitOutcome> {
        let frame = self.state.last_frame.clone()?;
        Some(self.schedule(frame))
    }

    /// Set the hook run with every processed frame
    pub fn set_frame_processed_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Frame) + Send + 'static,
    {
        self.on_frame_processed = Some(Box::new(hook));
    }

    #[must_use]
    pub fn has_processor(&self) -> bool {
        self.processor.is_some()
    }

    #[must_use]
    pub fn processor_name(&self) -> Option<&str> {
        self.processor.as_ref().map(|p| p.name())
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.state.pending_exists
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&Frame> {
        self.state.last_frame.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> &PacerState {
        &self.state
    }

    /// Dimensions last forwarded to the overlay
    #[must_use]
    pub fn source_dimensions(&self) -> Option<FrameDimensions> {
        self.source_dimensions
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn stats(&self) -> &PacingStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> PacerConfig {
        self.config
    }
}
