//! Video session: playback, pacing and processor selection in one place
//!
//! A session owns the playback controller, the frame pacer and the processor
//! selector, and exposes the host lifecycle hooks (resume, pause, destroy)
//! plus video and processor selection. It must live on a single task; frame
//! submission and completion handling both happen there.

use crate::{
    config::SessionConfig,
    error::Result,
    frame::{Frame, FrameStream},
    overlay::OverlayRenderer,
    pacer::{FramePacer, PacingStats, SubmitOutcome},
    player::{MediaPlayer, PlaybackController, PlayerState},
    processor::{ProcessorFactory, ProcessorKind, ProcessorSelector},
    services::Notifier,
    tracing_config::{events, spans},
    vision::CompletionReceiver,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn, Instrument};

/// A video playback session with paced vision overlays
pub struct VideoSession {
    config: SessionConfig,
    controller: PlaybackController,
    pacer: FramePacer,
    completions: CompletionReceiver,
    selector: ProcessorSelector,
}

impl VideoSession {
    /// Create a session; no processor exists until [`VideoSession::resume`]
    ///
    /// # Errors
    /// - Configuration validation failures
    pub fn new(
        config: SessionConfig,
        player: Box<dyn MediaPlayer>,
        overlay: Arc<dyn OverlayRenderer>,
        factory: Box<dyn ProcessorFactory>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let (pacer, completions) = FramePacer::new(overlay, config.pacer_config());
        let selector = ProcessorSelector::new(config.processor_config()?, factory, notifier);

        Ok(Self {
            config,
            controller: PlaybackController::new(player),
            pacer,
            completions,
            selector,
        })
    }

    /// Create the processor for the current selection
    ///
    /// Returns whether a processor is available afterwards. The last frame is
    /// not resubmitted; the next frame from the player starts processing.
    #[instrument(skip(self), fields(kind = %self.selector.selected()))]
    pub fn resume(&mut self) -> bool {
        self.selector.create_processor(&mut self.pacer)
    }

    /// Pause playback, then stop the processor
    ///
    /// The processor is stopped even when pausing the player fails.
    ///
    /// # Errors
    /// - Player pause failures
    #[instrument(skip(self))]
    pub fn pause(&mut self) -> Result<()> {
        let paused = self.controller.pause();
        self.pacer.stop_processor();
        paused
    }

    /// Stop and release the player
    ///
    /// # Errors
    /// - The first error from stopping or releasing the player
    #[instrument(skip(self))]
    pub fn destroy(mut self) -> Result<()> {
        self.pacer.stop_processor();
        let result = self.controller.shutdown();
        events::pacing_summary(self.pacer.stats());
        result
    }

    /// Load the chosen video and start playing it; `None` does nothing
    ///
    /// # Errors
    /// - Player lifecycle failures
    pub fn open_video(&mut self, uri: Option<&str>) -> Result<()> {
        let Some(uri) = uri else {
            debug!("No video chosen");
            return Ok(());
        };

        let _span = spans::playback("load source", Some(uri)).entered();
        self.controller.load_source(uri).map_err(|e| {
            events::error_with_context(&e, "open video");
            e
        })
    }

    /// Switch processors and run the new one on the last frame
    ///
    /// # Errors
    /// - `OverlayError::UnknownProcessor` for unknown labels
    pub fn select_processor(&mut self, label: &str) -> Result<Option<SubmitOutcome>> {
        let _span = spans::processor_creation(label).entered();
        let outcome = self.selector.select(label, &mut self.pacer)?;
        info!(processor = %label, ?outcome, "Processor selected");
        Ok(outcome)
    }

    /// Submit one decoded frame
    ///
    /// Frames are scaled first when a desired frame size is configured.
    pub fn submit_frame(&mut self, frame: Frame) -> SubmitOutcome {
        let frame = match self.config.desired_frame_size {
            Some(size) => frame.fit_to_desired_size(size),
            None => frame,
        };
        self.pacer.submit(frame)
    }

    /// Handle every completion that is already queued, without waiting
    ///
    /// Returns the number of completions handled.
    pub fn pump_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.completions.try_recv() {
            self.pacer.on_completion(event);
            handled += 1;
        }
        handled
    }

    /// Set the hook run with every processed frame
    pub fn set_frame_processed_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Frame) + Send + 'static,
    {
        self.pacer.set_frame_processed_hook(hook);
    }

    /// Drive a frame stream until it ends and the in-flight frame completes
    ///
    /// Frames and completions are interleaved on the calling task.
    /// Completions are handled first when both are ready. Stream errors and
    /// invalid frames are logged and skipped.
    ///
    /// # Errors
    /// Stream errors are logged and skipped, so this does not fail today.
    pub async fn run(&mut self, frames: FrameStream) -> Result<PacingStats> {
        let span = spans::session(self.selector.selected().label(), self.config.mirrored);
        self.drive(frames).instrument(span).await
    }

    async fn drive(&mut self, mut frames: FrameStream) -> Result<PacingStats> {
        let desired_size = self.config.desired_frame_size;
        let Self {
            pacer, completions, ..
        } = self;
        let mut stream_done = false;

        loop {
            if stream_done {
                if !pacer.is_busy() {
                    break;
                }
                match completions.recv().await {
                    Some(event) => {
                        pacer.on_completion(event);
                    },
                    None => break,
                }
                continue;
            }

            tokio::select! {
                biased;

                Some(event) = completions.recv() => {
                    pacer.on_completion(event);
                },
                next = frames.next() => match next {
                    Some(Ok(frame)) => match frame.validate() {
                        Ok(()) => {
                            let frame = match desired_size {
                                Some(size) => frame.fit_to_desired_size(size),
                                None => frame,
                            };
                            pacer.submit(frame);
                        },
                        Err(e) => {
                            warn!(frame = frame.frame_number(), error = %e, "Skipping invalid frame");
                        },
                    },
                    Some(Err(e)) => warn!(error = %e, "Frame source error, skipping frame"),
                    None => {
                        debug!("Frame stream ended");
                        stream_done = true;
                    },
                },
            }
        }

        let stats = pacer.stats().clone();
        events::pacing_summary(&stats);
        Ok(stats)
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn selected_processor(&self) -> ProcessorKind {
        self.selector.selected()
    }

    #[must_use]
    pub fn has_processor(&self) -> bool {
        self.pacer.has_processor()
    }

    #[must_use]
    pub fn player_state(&self) -> PlayerState {
        self.controller.state()
    }

    #[must_use]
    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    #[must_use]
    pub fn stats(&self) -> &PacingStats {
        self.pacer.stats()
    }
}
