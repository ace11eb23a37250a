//! Vision processor abstraction and completion plumbing
//!
//! A processor receives one frame at a time together with a [`Completion`]
//! handle. The handle is one-shot: it is consumed by [`Completion::complete`]
//! and reports back to the task that owns the pacer through an unbounded
//! channel, so pacer state is only ever touched from that task.

use crate::{
    annotations::Annotations,
    error::{OverlayError, Result},
    frame::Frame,
    overlay::OverlayRenderer,
};
use instant::Instant;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Notification that a dispatched frame finished processing
#[derive(Debug)]
pub struct CompletionEvent {
    generation: u64,
    frame: Frame,
}

impl CompletionEvent {
    /// Processor generation the frame was dispatched under
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The frame that was processed
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub(crate) fn into_frame(self) -> Frame {
        self.frame
    }
}

/// One-shot completion handle for a single dispatched frame
///
/// Dropping the handle without calling [`Completion::complete`] still
/// notifies, so a processor that fails or panics cannot leave the pacer busy
/// forever. Stopped processors use [`Completion::discard`] instead.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    frame: Frame,
    tx: mpsc::UnboundedSender<CompletionEvent>,
    fired: bool,
}

impl Completion {
    pub(crate) fn new(
        generation: u64,
        frame: Frame,
        tx: mpsc::UnboundedSender<CompletionEvent>,
    ) -> Self {
        Self {
            generation,
            frame,
            tx,
            fired: false,
        }
    }

    /// Processor generation this dispatch belongs to
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The frame this handle completes
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Signal that processing of the frame finished, successfully or not
    pub fn complete(mut self) {
        self.fire();
    }

    /// Consume the handle without notifying; only for stopped processors
    pub fn discard(mut self) {
        self.fired = true;
    }

    fn fire(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        let event = CompletionEvent {
            generation: self.generation,
            frame: self.frame.clone(),
        };
        // Receiver gone means the session was torn down
        if self.tx.send(event).is_err() {
            trace!(
                frame = self.frame.frame_number(),
                "Completion receiver closed"
            );
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.fired {
            debug!(
                frame = self.frame.frame_number(),
                generation = self.generation,
                "Completion dropped without complete(), notifying"
            );
            self.fire();
        }
    }
}

/// Receiving side of the completion channel, drained by the owning task
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: mpsc::UnboundedReceiver<CompletionEvent>,
}

impl CompletionReceiver {
    /// Wait for the next completion
    pub async fn recv(&mut self) -> Option<CompletionEvent> {
        self.rx.recv().await
    }

    /// Take a completion if one is already queued
    pub fn try_recv(&mut self) -> Option<CompletionEvent> {
        self.rx.try_recv().ok()
    }
}

pub(crate) fn completion_channel() -> (mpsc::UnboundedSender<CompletionEvent>, CompletionReceiver)
{
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, CompletionReceiver { rx })
}

/// Trait for vision processors
pub trait VisionProcessor: Send {
    /// Human readable processor name, used in logs
    fn name(&self) -> &str;

    /// Start asynchronous processing of `frame`
    ///
    /// Must not block. The processor draws its results on `overlay` and must
    /// resolve `completion` exactly once, also when detection fails.
    fn process(&mut self, frame: Frame, overlay: Arc<dyn OverlayRenderer>, completion: Completion);

    /// Stop the processor
    ///
    /// Synchronous and idempotent. No completion may be signalled after this
    /// returns.
    fn stop(&mut self);
}

/// Synchronous detection model, e.g. a pose or face detector
pub trait Detector: Send + 'static {
    /// Run detection on a single frame
    ///
    /// # Errors
    /// - Model inference failures
    /// - Unsupported frame geometry
    fn detect(&mut self, frame: &Frame) -> Result<Annotations>;

    /// Release model resources; called once when the processor stops
    fn close(&mut self) {}
}

/// Runs a [`Detector`] on the tokio blocking pool as a [`VisionProcessor`]
pub struct DetectorProcessor<D: Detector> {
    name: String,
    detector: Arc<Mutex<D>>,
    stopped: Arc<AtomicBool>,
    runtime: tokio::runtime::Handle,
}

impl<D: Detector> DetectorProcessor<D> {
    /// Create a processor on the current tokio runtime
    ///
    /// # Errors
    /// - `OverlayError::Runtime` when called outside a tokio runtime
    pub fn new<S: Into<String>>(name: S, detector: D) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            OverlayError::runtime(format!("Detector processors need a tokio runtime: {}", e))
        })?;
        Ok(Self::with_handle(name, detector, runtime))
    }

    /// Create a processor that spawns on an explicit runtime handle
    pub fn with_handle<S: Into<String>>(
        name: S,
        detector: D,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            name: name.into(),
            detector: Arc::new(Mutex::new(detector)),
            stopped: Arc::new(AtomicBool::new(false)),
            runtime,
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl<D: Detector> VisionProcessor for DetectorProcessor<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, frame: Frame, overlay: Arc<dyn OverlayRenderer>, completion: Completion) {
        if self.is_stopped() {
            completion.discard();
            return;
        }

        let detector = Arc::clone(&self.detector);
        let stopped = Arc::clone(&self.stopped);
        let name = self.name.clone();

        self.runtime.spawn_blocking(move || {
            let started = Instant::now();
            // Held until the completion is resolved so `stop` cannot return mid-frame
            let Ok(mut guard) = detector.lock() else {
                warn!(processor = %name, "Detector lock poisoned");
                if stopped.load(Ordering::Acquire) {
                    completion.discard();
                } else {
                    completion.complete();
                }
                return;
            };

            if stopped.load(Ordering::Acquire) {
                completion.discard();
                return;
            }

            let result = guard.detect(&frame);
            if stopped.load(Ordering::Acquire) {
                completion.discard();
                return;
            }

            match result {
                Ok(annotations) => {
                    overlay.clear();
                    overlay.draw(&annotations);
                    trace!(
                        processor = %name,
                        frame = frame.frame_number(),
                        items = annotations.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Detection finished"
                    );
                },
                Err(e) => {
                    warn!(
                        processor = %name,
                        frame = frame.frame_number(),
                        error = %e,
                        "Detection failed"
                    );
                },
            }

            completion.complete();
            drop(guard);
        });
    }

    fn stop(&mut self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        // Blocks until an in-flight frame has drawn and completed or been discarded
        if let Ok(mut detector) = self.detector.lock() {
            detector.close();
        }
        info!(processor = %self.name, "Vision processor stopped");
    }
}
