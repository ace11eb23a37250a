//! Test utilities and mock collaborators
//!
//! Mock processors, overlays, players and factories that record what the
//! pacing logic does with them, so tests can drive completions by hand
//! without models or decoders.

use crate::{
    annotations::Annotations,
    error::{OverlayError, Result},
    frame::Frame,
    overlay::OverlayRenderer,
    player::MediaPlayer,
    processor::{ProcessorFactory, ProcessorKind, ProcessorOptions},
    vision::{Completion, VisionProcessor},
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockProcessorState {
    dispatched: Vec<u64>,
    held: VecDeque<Completion>,
    stopped: bool,
    call_history: Vec<String>,
}

/// Mock vision processor that holds completions until the test releases them
#[derive(Debug, Clone)]
pub struct MockVisionProcessor {
    name: String,
    auto_complete: bool,
    state: Arc<Mutex<MockProcessorState>>,
}

impl MockVisionProcessor {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auto_complete: false,
            state: Arc::new(Mutex::new(MockProcessorState::default())),
        }
    }

    /// Create a mock that draws and completes every frame immediately
    #[must_use]
    pub fn new_auto_complete(name: &str) -> Self {
        let mut processor = Self::new(name);
        processor.auto_complete = true;
        processor
    }

    /// Frame numbers handed to `process`, in order
    pub fn dispatched_frames(&self) -> Vec<u64> {
        self.state.lock().unwrap().dispatched.clone()
    }

    /// Complete the oldest held frame; false when nothing is held
    pub fn complete_next(&self) -> bool {
        let completion = self.state.lock().unwrap().held.pop_front();
        match completion {
            Some(completion) => {
                completion.complete();
                true
            },
            None => false,
        }
    }

    /// Complete everything held, even after stop
    pub fn force_complete_all(&self) {
        let held: Vec<Completion> = self.state.lock().unwrap().held.drain(..).collect();
        for completion in held {
            completion.complete();
        }
    }

    /// Number of completions waiting to be released
    pub fn held_count(&self) -> usize {
        self.state.lock().unwrap().held.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().unwrap().stopped
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.state.lock().unwrap().call_history.clone()
    }
}

impl VisionProcessor for MockVisionProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, frame: Frame, overlay: Arc<dyn OverlayRenderer>, completion: Completion) {
        let mut state = self.state.lock().unwrap();
        state
            .call_history
            .push(format!("process:{}", frame.frame_number()));
        if state.stopped {
            completion.discard();
            return;
        }
        state.dispatched.push(frame.frame_number());

        if self.auto_complete {
            drop(state);
            overlay.clear();
            overlay.draw(&Annotations::new(frame.frame_number()));
            completion.complete();
        } else {
            state.held.push_back(completion);
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.call_history.push("stop".to_string());
        state.stopped = true;
    }
}

#[derive(Debug, Default)]
struct OverlayRecord {
    dimension_updates: Vec<(u32, u32, bool)>,
    drawn_frames: Vec<u64>,
    clears: usize,
}

/// Overlay that records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    record: Arc<Mutex<OverlayRecord>>,
}

impl RecordingOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(width, height, mirrored)` of every dimension update
    pub fn dimension_updates(&self) -> Vec<(u32, u32, bool)> {
        self.record.lock().unwrap().dimension_updates.clone()
    }

    /// Frame numbers of drawn annotations
    pub fn drawn_frames(&self) -> Vec<u64> {
        self.record.lock().unwrap().drawn_frames.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.record.lock().unwrap().clears
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn set_source_dimensions(&self, width: u32, height: u32, mirrored: bool) {
        self.record
            .lock()
            .unwrap()
            .dimension_updates
            .push((width, height, mirrored));
    }

    fn clear(&self) {
        self.record.lock().unwrap().clears += 1;
    }

    fn draw(&self, annotations: &Annotations) {
        self.record
            .lock()
            .unwrap()
            .drawn_frames
            .push(annotations.frame_number);
    }
}

/// Mock media player that records lifecycle calls
#[derive(Debug, Clone)]
pub struct MockMediaPlayer {
    call_history: Arc<Mutex<Vec<String>>>,
    failing_operation: Option<String>,
}

impl MockMediaPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            call_history: Arc::new(Mutex::new(Vec::new())),
            failing_operation: None,
        }
    }

    /// Create a mock player whose `operation` always fails
    #[must_use]
    pub fn new_failing(operation: &str) -> Self {
        let mut player = Self::new();
        player.failing_operation = Some(operation.to_string());
        player
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Clear the call history
    pub fn clear_call_history(&self) {
        self.call_history.lock().unwrap().clear();
    }

    fn record(&self, operation: &str, entry: String) -> Result<()> {
        self.call_history.lock().unwrap().push(entry);
        if self.failing_operation.as_deref() == Some(operation) {
            return Err(OverlayError::playback_operation_error(
                operation,
                None,
                "mock player failure",
            ));
        }
        Ok(())
    }
}

impl Default for MockMediaPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaPlayer for MockMediaPlayer {
    fn set_source(&mut self, uri: &str) -> Result<()> {
        self.record("set_source", format!("set_source:{}", uri))
    }

    fn prepare(&mut self) -> Result<()> {
        self.record("prepare", "prepare".to_string())
    }

    fn play(&mut self) -> Result<()> {
        self.record("play", "play".to_string())
    }

    fn pause(&mut self) -> Result<()> {
        self.record("pause", "pause".to_string())
    }

    fn stop(&mut self) -> Result<()> {
        self.record("stop", "stop".to_string())
    }

    fn release(&mut self) -> Result<()> {
        self.record("release", "release".to_string())
    }
}

/// Factory that hands out [`MockVisionProcessor`]s and keeps a handle to each
#[derive(Debug, Clone, Default)]
pub struct MockProcessorFactory {
    created: Arc<Mutex<Vec<MockVisionProcessor>>>,
    failure: Option<String>,
    auto_complete: bool,
}

impl MockProcessorFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose processors complete frames immediately
    #[must_use]
    pub fn auto_completing() -> Self {
        Self {
            auto_complete: true,
            ..Self::default()
        }
    }

    /// Factory that always fails with `reason`
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Handles to every processor created so far
    pub fn created(&self) -> Vec<MockVisionProcessor> {
        self.created.lock().unwrap().clone()
    }
}

impl ProcessorFactory for MockProcessorFactory {
    fn create_processor(
        &self,
        kind: ProcessorKind,
        _options: &ProcessorOptions,
    ) -> Result<Box<dyn VisionProcessor>> {
        if let Some(reason) = &self.failure {
            return Err(OverlayError::invalid_config(reason.clone()));
        }
        let processor = if self.auto_complete {
            MockVisionProcessor::new_auto_complete(kind.label())
        } else {
            MockVisionProcessor::new(kind.label())
        };
        self.created.lock().unwrap().push(processor.clone());
        Ok(Box::new(processor))
    }

    fn available_processors(&self) -> Vec<ProcessorKind> {
        ProcessorKind::ALL.to_vec()
    }
}
