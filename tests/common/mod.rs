//! Shared test doubles for the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use vision_overlay::{
    Completion, Frame, MediaPlayer, OverlayError, OverlayRenderer, ProcessorFactory,
    ProcessorKind, ProcessorOptions, Result, VisionProcessor,
};

/// Processor that keeps completions until the test releases them
#[derive(Clone, Default)]
pub struct HeldProcessor {
    name: String,
    dispatched: Arc<Mutex<Vec<u64>>>,
    held: Arc<Mutex<VecDeque<Completion>>>,
    stopped: Arc<Mutex<bool>>,
}

impl HeldProcessor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn dispatched(&self) -> Vec<u64> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn complete_next(&self) -> bool {
        let next = self.held.lock().unwrap().pop_front();
        next.map(Completion::complete).is_some()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap()
    }
}

impl VisionProcessor for HeldProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, frame: Frame, _overlay: Arc<dyn OverlayRenderer>, completion: Completion) {
        if *self.stopped.lock().unwrap() {
            completion.discard();
            return;
        }
        self.dispatched.lock().unwrap().push(frame.frame_number());
        self.held.lock().unwrap().push_back(completion);
    }

    fn stop(&mut self) {
        *self.stopped.lock().unwrap() = true;
        // Held work is abandoned without notifying
        for completion in self.held.lock().unwrap().drain(..) {
            completion.discard();
        }
    }
}

/// Factory handing out [`HeldProcessor`]s, optionally failing
#[derive(Clone, Default)]
pub struct HeldFactory {
    created: Arc<Mutex<Vec<HeldProcessor>>>,
    failure: Option<String>,
}

impl HeldFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn created(&self) -> Vec<HeldProcessor> {
        self.created.lock().unwrap().clone()
    }
}

impl ProcessorFactory for HeldFactory {
    fn create_processor(
        &self,
        kind: ProcessorKind,
        _options: &ProcessorOptions,
    ) -> Result<Box<dyn VisionProcessor>> {
        if let Some(reason) = &self.failure {
            return Err(OverlayError::invalid_config(reason.clone()));
        }
        let processor = HeldProcessor::new(kind.label());
        self.created.lock().unwrap().push(processor.clone());
        Ok(Box::new(processor))
    }

    fn available_processors(&self) -> Vec<ProcessorKind> {
        ProcessorKind::ALL.to_vec()
    }
}

/// Media player that records lifecycle calls
#[derive(Clone, Default)]
pub struct RecordingPlayer {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl MediaPlayer for RecordingPlayer {
    fn set_source(&mut self, uri: &str) -> Result<()> {
        self.record(format!("set_source:{}", uri))
    }

    fn prepare(&mut self) -> Result<()> {
        self.record("prepare".to_string())
    }

    fn play(&mut self) -> Result<()> {
        self.record("play".to_string())
    }

    fn pause(&mut self) -> Result<()> {
        self.record("pause".to_string())
    }

    fn stop(&mut self) -> Result<()> {
        self.record("stop".to_string())
    }

    fn release(&mut self) -> Result<()> {
        self.record("release".to_string())
    }
}

pub fn frame(number: u64, width: u32, height: u32) -> Frame {
    Frame::solid(width, height, [0, 0, 0, 255], number)
}
