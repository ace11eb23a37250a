use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vision_overlay::{
    Completion, Frame, FramePacer, OverlayRenderer, PacerConfig, SharedOverlay, VisionProcessor,
};

/// Completes every frame as soon as it is dispatched
struct InstantProcessor;

impl VisionProcessor for InstantProcessor {
    fn name(&self) -> &str {
        "instant"
    }

    fn process(&mut self, _frame: Frame, _overlay: Arc<dyn OverlayRenderer>, completion: Completion) {
        completion.complete();
    }

    fn stop(&mut self) {}
}

/// Never completes, so the pacer stays busy
struct StuckProcessor {
    held: Vec<Completion>,
}

impl VisionProcessor for StuckProcessor {
    fn name(&self) -> &str {
        "stuck"
    }

    fn process(&mut self, _frame: Frame, _overlay: Arc<dyn OverlayRenderer>, completion: Completion) {
        self.held.push(completion);
    }

    fn stop(&mut self) {
        for completion in self.held.drain(..) {
            completion.discard();
        }
    }
}

fn benchmark_submit_while_busy(c: &mut Criterion) {
    let (mut pacer, _completions) =
        FramePacer::new(Arc::new(SharedOverlay::new()), PacerConfig::default());
    pacer.install_processor(Box::new(StuckProcessor { held: Vec::new() }));
    let frame = Frame::solid(1280, 720, [0, 0, 0, 255], 0);
    pacer.submit(frame.clone());

    c.bench_function("submit_while_busy", |b| {
        b.iter(|| black_box(pacer.submit(black_box(frame.clone()))));
    });
}

fn benchmark_dispatch_cycle(c: &mut Criterion) {
    let (mut pacer, mut completions) =
        FramePacer::new(Arc::new(SharedOverlay::new()), PacerConfig::default());
    pacer.install_processor(Box::new(InstantProcessor));
    let frame = Frame::solid(1280, 720, [0, 0, 0, 255], 0);

    c.bench_function("submit_and_complete", |b| {
        b.iter(|| {
            pacer.submit(black_box(frame.clone()));
            while let Some(event) = completions.try_recv() {
                black_box(pacer.on_completion(event));
            }
        });
    });
}

fn benchmark_fit_to_desired_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_to_desired_size");
    let frame = Frame::solid(1920, 1080, [40, 80, 120, 255], 0);

    for desired in [360u32, 720] {
        group.bench_with_input(BenchmarkId::from_parameter(desired), &desired, |b, &desired| {
            b.iter(|| black_box(frame.fit_to_desired_size(desired)));
        });
    }

    group.finish();
}

criterion_group!(
    pacer_benches,
    benchmark_submit_while_busy,
    benchmark_dispatch_cycle,
    benchmark_fit_to_desired_size
);
criterion_main!(pacer_benches);
