//! Render loop contracts, driven through fake backends (no GPU).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use oldfilm_core::{EffectControls, EngineError, Mat4, ProgramKind, RenderState};
use oldfilm_runtime::{CycleOutcome, FrameRequest, LoopState, RenderBackend, RenderLoop, SurfaceInfo};

const SURFACE: SurfaceInfo = SurfaceInfo {
    width: 1920,
    height: 1080,
};

/// Stands in for GPU objects: touching them after release is the bug under test.
#[derive(Debug, Default)]
struct Resources {
    released: AtomicBool,
    touched_after_release: AtomicUsize,
    cycles: AtomicUsize,
    drawn: Mutex<Vec<(RenderState, RenderState)>>,
}

#[derive(Debug)]
struct ProbeBackend(Arc<Resources>);

impl RenderBackend for ProbeBackend {
    fn resize(&mut self, _surface: SurfaceInfo) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_projection(&mut self, _projection: &Mat4) {}

    fn render_cycle(&mut self, frame: &FrameRequest<'_>) -> Result<(), EngineError> {
        if self.0.released.load(Ordering::SeqCst) {
            self.0.touched_after_release.fetch_add(1, Ordering::SeqCst);
        }
        self.0.cycles.fetch_add(1, Ordering::SeqCst);
        self.0.drawn.lock().expect("drawn").push((
            frame.switch.state(ProgramKind::Stylized),
            frame.switch.state(ProgramKind::PassThrough),
        ));
        Ok(())
    }

    fn release(self) {
        self.0.released.store(true, Ordering::SeqCst);
    }
}

fn ready_loop() -> (RenderLoop<ProbeBackend>, Arc<Resources>) {
    let res = Arc::new(Resources::default());
    let mut rl = RenderLoop::new(Arc::new(EffectControls::default()));
    rl.initialize(ProbeBackend(Arc::clone(&res)), SURFACE)
        .expect("initialize");
    (rl, res)
}

#[test]
fn effect_toggle_is_exclusive_and_idempotent() {
    let (mut rl, res) = ready_loop();
    for enabled in [true, true, false, false, true] {
        rl.enable_effect(enabled);
        assert_eq!(rl.render_frame(), CycleOutcome::Rendered);
        assert_eq!(rl.is_effect_enabled(), enabled);
    }
    let drawn = res.drawn.lock().expect("drawn");
    let on = (RenderState::Started, RenderState::Stopped);
    let off = (RenderState::Stopped, RenderState::Started);
    assert_eq!(*drawn, vec![on, on, off, off, on]);
}

#[test]
fn render_after_destroy_is_a_silent_no_op() {
    let (mut rl, res) = ready_loop();
    rl.destroy();
    for _ in 0..10 {
        assert_eq!(rl.render_frame(), CycleOutcome::Rejected);
    }
    assert_eq!(rl.state(), LoopState::Destroyed);
    assert_eq!(res.cycles.load(Ordering::SeqCst), 0);
    assert_eq!(rl.stats().rejected, 10);
}

#[test]
fn teardown_racing_render_never_touches_released_resources() {
    let (mut rl, res) = ready_loop();
    let guard = rl.guard();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let renderer = {
        let res = Arc::clone(&res);
        thread::spawn(move || {
            let mut rejected = 0;
            for i in 0..20_000 {
                if i == 100 {
                    go_tx.send(()).expect("signal teardown");
                }
                if i == 5_000 {
                    done_rx.recv().expect("teardown finished");
                }
                if rl.render_frame() == CycleOutcome::Rejected {
                    rejected += 1;
                }
            }
            assert_eq!(res.touched_after_release.load(Ordering::SeqCst), 0);
            rejected
        })
    };

    go_rx.recv().expect("renderer started");
    {
        let _teardown = guard.begin_teardown();
        // Release while no cycle can be in flight.
        res.released.store(true, Ordering::SeqCst);
    }
    done_tx.send(()).expect("renderer alive");

    let rejected = renderer.join().expect("render thread");
    assert!(rejected > 0, "cycles after teardown must be rejected");
    assert_eq!(res.touched_after_release.load(Ordering::SeqCst), 0);
}
