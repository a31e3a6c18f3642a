use std::sync::Arc;

use oldfilm_core::{AspectFit, DrawerSwitch, EffectControls, EngineError, Mat4};
use tracing::{debug, error, info, warn};

use crate::backend::{FrameRequest, RenderBackend, SurfaceInfo};
use crate::guard::RenderGuard;

/// Lifecycle of the render loop. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Ready,
    Rendering,
    Destroyed,
}

/// What one call to [`RenderLoop::render_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered,
    /// The backend reported a transient error; the loop keeps going.
    Failed,
    /// No backend yet.
    NotReady,
    /// Teardown has begun; nothing was touched.
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub rendered: u64,
    pub failed: u64,
    pub rejected: u64,
}

/// Sequences render cycles for one surface.
///
/// Owns the backend, the drawer switch and the projection. Every cycle runs inside the
/// [`RenderGuard`], so a teardown started from another thread never overlaps a cycle.
#[derive(Debug)]
pub struct RenderLoop<B: RenderBackend> {
    guard: Arc<RenderGuard>,
    controls: Arc<EffectControls>,
    backend: Option<B>,
    state: LoopState,
    switch: DrawerSwitch,
    surface: Option<SurfaceInfo>,
    video: Option<(u32, u32)>,
    projection: Mat4,
    stats: LoopStats,
}

impl<B: RenderBackend> RenderLoop<B> {
    pub fn new(controls: Arc<EffectControls>) -> Self {
        let switch = DrawerSwitch::new(controls.is_effect_enabled());
        Self {
            guard: Arc::new(RenderGuard::new()),
            controls,
            backend: None,
            state: LoopState::Uninitialized,
            switch,
            surface: None,
            video: None,
            projection: AspectFit::FILL.matrix(),
            stats: LoopStats::default(),
        }
    }

    /// `Uninitialized -> Ready`. The backend must already hold both drawers and the compositor.
    pub fn initialize(&mut self, mut backend: B, surface: SurfaceInfo) -> Result<(), EngineError> {
        match self.state {
            LoopState::Uninitialized => {}
            LoopState::Destroyed => {
                backend.release();
                return Err(EngineError::other("render loop already destroyed"));
            }
            _ => {
                backend.release();
                return Err(EngineError::other("render loop already initialized"));
            }
        }
        self.surface = Some(surface);
        self.switch.enable_effect(self.controls.is_effect_enabled());
        self.projection = self.fit().matrix();
        backend.set_projection(&self.projection);
        self.backend = Some(backend);
        self.state = LoopState::Ready;
        info!(
            width = surface.width,
            height = surface.height,
            active = self.switch.active().name(),
            "render loop ready"
        );
        Ok(())
    }

    /// New surface size. Size-dependent buffers are rebuilt before the next cycle.
    pub fn resize(&mut self, surface: SurfaceInfo) -> Result<(), EngineError> {
        self.surface = Some(surface);
        self.projection = self.fit().matrix();
        let Self {
            guard,
            backend,
            projection,
            ..
        } = self;
        let Some(backend) = backend.as_mut() else {
            return Ok(());
        };
        guard
            .with_render_lock(|| {
                backend.resize(surface)?;
                backend.set_projection(projection);
                Ok(())
            })
            .unwrap_or(Ok(()))
    }

    pub fn set_video_size(&mut self, width: u32, height: u32) {
        self.video = Some((width, height));
        self.projection = self.fit().matrix();
        debug!(width, height, "video size changed");
        let Self {
            guard,
            backend,
            projection,
            ..
        } = self;
        if let Some(backend) = backend.as_mut() {
            guard.with_render_lock(|| backend.set_projection(projection));
        }
    }

    /// Runs one cycle: acquire -> make current -> clear -> composite -> draw active -> swap.
    pub fn render_frame(&mut self) -> CycleOutcome {
        match self.state {
            LoopState::Uninitialized => return CycleOutcome::NotReady,
            LoopState::Destroyed => {
                self.stats.rejected += 1;
                return CycleOutcome::Rejected;
            }
            LoopState::Ready | LoopState::Rendering => {}
        }
        let Some(surface) = self.surface else {
            return CycleOutcome::NotReady;
        };

        let Self {
            guard,
            controls,
            backend,
            switch,
            stats,
            ..
        } = self;
        let Some(backend) = backend.as_mut() else {
            return CycleOutcome::NotReady;
        };

        let outcome = guard.with_render_lock(|| {
            switch.enable_effect(controls.is_effect_enabled());
            let request = FrameRequest {
                switch: &*switch,
                params: controls.snapshot(),
                viewport: surface,
            };
            backend.render_cycle(&request)
        });

        match outcome {
            None => {
                stats.rejected += 1;
                debug!("render cycle rejected, teardown in progress");
                CycleOutcome::Rejected
            }
            Some(Ok(())) => {
                stats.rendered += 1;
                CycleOutcome::Rendered
            }
            Some(Err(e)) => {
                stats.failed += 1;
                error!(error = %e, "render cycle failed");
                CycleOutcome::Failed
            }
        }
    }

    /// Flips the drawers immediately and records the choice for later cycles.
    pub fn enable_effect(&mut self, enabled: bool) {
        self.controls.enable_effect(enabled);
        self.switch.enable_effect(enabled);
    }

    pub fn is_effect_enabled(&self) -> bool {
        self.switch.is_effect_enabled()
    }

    /// `* -> Destroyed`. Waits for an in-flight cycle, then releases the backend.
    pub fn destroy(&mut self) {
        if self.state == LoopState::Destroyed {
            warn!("render loop destroyed twice");
            return;
        }
        let _teardown = self.guard.begin_teardown();
        self.state = LoopState::Destroyed;
        if let Some(backend) = self.backend.take() {
            backend.release();
        }
        info!(
            rendered = self.stats.rendered,
            failed = self.stats.failed,
            rejected = self.stats.rejected,
            "render loop destroyed"
        );
    }

    /// Shared with threads that may need to start teardown.
    pub fn guard(&self) -> Arc<RenderGuard> {
        Arc::clone(&self.guard)
    }

    /// `Rendering` is read from the shared guard, so threads holding [`RenderLoop::guard`]
    /// see a cycle in flight through [`RenderGuard::is_rendering`].
    pub fn state(&self) -> LoopState {
        if self.state != LoopState::Destroyed && self.guard.is_torn_down() {
            return LoopState::Destroyed;
        }
        if self.state == LoopState::Ready && self.guard.is_rendering() {
            return LoopState::Rendering;
        }
        self.state
    }

    pub fn switch(&self) -> &DrawerSwitch {
        &self.switch
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    fn fit(&self) -> AspectFit {
        match (self.surface, self.video) {
            (Some(s), Some((vw, vh))) => AspectFit::compute(s.width, s.height, vw, vh),
            _ => AspectFit::FILL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oldfilm_core::{EffectParameters, ProgramKind};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Log {
        calls: Vec<String>,
        drawn: Vec<(ProgramKind, EffectParameters)>,
        projections: Vec<Mat4>,
        in_cycle: Vec<bool>,
    }

    #[derive(Debug)]
    struct FakeBackend {
        log: Arc<Mutex<Log>>,
        guard: Arc<RenderGuard>,
        fail_next: bool,
    }

    impl RenderBackend for FakeBackend {
        fn resize(&mut self, surface: SurfaceInfo) -> Result<(), EngineError> {
            let mut log = self.log.lock().expect("log");
            log.calls
                .push(format!("resize {}x{}", surface.width, surface.height));
            Ok(())
        }

        fn set_projection(&mut self, projection: &Mat4) {
            self.log.lock().expect("log").projections.push(*projection);
        }

        fn render_cycle(&mut self, frame: &FrameRequest<'_>) -> Result<(), EngineError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(EngineError::Gl {
                    op: "draw".into(),
                    code: 0x0502,
                });
            }
            let mut log = self.log.lock().expect("log");
            log.in_cycle.push(self.guard.is_rendering());
            log.drawn.push((frame.switch.active(), frame.params));
            Ok(())
        }

        fn release(self) {
            self.log.lock().expect("log").calls.push("release".into());
        }
    }

    fn ready_loop() -> (RenderLoop<FakeBackend>, Arc<Mutex<Log>>, Arc<EffectControls>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let controls = Arc::new(EffectControls::default());
        let mut rl = RenderLoop::new(Arc::clone(&controls));
        let guard = rl.guard();
        rl.initialize(
            FakeBackend {
                log: Arc::clone(&log),
                guard,
                fail_next: false,
            },
            SurfaceInfo {
                width: 1920,
                height: 1080,
            },
        )
        .expect("initialize");
        (rl, log, controls)
    }

    #[test]
    fn renders_nothing_before_initialize() {
        let mut rl: RenderLoop<FakeBackend> = RenderLoop::new(Arc::default());
        assert_eq!(rl.state(), LoopState::Uninitialized);
        assert_eq!(rl.render_frame(), CycleOutcome::NotReady);
    }

    #[test]
    fn draws_with_the_started_drawer_only() {
        let (mut rl, log, _) = ready_loop();
        assert_eq!(rl.render_frame(), CycleOutcome::Rendered);
        rl.enable_effect(false);
        assert_eq!(rl.render_frame(), CycleOutcome::Rendered);

        let drawn: Vec<_> = log.lock().expect("log").drawn.iter().map(|d| d.0).collect();
        assert_eq!(drawn, vec![ProgramKind::Stylized, ProgramKind::PassThrough]);
        assert_eq!(rl.state(), LoopState::Ready);
    }

    #[test]
    fn rendering_is_visible_through_the_guard_during_a_cycle() {
        let (mut rl, log, _) = ready_loop();
        rl.render_frame();
        rl.render_frame();
        assert_eq!(log.lock().expect("log").in_cycle, vec![true, true]);
        assert!(!rl.guard().is_rendering());
        assert_eq!(rl.state(), LoopState::Ready);
    }

    #[test]
    fn setter_changes_reach_the_next_cycle() {
        let (mut rl, log, controls) = ready_loop();
        controls.set_sepia(0.9);
        controls.enable_effect(false);
        rl.render_frame();

        let log = log.lock().expect("log");
        let (kind, params) = log.drawn[0];
        assert_eq!(kind, ProgramKind::PassThrough);
        assert_eq!(params.sepia, 0.9);
    }

    #[test]
    fn draw_errors_do_not_stop_the_loop() {
        let (mut rl, _, _) = ready_loop();
        rl.backend.as_mut().expect("backend").fail_next = true;
        assert_eq!(rl.render_frame(), CycleOutcome::Failed);
        assert_eq!(rl.render_frame(), CycleOutcome::Rendered);
        assert_eq!(rl.stats().failed, 1);
        assert_eq!(rl.stats().rendered, 1);
    }

    #[test]
    fn video_size_recomputes_projection() {
        let (mut rl, log, _) = ready_loop();
        rl.set_video_size(1080, 1920);
        let expected = AspectFit::compute(1920, 1080, 1080, 1920).matrix();
        assert_eq!(rl.projection(), &expected);
        assert_eq!(log.lock().expect("log").projections.last(), Some(&expected));
    }

    #[test]
    fn resize_rebuilds_backend_buffers() {
        let (mut rl, log, _) = ready_loop();
        rl.resize(SurfaceInfo {
            width: 640,
            height: 480,
        })
        .expect("resize");
        assert!(log
            .lock()
            .expect("log")
            .calls
            .contains(&"resize 640x480".to_string()));
    }

    #[test]
    fn destroy_releases_once_and_rejects_later_cycles() {
        let (mut rl, log, _) = ready_loop();
        rl.destroy();
        rl.destroy();
        assert_eq!(rl.render_frame(), CycleOutcome::Rejected);
        assert_eq!(rl.state(), LoopState::Destroyed);

        let log = log.lock().expect("log");
        assert_eq!(log.calls.iter().filter(|c| *c == "release").count(), 1);
        assert!(log.drawn.is_empty());
    }

    #[test]
    fn teardown_from_another_thread_rejects_cycles() {
        let (mut rl, log, _) = ready_loop();
        let guard = rl.guard();
        std::thread::spawn(move || drop(guard.begin_teardown()))
            .join()
            .expect("teardown thread");
        assert_eq!(rl.render_frame(), CycleOutcome::Rejected);
        assert_eq!(rl.state(), LoopState::Destroyed);
        assert!(log.lock().expect("log").drawn.is_empty());
    }
}
