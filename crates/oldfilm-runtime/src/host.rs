use std::sync::Arc;

use oldfilm_core::{
    layout_for, ControlCommand, EffectControls, EngineError, EventSender, FrameSlot,
    PipelineEvent,
};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendFactory, MediaSource, SurfaceInfo};
use crate::render_loop::{CycleOutcome, LoopState, RenderLoop};

/// Bridges surface lifecycle and decoder events into the render loop, and exposes
/// playback/effect controls to the overlay.
///
/// Owns the streaming frame slot handed to the decoder.
pub struct VideoSurfaceHost<F: BackendFactory, M: MediaSource> {
    factory: F,
    media: M,
    events: EventSender,
    stream: FrameSlot,
    controls: Arc<EffectControls>,
    render_loop: RenderLoop<F::Backend>,
    window: Option<SurfaceInfo>,
    video: Option<(u32, u32)>,
    media_open: bool,
    prepared: bool,
    completed: bool,
    last_error: Option<String>,
}

impl<F: BackendFactory, M: MediaSource> std::fmt::Debug for VideoSurfaceHost<F, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSurfaceHost")
            .field("state", &self.render_loop.state())
            .field("window", &self.window)
            .field("video", &self.video)
            .field("prepared", &self.prepared)
            .field("completed", &self.completed)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<F, M> VideoSurfaceHost<F, M>
where
    F: BackendFactory,
    M: MediaSource,
{
    /// `events` is where the decoder posts its notifications; feed them back into
    /// [`VideoSurfaceHost::handle_event`] on the render thread.
    pub fn new(factory: F, media: M, controls: Arc<EffectControls>, events: EventSender) -> Self {
        Self {
            factory,
            media,
            events,
            stream: FrameSlot::new(),
            render_loop: RenderLoop::new(Arc::clone(&controls)),
            controls,
            window: None,
            video: None,
            media_open: false,
            prepared: false,
            completed: false,
            last_error: None,
        }
    }

    /// Dispatches one event. Errors returned here are fatal setup failures.
    pub fn handle_event(&mut self, event: PipelineEvent) -> Result<(), EngineError> {
        match event {
            PipelineEvent::SurfaceCreated { width, height } => {
                self.surface_created(SurfaceInfo { width, height })?
            }
            PipelineEvent::SurfaceChanged { width, height } => {
                let surface = SurfaceInfo { width, height };
                self.window = Some(surface);
                self.render_loop.resize(surface)?;
            }
            PipelineEvent::SurfaceDestroyed => self.surface_destroyed(),
            PipelineEvent::FrameAvailable => {
                if self.render_loop.render_frame() == CycleOutcome::NotReady {
                    debug!("frame available before surface");
                }
            }
            PipelineEvent::VideoSizeChanged { width, height } => {
                self.video = Some((width, height));
                self.render_loop.set_video_size(width, height);
                let (lw, lh) = self.layout_size();
                info!(width, height, layout_w = lw, layout_h = lh, "video size");
            }
            PipelineEvent::Prepared { duration_ms } => {
                info!(duration_ms, "media prepared");
                self.prepared = true;
                self.completed = false;
                self.media.start();
            }
            PipelineEvent::SeekComplete => {
                if self.prepared {
                    self.media.start();
                }
            }
            PipelineEvent::Completion => {
                info!("playback complete");
                self.completed = true;
            }
            PipelineEvent::Error(msg) => {
                error!(error = %msg, "playback error");
                self.last_error = Some(msg);
            }
        }
        Ok(())
    }

    fn surface_created(&mut self, surface: SurfaceInfo) -> Result<(), EngineError> {
        match self.render_loop.state() {
            LoopState::Ready | LoopState::Rendering => {
                debug!(
                    width = surface.width,
                    height = surface.height,
                    "surface already live; ignoring repeated create"
                );
                return Ok(());
            }
            LoopState::Uninitialized | LoopState::Destroyed => {}
        }
        if self.render_loop.state() == LoopState::Destroyed {
            self.render_loop = RenderLoop::new(Arc::clone(&self.controls));
            if let Some((w, h)) = self.video {
                self.render_loop.set_video_size(w, h);
            }
        }
        self.window = Some(surface);

        let backend = self.factory.create(surface, self.stream.clone())?;
        self.render_loop.initialize(backend, surface)?;

        if !self.media_open {
            if let Err(e) = self.media.prepare(self.stream.clone(), Arc::clone(&self.events)) {
                warn!(error = %e, "media prepare failed");
                self.events.post(PipelineEvent::Error(e.to_string()));
            } else {
                self.media_open = true;
            }
        }
        Ok(())
    }

    fn surface_destroyed(&mut self) {
        self.render_loop.destroy();
        if self.media_open {
            self.media.release();
            self.media_open = false;
        }
        self.prepared = false;
    }

    /// Tears everything down; later events are ignored by the destroyed loop.
    pub fn shutdown(&mut self) {
        if self.render_loop.state() != LoopState::Destroyed || self.media_open {
            self.surface_destroyed();
        }
    }

    pub fn play(&mut self) {
        if self.prepared {
            self.completed = false;
            self.media.start();
        }
    }

    pub fn pause(&mut self) {
        if self.prepared && self.media.is_playing() {
            self.media.pause();
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek_to(&mut self, ms: u64) {
        if self.prepared && self.media.is_playing() {
            self.media.seek_to(ms);
        } else {
            debug!(ms, "seek ignored while not playing");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.prepared && self.media.is_playing()
    }

    pub fn current_position(&self) -> u64 {
        if self.prepared {
            self.media.current_position()
        } else {
            0
        }
    }

    pub fn duration(&self) -> u64 {
        if self.prepared {
            self.media.duration()
        } else {
            0
        }
    }

    pub fn enable_effect(&mut self, enabled: bool) {
        self.render_loop.enable_effect(enabled);
    }

    pub fn is_effect_enabled(&self) -> bool {
        self.controls.is_effect_enabled()
    }

    pub fn set_sepia(&self, v: f32) {
        self.controls.set_sepia(v);
    }

    pub fn set_noise(&self, v: f32) {
        self.controls.set_noise(v);
    }

    pub fn set_scratch(&self, v: f32) {
        self.controls.set_scratch(v);
    }

    pub fn set_vignetting(&self, v: f32) {
        self.controls.set_vignetting(v);
    }

    pub fn apply(&mut self, command: ControlCommand) {
        debug!(?command, "control");
        match command {
            ControlCommand::Play => self.play(),
            ControlCommand::Pause => self.pause(),
            ControlCommand::TogglePlayback => self.toggle_playback(),
            ControlCommand::Seek { ms } => self.seek_to(ms),
            ControlCommand::EnableEffect(on) => self.enable_effect(on),
            ControlCommand::ToggleEffect => self.enable_effect(!self.is_effect_enabled()),
            ControlCommand::SetSepia(v) => self.set_sepia(v),
            ControlCommand::SetNoise(v) => self.set_noise(v),
            ControlCommand::SetScratch(v) => self.set_scratch(v),
            ControlCommand::SetVignetting(v) => self.set_vignetting(v),
        }
    }

    /// Preferred surface size: portrait video is pillarboxed to the window height.
    pub fn layout_size(&self) -> (u32, u32) {
        let window = self.window.map_or((0, 0), |s| (s.width, s.height));
        layout_for(window, self.video)
    }

    /// Last size the decoder reported.
    pub fn video_size(&self) -> Option<(u32, u32)> {
        self.video
    }

    pub fn controls(&self) -> Arc<EffectControls> {
        Arc::clone(&self.controls)
    }

    /// The slot the decoder writes into.
    pub fn stream(&self) -> &FrameSlot {
        &self.stream
    }

    pub fn render_loop(&self) -> &RenderLoop<F::Backend> {
        &self.render_loop
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
