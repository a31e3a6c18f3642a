use std::rc::Rc;

use glutin::config::Config;
use oldfilm_core::{EngineError, FrameSlot, Mat4};
use oldfilm_runtime::{BackendFactory, FrameRequest, RenderBackend, SurfaceInfo};
use oldfilm_runtime_glow::GlRenderer;
use tracing::{info, warn};
use winit::window::Window;

use crate::context::GraphicsContext;

/// [`RenderBackend`] over a glutin context and the glow renderer.
#[derive(Debug)]
pub struct GlBackend {
    context: GraphicsContext,
    gl: glow::Context,
    renderer: GlRenderer,
}

impl RenderBackend for GlBackend {
    fn resize(&mut self, surface: SurfaceInfo) -> Result<(), EngineError> {
        self.context.make_current()?;
        self.context.resize(surface.width, surface.height);
        unsafe { self.renderer.resize(&self.gl, surface) }
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.renderer.set_projection(projection);
    }

    fn render_cycle(&mut self, frame: &FrameRequest<'_>) -> Result<(), EngineError> {
        self.context.make_current()?;
        unsafe { self.renderer.render(&self.gl, frame)? };
        self.context.swap_buffers()
    }

    fn release(self) {
        let Self {
            mut context,
            gl,
            renderer,
        } = self;
        match context.make_current() {
            Ok(()) => unsafe { renderer.release(&gl) },
            // Objects die with the context.
            Err(e) => warn!(error = %e, "context lost before release"),
        }
        context.release();
    }
}

/// Builds a [`GlBackend`] for the host window each time the surface is created.
#[derive(Debug)]
pub struct GlBackendFactory {
    window: Rc<Window>,
    config: Config,
}

impl GlBackendFactory {
    pub fn new(window: Rc<Window>, config: Config) -> Self {
        Self { window, config }
    }
}

impl BackendFactory for GlBackendFactory {
    type Backend = GlBackend;

    fn create(&mut self, surface: SurfaceInfo, stream: FrameSlot) -> Result<GlBackend, EngineError> {
        let mut context = GraphicsContext::create(&self.config, &self.window, None)?;
        let built = context
            .attach_surface(&self.window)
            .and_then(|()| context.make_current())
            .and_then(|()| context.load_gl())
            .and_then(|gl| unsafe { GlRenderer::new(&gl, surface, stream) }.map(|r| (gl, r)));
        match built {
            Ok((gl, renderer)) => {
                info!(width = surface.width, height = surface.height, "gl backend created");
                Ok(GlBackend {
                    context,
                    gl,
                    renderer,
                })
            }
            Err(e) => {
                context.release();
                Err(e)
            }
        }
    }
}
