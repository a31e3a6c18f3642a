use glow::HasContext;
use oldfilm_core::{EngineError, FrameSlot, Mat4, ProgramKind, IDENTITY};
use oldfilm_runtime::{FrameRequest, SurfaceInfo};
use tracing::{debug, info};

use crate::check::{check_gl_error, setup_failure};
use crate::offscreen::OffscreenCompositor;
use crate::program::DrawableProgram;
use crate::quad::StaticQuad;
use crate::streaming::StreamingTexture;

/// Every GPU resource of the pipeline, in acquisition order.
///
/// The host owns the context; it makes it current before calling in and swaps afterwards.
#[derive(Debug)]
pub struct GlRenderer {
    slot: FrameSlot,
    quad: StaticQuad,
    stream: StreamingTexture,
    compositor: OffscreenCompositor,
    pass_through: DrawableProgram,
    stylized: DrawableProgram,
    projection: Mat4,
}

impl GlRenderer {
    /// Builds the streaming texture, compositor and both drawers. Any failure is fatal and
    /// leaves nothing allocated.
    pub unsafe fn new(
        gl: &glow::Context,
        surface: SurfaceInfo,
        slot: FrameSlot,
    ) -> Result<Self, EngineError> {
        let mut quad = StaticQuad::new(gl)?;
        let mut stream = match StreamingTexture::new(gl) {
            Ok(s) => s,
            Err(e) => {
                quad.destroy(gl);
                return Err(e);
            }
        };
        let (w, h) = (surface.width as i32, surface.height as i32);
        let mut compositor = match OffscreenCompositor::setup(gl, w, h) {
            Ok(c) => c,
            Err(e) => {
                stream.destroy(gl);
                quad.destroy(gl);
                return Err(e);
            }
        };
        let drawers = DrawableProgram::new(gl, ProgramKind::PassThrough).and_then(|mut pt| {
            match DrawableProgram::new(gl, ProgramKind::Stylized) {
                Ok(st) => Ok((pt, st)),
                Err(e) => {
                    pt.destroy(gl);
                    Err(e)
                }
            }
        });
        let (mut pass_through, mut stylized) = match drawers {
            Ok(d) => d,
            Err(e) => {
                compositor.destroy(gl);
                stream.destroy(gl);
                quad.destroy(gl);
                return Err(e);
            }
        };
        if let Err(e) = check_gl_error(gl, "renderer setup") {
            stylized.destroy(gl);
            pass_through.destroy(gl);
            compositor.destroy(gl);
            stream.destroy(gl);
            quad.destroy(gl);
            return Err(setup_failure(e));
        }

        info!(width = w, height = h, "gl renderer ready");
        Ok(Self {
            slot,
            quad,
            stream,
            compositor,
            pass_through,
            stylized,
            projection: IDENTITY,
        })
    }

    pub unsafe fn resize(&mut self, gl: &glow::Context, surface: SurfaceInfo) -> Result<(), EngineError> {
        self.compositor
            .resize(gl, surface.width as i32, surface.height as i32)
    }

    pub fn set_projection(&mut self, projection: &Mat4) {
        self.projection = *projection;
    }

    /// acquire latest image -> clear -> composite -> draw with the started drawer.
    pub unsafe fn render(
        &mut self,
        gl: &glow::Context,
        frame: &FrameRequest<'_>,
    ) -> Result<(), EngineError> {
        if self.stream.update(gl, &self.slot) {
            debug!(position_ms = self.stream.position_ms(), "frame uploaded");
        }
        let (w, h) = (frame.viewport.width as i32, frame.viewport.height as i32);

        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.viewport(0, 0, w, h);
        gl.clear_color(0.0, 0.0, 0.0, 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

        let composited = self
            .compositor
            .composite(gl, &self.quad, self.stream.texture())?;

        self.stylized.set_parameters(frame.params);
        let drawer = if frame.switch.is_started(ProgramKind::Stylized) {
            &mut self.stylized
        } else {
            &mut self.pass_through
        };
        drawer.draw(
            gl,
            &self.quad,
            &self.projection,
            self.stream.transform(),
            composited,
            (w, h),
        )
    }

    pub fn stylized(&self) -> &DrawableProgram {
        &self.stylized
    }

    /// Drawers first, then offscreen resources.
    pub unsafe fn release(mut self, gl: &glow::Context) {
        self.stylized.destroy(gl);
        self.pass_through.destroy(gl);
        self.compositor.destroy(gl);
        self.stream.destroy(gl);
        self.quad.destroy(gl);
        info!(uploads = self.stream.uploads(), "gl renderer released");
    }
}
