use glow::HasContext;
use oldfilm_core::{EngineError, Mat4, IDENTITY};
use tracing::{debug, info, warn};

use crate::check::{check_gl_error, setup_failure};
use crate::program::ShaderProgram;
use crate::quad::StaticQuad;
use crate::shaders;

/// Framebuffer + color texture + depth renderbuffer the streaming image is copied into.
#[derive(Debug)]
pub struct OffscreenTarget {
    pub fbo: glow::NativeFramebuffer,
    pub color: glow::NativeTexture,
    pub depth: glow::NativeRenderbuffer,
    pub w: i32,
    pub h: i32,
}

impl OffscreenTarget {
    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_framebuffer(self.fbo);
        gl.delete_renderbuffer(self.depth);
        gl.delete_texture(self.color);
    }
}

/// Allocates a complete render target. An incomplete framebuffer is a setup failure; a GL error
/// during allocation comes back as [`EngineError::Gl`] with nothing left allocated.
pub unsafe fn create_offscreen_target(
    gl: &glow::Context,
    w: i32,
    h: i32,
) -> Result<OffscreenTarget, EngineError> {
    let ww = w.max(1);
    let hh = h.max(1);

    let color = gl
        .create_texture()
        .map_err(|e| EngineError::GlCreate(format!("create_texture failed: {e:?}")))?;
    gl.bind_texture(glow::TEXTURE_2D, Some(color));
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    gl.tex_image_2d(
        glow::TEXTURE_2D,
        0,
        glow::RGBA8 as i32,
        ww,
        hh,
        0,
        glow::RGBA,
        glow::UNSIGNED_BYTE,
        None,
    );
    gl.bind_texture(glow::TEXTURE_2D, None);
    if let Err(e) = check_gl_error(gl, "offscreen tex_image_2d") {
        gl.delete_texture(color);
        return Err(e);
    }

    let depth = match gl.create_renderbuffer() {
        Ok(rb) => rb,
        Err(e) => {
            gl.delete_texture(color);
            return Err(EngineError::GlCreate(format!("create_renderbuffer failed: {e:?}")));
        }
    };
    gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
    gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, ww, hh);
    gl.bind_renderbuffer(glow::RENDERBUFFER, None);
    if let Err(e) = check_gl_error(gl, "offscreen renderbuffer_storage") {
        gl.delete_renderbuffer(depth);
        gl.delete_texture(color);
        return Err(e);
    }

    let fbo = match gl.create_framebuffer() {
        Ok(fbo) => fbo,
        Err(e) => {
            gl.delete_renderbuffer(depth);
            gl.delete_texture(color);
            return Err(EngineError::GlCreate(format!("create_framebuffer failed: {e:?}")));
        }
    };
    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
    gl.framebuffer_texture_2d(
        glow::FRAMEBUFFER,
        glow::COLOR_ATTACHMENT0,
        glow::TEXTURE_2D,
        Some(color),
        0,
    );
    gl.framebuffer_renderbuffer(
        glow::FRAMEBUFFER,
        glow::DEPTH_ATTACHMENT,
        glow::RENDERBUFFER,
        Some(depth),
    );

    let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    let mut target = OffscreenTarget {
        fbo,
        color,
        depth,
        w: ww,
        h: hh,
    };
    if let Err(e) = check_gl_error(gl, "offscreen framebuffer attach") {
        target.destroy(gl);
        return Err(e);
    }
    if status != glow::FRAMEBUFFER_COMPLETE {
        target.destroy(gl);
        return Err(EngineError::FramebufferIncomplete(status));
    }
    Ok(target)
}

/// Copies the streaming texture into a regular 2D texture sized to the output.
///
/// Rebuilt on every resize; a target is never reused at a different size.
#[derive(Debug)]
pub struct OffscreenCompositor {
    target: OffscreenTarget,
    copy: ShaderProgram,
}

impl OffscreenCompositor {
    pub unsafe fn setup(gl: &glow::Context, w: i32, h: i32) -> Result<Self, EngineError> {
        let mut copy =
            ShaderProgram::new(gl, "offscreen-copy", shaders::QUAD_VERT, shaders::PASS_THROUGH_FRAG)?;
        if let Err(e) = copy.resolve_locations(
            gl,
            &shaders::COMMON_ATTRIBUTES,
            &shaders::COMMON_UNIFORMS,
        ) {
            copy.destroy(gl);
            return Err(e);
        }
        let target = match create_offscreen_target(gl, w, h) {
            Ok(t) => t,
            Err(e) => {
                copy.destroy(gl);
                return Err(setup_failure(e));
            }
        };
        info!(w = target.w, h = target.h, "offscreen compositor ready");
        Ok(Self { target, copy })
    }

    /// Draws `source` into the offscreen target and returns its color texture.
    ///
    /// Restores the default framebuffer before returning, even on error.
    pub unsafe fn composite(
        &mut self,
        gl: &glow::Context,
        quad: &StaticQuad,
        source: glow::NativeTexture,
    ) -> Result<glow::NativeTexture, EngineError> {
        const NO_TRANSFORM: &Mat4 = &IDENTITY;

        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.target.fbo));
        gl.viewport(0, 0, self.target.w, self.target.h);
        gl.clear_color(0.0, 0.0, 0.0, 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        let drawn = self
            .copy
            .draw_quad(gl, quad, NO_TRANSFORM, NO_TRANSFORM, source, |_, _| {});
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        drawn.map(|()| self.target.color)
    }

    /// Replaces the target. On a GL error the previous target stays in place and the error is
    /// returned as transient.
    pub unsafe fn resize(&mut self, gl: &glow::Context, w: i32, h: i32) -> Result<(), EngineError> {
        if self.target.w == w.max(1) && self.target.h == h.max(1) {
            return Ok(());
        }
        let fresh = match create_offscreen_target(gl, w, h) {
            Ok(t) => t,
            Err(e) => {
                warn!(w, h, error = %e, "offscreen resize failed, keeping previous target");
                return Err(e);
            }
        };
        let mut stale = std::mem::replace(&mut self.target, fresh);
        stale.destroy(gl);
        debug!(w = self.target.w, h = self.target.h, "offscreen target resized");
        Ok(())
    }

    pub fn color_texture(&self) -> glow::NativeTexture {
        self.target.color
    }

    pub fn size(&self) -> (i32, i32) {
        (self.target.w, self.target.h)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.copy.destroy(gl);
        self.target.destroy(gl);
    }
}
