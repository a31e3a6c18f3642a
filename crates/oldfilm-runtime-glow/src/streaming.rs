use glow::HasContext;
use oldfilm_core::{EngineError, FrameSlot, Mat4, VideoFrame};
use tracing::{debug, warn};

use crate::check::{check_gl_error, setup_failure};

/// Sampling transform for images uploaded top row first: `v' = 1 - v`.
pub const FLIP_V: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 1.0, 0.0, 1.0,
];

/// The texture the decoder's images land in.
///
/// Written from the [`FrameSlot`] at the start of each cycle and sampled through
/// [`StreamingTexture::transform`].
#[derive(Debug)]
pub struct StreamingTexture {
    tex: glow::NativeTexture,
    width: i32,
    height: i32,
    position_ms: u64,
    uploads: u64,
}

impl StreamingTexture {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let tex = gl
            .create_texture()
            .map_err(|e| EngineError::GlCreate(format!("create_texture failed: {e:?}")))?;
        gl.bind_texture(glow::TEXTURE_2D, Some(tex));
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        // Opaque black until the first image arrives.
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA8 as i32,
            1,
            1,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(&[0u8, 0, 0, 255][..]),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        if let Err(e) = check_gl_error(gl, "streaming texture init") {
            gl.delete_texture(tex);
            return Err(setup_failure(e));
        }
        Ok(Self {
            tex,
            width: 1,
            height: 1,
            position_ms: 0,
            uploads: 0,
        })
    }

    /// Uploads the newest image from `slot`, if any. Returns whether the texture changed.
    pub unsafe fn update(&mut self, gl: &glow::Context, slot: &FrameSlot) -> bool {
        match slot.take_latest() {
            Some(frame) => {
                self.upload(gl, &frame);
                true
            }
            None => false,
        }
    }

    unsafe fn upload(&mut self, gl: &glow::Context, frame: &VideoFrame) {
        let (w, h) = (frame.width as i32, frame.height as i32);
        let expected = frame.width as usize * frame.height as usize * 4;
        if w <= 0 || h <= 0 || frame.bytes.len() < expected {
            debug!(w, h, len = frame.bytes.len(), "short frame skipped");
            return;
        }
        let pixels = &frame.bytes[..expected];

        gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        let resized = w != self.width || h != self.height;
        if resized {
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                w,
                h,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        } else {
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                w,
                h,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            );
        }
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
        gl.bind_texture(glow::TEXTURE_2D, None);

        let op = if resized {
            "streaming tex_image_2d"
        } else {
            "streaming tex_sub_image_2d"
        };
        if check_gl_error(gl, op).is_err() {
            // Keep the previous image and size; the next frame retries.
            warn!(w, h, position_ms = frame.position_ms, "frame upload failed");
            return;
        }
        if resized {
            self.width = w;
            self.height = h;
        }
        self.position_ms = frame.position_ms;
        self.uploads += 1;
    }

    pub fn texture(&self) -> glow::NativeTexture {
        self.tex
    }

    /// Per-frame sampling correction for the current image.
    pub fn transform(&self) -> &Mat4 {
        &FLIP_V
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Presentation time of the image currently held.
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_texture(self.tex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &Mat4, u: f32, v: f32) -> (f32, f32) {
        (
            m[0] * u + m[4] * v + m[12],
            m[1] * u + m[5] * v + m[13],
        )
    }

    #[test]
    fn flip_maps_bottom_of_quad_to_last_row() {
        assert_eq!(apply(&FLIP_V, 0.0, 0.0), (0.0, 1.0));
        assert_eq!(apply(&FLIP_V, 1.0, 1.0), (1.0, 0.0));
        assert_eq!(apply(&FLIP_V, 0.25, 0.75), (0.25, 0.25));
    }
}
