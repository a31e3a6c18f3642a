use glow::HasContext;
use oldfilm_core::EngineError;

/// Interleaved `x, y, u, v` for a full-screen triangle strip.
pub const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

const STRIDE: i32 = 4 * 4;
const TEX_OFFSET: i32 = 2 * 4;

/// Static quad shared by the compositor and both drawers.
///
/// Attribute locations differ per program, so pointers are set and the arrays enabled on each
/// draw, then disabled again.
#[derive(Debug)]
pub struct StaticQuad {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

impl StaticQuad {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let vao = gl
            .create_vertex_array()
            .map_err(|e| EngineError::GlCreate(format!("create_vertex_array: {e}")))?;
        let vbo = gl
            .create_buffer()
            .map_err(|e| EngineError::GlCreate(format!("create_buffer: {e}")))?;

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_VERTICES),
            glow::STATIC_DRAW,
        );
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok(Self { vao, vbo })
    }

    pub unsafe fn draw(&self, gl: &glow::Context, position: u32, tex_coord: u32) {
        gl.bind_vertex_array(Some(self.vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));

        gl.vertex_attrib_pointer_f32(position, 2, glow::FLOAT, false, STRIDE, 0);
        gl.enable_vertex_attrib_array(position);
        gl.vertex_attrib_pointer_f32(tex_coord, 2, glow::FLOAT, false, STRIDE, TEX_OFFSET);
        gl.enable_vertex_attrib_array(tex_coord);

        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

        gl.disable_vertex_attrib_array(position);
        gl.disable_vertex_attrib_array(tex_coord);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.vbo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_covers_clip_space_with_matching_uvs() {
        let verts: Vec<_> = QUAD_VERTICES.chunks(4).collect();
        assert_eq!(verts.len(), 4);
        for v in verts {
            assert_eq!(v[2], (v[0] + 1.0) / 2.0);
            assert_eq!(v[3], (v[1] + 1.0) / 2.0);
        }
        let bytes: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        assert_eq!(bytes.len() as i32, STRIDE * 4);
    }
}
