use std::collections::HashMap;

use glow::HasContext;
use oldfilm_core::{
    EffectParameters, EngineError, FrameJitter, Mat4, ProgramKind, StylizedUniforms,
};
use tracing::debug;

use crate::check::check_gl_error;
use crate::quad::StaticQuad;
use crate::shaders;

pub unsafe fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, EngineError> {
    let vs = gl
        .create_shader(glow::VERTEX_SHADER)
        .map_err(|e| EngineError::GlCreate(format!("create_shader(VS) failed: {e:?}")))?;
    gl.shader_source(vs, vert_src);
    gl.compile_shader(vs);
    if !gl.get_shader_compile_status(vs) {
        let log = gl.get_shader_info_log(vs);
        gl.delete_shader(vs);
        return Err(EngineError::VertexCompile(log));
    }

    let fs = gl
        .create_shader(glow::FRAGMENT_SHADER)
        .map_err(|e| EngineError::GlCreate(format!("create_shader(FS) failed: {e:?}")))?;
    gl.shader_source(fs, frag_src);
    gl.compile_shader(fs);
    if !gl.get_shader_compile_status(fs) {
        let log = gl.get_shader_info_log(fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        return Err(EngineError::FragmentCompile(log));
    }

    let program = gl
        .create_program()
        .map_err(|e| EngineError::GlCreate(format!("create_program failed: {e:?}")))?;
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(EngineError::Link(log));
    }

    Ok(program)
}

/// A linked program plus its resolved attribute and uniform locations.
#[derive(Debug)]
pub struct ShaderProgram {
    pub program: glow::NativeProgram,
    label: &'static str,
    attributes: HashMap<&'static str, u32>,
    uniforms: HashMap<&'static str, glow::UniformLocation>,
}

impl ShaderProgram {
    pub unsafe fn new(
        gl: &glow::Context,
        label: &'static str,
        vert_src: &str,
        frag_src: &str,
    ) -> Result<Self, EngineError> {
        let program = compile_program(gl, vert_src, frag_src)?;
        Ok(Self {
            program,
            label,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        })
    }

    /// Resolves every name; the first one the linker dropped or never saw is an error.
    pub unsafe fn resolve_locations(
        &mut self,
        gl: &glow::Context,
        attributes: &[&'static str],
        uniforms: &[&'static str],
    ) -> Result<(), EngineError> {
        for &name in attributes {
            let loc = gl
                .get_attrib_location(self.program, name)
                .ok_or_else(|| self.missing(name))?;
            self.attributes.insert(name, loc);
        }
        for &name in uniforms {
            let loc = gl
                .get_uniform_location(self.program, name)
                .ok_or_else(|| self.missing(name))?;
            self.uniforms.insert(name, loc);
        }
        debug!(
            program = self.label,
            attributes = self.attributes.len(),
            uniforms = self.uniforms.len(),
            "locations resolved"
        );
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    fn required_attribute(&self, name: &str) -> Result<u32, EngineError> {
        self.attribute(name).ok_or_else(|| self.missing(name))
    }

    pub fn uniform(&self, name: &str) -> Option<&glow::UniformLocation> {
        self.uniforms.get(name)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Binds the program and texture, uploads the shared uniforms, draws the quad.
    ///
    /// `extra` uploads variant-specific uniforms while the program is bound. Leaves no program,
    /// texture or attribute array bound afterwards.
    pub unsafe fn draw_quad(
        &self,
        gl: &glow::Context,
        quad: &StaticQuad,
        projection: &Mat4,
        tex_transform: &Mat4,
        texture: glow::NativeTexture,
        extra: impl FnOnce(&glow::Context, &Self),
    ) -> Result<(), EngineError> {
        let position = self.required_attribute(shaders::ATTR_POSITION)?;
        let tex_coord = self.required_attribute(shaders::ATTR_TEX_COORD)?;

        gl.use_program(Some(self.program));
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.uniform_1_i32(self.uniform(shaders::U_TEXTURE), 0);
        gl.uniform_matrix_4_f32_slice(self.uniform(shaders::U_MVP), false, projection);
        gl.uniform_matrix_4_f32_slice(self.uniform(shaders::U_TEX_MATRIX), false, tex_transform);
        extra(gl, self);

        quad.draw(gl, position, tex_coord);
        let result = check_gl_error(gl, self.label);

        gl.bind_texture(glow::TEXTURE_2D, None);
        gl.use_program(None);
        result
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_program(self.program);
        self.attributes.clear();
        self.uniforms.clear();
    }

    fn missing(&self, name: &str) -> EngineError {
        EngineError::MissingLocation {
            program: self.label,
            name: name.to_string(),
        }
    }
}

/// One drawer: a program variant plus the parameters it uploads at the next draw.
#[derive(Debug)]
pub struct DrawableProgram {
    kind: ProgramKind,
    shader: ShaderProgram,
    params: EffectParameters,
    last: Option<StylizedUniforms>,
}

impl DrawableProgram {
    pub unsafe fn new(gl: &glow::Context, kind: ProgramKind) -> Result<Self, EngineError> {
        let mut shader = match kind {
            ProgramKind::PassThrough => ShaderProgram::new(
                gl,
                kind.name(),
                shaders::QUAD_VERT,
                shaders::PASS_THROUGH_FRAG,
            )?,
            ProgramKind::Stylized => {
                ShaderProgram::new(gl, kind.name(), shaders::QUAD_VERT, shaders::STYLIZED_FRAG)?
            }
        };

        let mut uniforms = shaders::COMMON_UNIFORMS.to_vec();
        if kind == ProgramKind::Stylized {
            uniforms.extend_from_slice(&shaders::STYLIZED_UNIFORMS);
        }
        if let Err(e) = shader.resolve_locations(gl, &shaders::COMMON_ATTRIBUTES, &uniforms) {
            shader.destroy(gl);
            return Err(e);
        }

        Ok(Self {
            kind,
            shader,
            params: EffectParameters::default(),
            last: None,
        })
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    /// Stored only; uploaded on the next [`DrawableProgram::draw`].
    pub fn set_parameters(&mut self, params: EffectParameters) {
        self.params = params.clamped();
    }

    pub fn parameters(&self) -> EffectParameters {
        self.params
    }

    /// Uniform values sent by the most recent stylized draw.
    pub fn last_uniforms(&self) -> Option<StylizedUniforms> {
        self.last
    }

    /// Draws `texture` into the bound framebuffer. The stylized variant re-rolls its jitter here.
    pub unsafe fn draw(
        &mut self,
        gl: &glow::Context,
        quad: &StaticQuad,
        projection: &Mat4,
        tex_transform: &Mat4,
        texture: glow::NativeTexture,
        viewport: (i32, i32),
    ) -> Result<(), EngineError> {
        gl.viewport(0, 0, viewport.0, viewport.1);
        match self.kind {
            ProgramKind::PassThrough => {
                self.shader
                    .draw_quad(gl, quad, projection, tex_transform, texture, |_, _| {})
            }
            ProgramKind::Stylized => {
                let u = StylizedUniforms::derive(&self.params, FrameJitter::sample(&mut rand::rng()));
                self.last = Some(u);
                self.shader
                    .draw_quad(gl, quad, projection, tex_transform, texture, |gl, p| {
                        gl.uniform_1_f32(p.uniform(shaders::U_SEPIA), u.sepia);
                        gl.uniform_1_f32(p.uniform(shaders::U_NOISE), u.noise);
                        gl.uniform_1_f32(p.uniform(shaders::U_SCRATCH), u.scratch);
                        gl.uniform_1_f32(p.uniform(shaders::U_INNER_VIGNETTING), u.inner_vignetting);
                        gl.uniform_1_f32(p.uniform(shaders::U_OUTER_VIGNETTING), u.outer_vignetting);
                        gl.uniform_1_f32(p.uniform(shaders::U_RANDOM), u.random);
                        gl.uniform_1_f32(p.uniform(shaders::U_TIME_LAPSE), u.time_lapse);
                    })
            }
        }
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.shader.destroy(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn unlinked(label: &'static str) -> ShaderProgram {
        ShaderProgram {
            program: glow::NativeProgram(NonZeroU32::MIN),
            label,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        }
    }

    #[test]
    fn missing_attribute_names_the_absent_one() {
        let mut prog = unlinked("pass-through");
        prog.attributes.insert(shaders::ATTR_POSITION, 0);

        assert_eq!(prog.required_attribute(shaders::ATTR_POSITION).ok(), Some(0));
        match prog.required_attribute(shaders::ATTR_TEX_COORD) {
            Err(EngineError::MissingLocation { program, name }) => {
                assert_eq!(program, "pass-through");
                assert_eq!(name, shaders::ATTR_TEX_COORD);
            }
            other => panic!("expected MissingLocation, got {other:?}"),
        }
    }
}
