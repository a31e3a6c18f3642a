//! OpenGL (glow) backend for the old-film pipeline.
//
// GPU objects only: program compilation, the static quad, the streaming texture, the offscreen
// compositor and the two drawers. Context creation and buffer swaps belong to the host.
#![allow(clippy::missing_safety_doc)]
#![deny(missing_debug_implementations)]

pub mod check;
pub mod offscreen;
pub mod program;
pub mod quad;
pub mod renderer;
pub mod shaders;
pub mod streaming;

pub use check::{check_gl_error, setup_failure};
pub use offscreen::{create_offscreen_target, OffscreenCompositor, OffscreenTarget};
pub use program::{compile_program, DrawableProgram, ShaderProgram};
pub use quad::StaticQuad;
pub use renderer::GlRenderer;
pub use streaming::StreamingTexture;

pub use oldfilm_core::EngineError;
