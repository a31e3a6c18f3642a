use glow::HasContext;
use oldfilm_core::EngineError;
use tracing::error;

/// Drains the GL error queue after `op`, logging every pending code.
///
/// Returns the first code as [`EngineError::Gl`], which callers treat as transient.
pub unsafe fn check_gl_error(gl: &glow::Context, op: &str) -> Result<(), EngineError> {
    let mut first = None;
    // Bounded: a lost context can report errors forever.
    for _ in 0..16 {
        let code = gl.get_error();
        if code == glow::NO_ERROR {
            break;
        }
        error!(op, code = format_args!("0x{code:04x}"), "gl error");
        first.get_or_insert(code);
    }
    match first {
        None => Ok(()),
        Some(code) => Err(EngineError::Gl {
            op: op.to_string(),
            code,
        }),
    }
}

/// Promotes a transient [`EngineError::Gl`] raised while allocating resources to a fatal
/// [`EngineError::GlCreate`]. Other errors pass through.
pub fn setup_failure(err: EngineError) -> EngineError {
    match err {
        EngineError::Gl { op, code } => {
            EngineError::GlCreate(format!("{op} raised GL error 0x{code:04x}"))
        }
        other => other,
    }
}
