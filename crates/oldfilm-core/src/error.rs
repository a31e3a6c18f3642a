use std::path::PathBuf;

/// Errors shared by every oldfilm crate.
///
/// Setup failures (context, shaders, locations, framebuffers) are fatal and abort pipeline
/// initialization. `Gl` and `Media` are transient: they are logged and playback continues.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ---- Setup (fatal) ----
    #[error("graphics context setup failed: {0}")]
    Context(String),

    #[error("vertex shader compile error: {0}")]
    VertexCompile(String),

    #[error("fragment shader compile error: {0}")]
    FragmentCompile(String),

    #[error("program link error: {0}")]
    Link(String),

    #[error("program '{program}' has no active location for required '{name}'")]
    MissingLocation { program: &'static str, name: String },

    #[error("framebuffer incomplete: 0x{0:x}")]
    FramebufferIncomplete(u32),

    #[error("backend object creation failed: {0}")]
    GlCreate(String),

    // ---- Runtime (transient) ----
    #[error("GL error 0x{code:x} after {op}")]
    Gl { op: String, code: u32 },

    #[error("media error: {0}")]
    Media(String),

    // ---- Config ----
    #[error("invalid config at {}: {msg}", path.display())]
    InvalidConfig { path: PathBuf, msg: String },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json parse error at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn other<T: Into<String>>(s: T) -> Self {
        EngineError::Other(s.into())
    }

    /// True for errors that must abort pipeline setup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::Gl { .. } | EngineError::Media(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_errors_are_transient() {
        let gl = EngineError::Gl {
            op: "glDrawArrays".into(),
            code: 0x502,
        };
        assert!(!gl.is_fatal());
        assert!(!EngineError::Media("decode".into()).is_fatal());
    }

    #[test]
    fn setup_errors_are_fatal() {
        assert!(EngineError::FramebufferIncomplete(0x8cd6).is_fatal());
        assert!(EngineError::Link("bad".into()).is_fatal());
        let missing = EngineError::MissingLocation {
            program: "stylized",
            name: "SepiaValue".into(),
        };
        assert!(missing.is_fatal());
        assert!(missing.to_string().contains("SepiaValue"));
    }
}
