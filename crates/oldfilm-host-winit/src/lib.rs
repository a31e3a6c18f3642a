//! Host glue (policy layer).
//!
//! winit window + glutin context, the GL backend the render loop drives, player config and
//! keyboard bindings. The runtime crates stay free of windowing.

pub mod backend;
pub mod config;
pub mod context;
pub mod keys;
pub mod sink;

pub use backend::{GlBackend, GlBackendFactory};
pub use config::{Cli, PlayerConfig, WindowConfig};
pub use context::{create_window, GraphicsContext};
pub use keys::KeyBindings;
pub use sink::ProxySink;
