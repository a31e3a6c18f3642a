//! Backend-agnostic building blocks for the old-film video pipeline.
//!
//! Nothing in this crate touches the GPU: it holds the error type, the effect parameter model,
//! aspect-fit projection math, the drawer switch, pipeline events and the frame hand-off slot
//! shared between the decoder and the render thread.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod params;
pub mod projection;
pub mod switch;
pub mod time;

pub use config::{load_typed_json, EffectConfig};
pub use error::EngineError;
pub use events::{ControlCommand, EventSender, EventSink, PipelineEvent};
pub use frame::{FrameSlot, VideoFrame};
pub use params::{EffectControls, EffectParameters, FrameJitter, StylizedUniforms};
pub use projection::{layout_for, AspectFit, Mat4, IDENTITY};
pub use switch::{DrawerSwitch, ProgramKind, RenderState};
pub use time::format_hms;
