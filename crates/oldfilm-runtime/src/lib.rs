#![forbid(unsafe_code)]

//! Backend-agnostic render scheduling.
//!
//! This crate sequences render cycles against surface teardown and bridges surface/decoder
//! events into a [`RenderBackend`]. It never issues GPU calls itself; backends (see
//! `oldfilm-runtime-glow`) do.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod backend;
pub mod guard;
pub mod host;
pub mod render_loop;

pub use backend::{BackendFactory, FrameRequest, MediaSource, RenderBackend, SurfaceInfo};
pub use guard::{RenderGuard, TeardownGuard};
pub use host::VideoSurfaceHost;
pub use render_loop::{CycleOutcome, LoopState, LoopStats, RenderLoop};
