use oldfilm_core::{DrawerSwitch, EffectParameters, EngineError, EventSender, FrameSlot, Mat4};

/// Size of the drawable surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
}

/// Inputs for one render cycle.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    /// Which drawer is `Started`; the backend draws with that one only.
    pub switch: &'a DrawerSwitch,
    pub params: EffectParameters,
    pub viewport: SurfaceInfo,
}

/// A GPU pipeline the render loop drives.
///
/// All methods run on the render thread while the render lock is held.
pub trait RenderBackend {
    /// Re-creates size-dependent resources. Stale-sized buffers must not survive this call.
    fn resize(&mut self, surface: SurfaceInfo) -> Result<(), EngineError>;

    fn set_projection(&mut self, projection: &Mat4);

    /// acquire latest image -> make current -> clear -> composite -> draw active -> swap.
    fn render_cycle(&mut self, frame: &FrameRequest<'_>) -> Result<(), EngineError>;

    /// Releases drawers, offscreen resources, surface and context, in that order.
    fn release(self);
}

/// Builds a backend once a native surface exists.
pub trait BackendFactory {
    type Backend: RenderBackend;

    /// `stream` is the slot the decoder writes into; the backend samples it each cycle.
    fn create(
        &mut self,
        surface: SurfaceInfo,
        stream: FrameSlot,
    ) -> Result<Self::Backend, EngineError>;
}

/// The media decoder collaborator.
///
/// `prepare` is asynchronous: success or failure arrives later as `Prepared` or `Error` events.
pub trait MediaSource {
    fn prepare(&mut self, target: FrameSlot, events: EventSender) -> Result<(), EngineError>;
    fn start(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, ms: u64);
    fn is_playing(&self) -> bool;
    fn current_position(&self) -> u64;
    fn duration(&self) -> u64;
    fn release(&mut self);
}
