use std::sync::{mpsc, Arc};

/// Everything that can drive the pipeline, delivered through one inbound queue.
///
/// Surface events come from the host window, playback events from the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    SurfaceCreated { width: u32, height: u32 },
    SurfaceChanged { width: u32, height: u32 },
    SurfaceDestroyed,
    /// A decoded image is waiting in the frame slot.
    FrameAvailable,
    VideoSizeChanged { width: u32, height: u32 },
    Prepared { duration_ms: u64 },
    SeekComplete,
    Completion,
    Error(String),
}

/// Commands issued by the control surface (overlay, keyboard, OSC).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Play,
    Pause,
    TogglePlayback,
    Seek { ms: u64 },
    EnableEffect(bool),
    ToggleEffect,
    SetSepia(f32),
    SetNoise(f32),
    SetScratch(f32),
    SetVignetting(f32),
}

/// Destination for pipeline events raised off the render thread.
pub trait EventSink: Send + Sync + 'static {
    fn post(&self, event: PipelineEvent);
}

pub type EventSender = Arc<dyn EventSink>;

impl EventSink for std::sync::Mutex<mpsc::Sender<PipelineEvent>> {
    fn post(&self, event: PipelineEvent) {
        let tx = self.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if tx.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

/// Convenience: an unbounded channel wrapped as an [`EventSender`].
pub fn channel() -> (EventSender, mpsc::Receiver<PipelineEvent>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(std::sync::Mutex::new(tx)), rx)
}
