use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Presentation time of this image.
    pub position_ms: u64,
    pub bytes: Vec<u8>, // RGBA, row-major, top row first, tightly packed
}

#[derive(Debug, Default)]
struct SlotInner {
    latest: Mutex<Option<VideoFrame>>,
    pending: AtomicBool,
    published: AtomicU64,
}

/// Single-image hand-off from the decoder to the render thread.
///
/// The decoder overwrites the slot with each new image; the render cycle takes whatever is newest.
/// Intermediate images are dropped when rendering falls behind.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    inner: Arc<SlotInner>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the newest image.
    ///
    /// Returns true only when the slot went from empty to pending, i.e. when the producer should
    /// raise a frame-available signal. Later publishes coalesce into that signal.
    pub fn publish(&self, frame: VideoFrame) -> bool {
        *self
            .inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.inner.published.fetch_add(1, Ordering::Relaxed);
        !self.inner.pending.swap(true, Ordering::AcqRel)
    }

    /// Takes the newest image, clearing the pending flag.
    pub fn take_latest(&self) -> Option<VideoFrame> {
        let mut guard = self
            .inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.pending.store(false, Ordering::Release);
        guard.take()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Total images ever published (dropped ones included).
    pub fn published(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pos: u64) -> VideoFrame {
        VideoFrame {
            width: 2,
            height: 1,
            position_ms: pos,
            bytes: vec![0; 8],
        }
    }

    #[test]
    fn signals_coalesce_until_taken() {
        let slot = FrameSlot::new();
        assert!(slot.publish(frame(0)));
        assert!(!slot.publish(frame(40)));
        assert!(!slot.publish(frame(80)));

        let latest = slot.take_latest().expect("pending frame");
        assert_eq!(latest.position_ms, 80);
        assert!(!slot.is_pending());
        assert_eq!(slot.published(), 3);

        assert!(slot.publish(frame(120)));
    }

    #[test]
    fn take_on_empty_slot_is_none() {
        let slot = FrameSlot::new();
        assert!(slot.take_latest().is_none());
    }
}
