use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutual exclusion between render cycles and surface teardown.
///
/// Render work runs inside [`RenderGuard::with_render_lock`]. Teardown calls
/// [`RenderGuard::begin_teardown`], which flags the guard and then waits for any in-flight cycle.
/// Every cycle attempted after that returns `None` without running.
#[derive(Debug, Default)]
pub struct RenderGuard {
    torn_down: AtomicBool,
    rendering: AtomicBool,
    lock: Mutex<()>,
}

/// Held while resources are being released; render cycles block or bail until it drops.
#[derive(Debug)]
pub struct TeardownGuard<'a> {
    _lock: MutexGuard<'a, ()>,
}

impl RenderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` under the render lock, or returns `None` once teardown has begun.
    pub fn with_render_lock<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if self.is_torn_down() {
            return None;
        }
        let _held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Teardown may have started while we waited for the lock.
        if self.is_torn_down() {
            return None;
        }
        self.rendering.store(true, Ordering::Release);
        let out = f();
        self.rendering.store(false, Ordering::Release);
        Some(out)
    }

    pub fn begin_teardown(&self) -> TeardownGuard<'_> {
        self.torn_down.store(true, Ordering::Release);
        TeardownGuard {
            _lock: self.lock.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// True while a closure passed to [`RenderGuard::with_render_lock`] is running.
    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }
}
