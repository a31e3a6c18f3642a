use std::sync::{Mutex, PoisonError};

use oldfilm_core::{EventSink, PipelineEvent};
use tracing::debug;
use winit::event_loop::EventLoopProxy;

/// Routes decoder events into the winit loop as user events, waking it.
#[derive(Debug)]
pub struct ProxySink(Mutex<EventLoopProxy<PipelineEvent>>);

impl ProxySink {
    pub fn new(proxy: EventLoopProxy<PipelineEvent>) -> Self {
        Self(Mutex::new(proxy))
    }
}

impl EventSink for ProxySink {
    fn post(&self, event: PipelineEvent) {
        let proxy = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if proxy.send_event(event).is_err() {
            debug!("event loop closed");
        }
    }
}
