use std::io::Read;
use std::path::PathBuf;
use std::process::Child;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use oldfilm_core::{EngineError, EventSender, FrameSlot, PipelineEvent, VideoFrame};
use oldfilm_runtime::MediaSource;
use tracing::{debug, error, info, warn};

use crate::ffmpeg::{resolve_tool_path, run_probe, spawn_decoder, FFMPEG_ENV, FFPROBE_ENV};
use crate::probe::{parse_probe, MediaInfo};
use crate::{VideoConfig, VideoError};

#[derive(Debug, Default)]
struct Shared {
    info: Mutex<Option<MediaInfo>>,
    playing: AtomicBool,
    position_ms: AtomicU64,
    /// Bumped on every prepare/release so stale probe threads drop their result.
    generation: AtomicU64,
}

impl Shared {
    fn info(&self) -> Option<MediaInfo> {
        *self.info.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_info(&self, info: Option<MediaInfo>) {
        *self.info.lock().unwrap_or_else(PoisonError::into_inner) = info;
    }
}

/// One running ffmpeg process and the thread reading its frames.
#[derive(Debug)]
struct Session {
    stop: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Session {
    fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(child) = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            // Unblocks the reader.
            let _ = child.kill();
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

struct SessionCtx {
    ffmpeg: PathBuf,
    file: String,
    looping: bool,
    start_ms: u64,
    info: MediaInfo,
    slot: FrameSlot,
    events: EventSender,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

/// [`MediaSource`] that probes with ffprobe and decodes with ffmpeg.
///
/// `prepare` probes on a background thread; every other call returns immediately.
pub struct FfmpegSource {
    cfg: VideoConfig,
    shared: Arc<Shared>,
    target: Option<FrameSlot>,
    events: Option<EventSender>,
    session: Option<Session>,
}

impl std::fmt::Debug for FfmpegSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSource")
            .field("file", &self.cfg.file)
            .field("info", &self.shared.info())
            .field("playing", &self.is_playing())
            .field("position_ms", &self.current_position())
            .field("session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    pub fn new(cfg: VideoConfig) -> Self {
        Self {
            cfg,
            shared: Arc::default(),
            target: None,
            events: None,
            session: None,
        }
    }

    pub fn config(&self) -> &VideoConfig {
        &self.cfg
    }

    pub fn media_info(&self) -> Option<MediaInfo> {
        self.shared.info()
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }

    fn spawn_session(&mut self, info: MediaInfo, start_ms: u64) -> Result<(), VideoError> {
        let (Some(slot), Some(events)) = (self.target.clone(), self.events.clone()) else {
            return Err(VideoError::InvalidConfig("source not prepared".into()));
        };
        let stop = Arc::new(AtomicBool::new(false));
        let child = Arc::new(Mutex::new(None));
        let ctx = SessionCtx {
            ffmpeg: resolve_tool_path(self.cfg.ffmpeg_path.as_deref(), FFMPEG_ENV, "ffmpeg"),
            file: self.cfg.file.clone(),
            looping: self.cfg.r#loop,
            start_ms,
            info,
            slot,
            events,
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&stop),
            child: Arc::clone(&child),
        };
        let worker = thread::Builder::new()
            .name("oldfilm-decode".into())
            .spawn(move || decode_session(ctx))
            .map_err(|source| VideoError::Spawn {
                tool: "decode thread",
                source,
            })?;
        self.session = Some(Session {
            stop,
            child,
            worker: Some(worker),
        });
        Ok(())
    }
}

impl MediaSource for FfmpegSource {
    fn prepare(&mut self, target: FrameSlot, events: EventSender) -> Result<(), EngineError> {
        self.cfg.validate()?;
        self.stop_session();
        self.shared.set_info(None);
        self.shared.playing.store(false, Ordering::SeqCst);
        self.shared.position_ms.store(0, Ordering::SeqCst);
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.target = Some(target);
        self.events = Some(Arc::clone(&events));

        let ffprobe = resolve_tool_path(self.cfg.ffprobe_path.as_deref(), FFPROBE_ENV, "ffprobe");
        let file = self.cfg.file.clone();
        let shared = Arc::clone(&self.shared);
        info!(file = %file, ffprobe = %ffprobe.display(), "preparing media");

        thread::Builder::new()
            .name("oldfilm-probe".into())
            .spawn(move || {
                let result = run_probe(&ffprobe, &file)
                    .map_err(|source| VideoError::Spawn {
                        tool: "ffprobe",
                        source,
                    })
                    .and_then(|out| {
                        if out.status.success() {
                            parse_probe(&String::from_utf8_lossy(&out.stdout), &file)
                        } else {
                            Err(VideoError::Probe(
                                String::from_utf8_lossy(&out.stderr).trim().to_string(),
                            ))
                        }
                    });
                if shared.generation.load(Ordering::SeqCst) != generation {
                    debug!("stale probe result dropped");
                    return;
                }
                match result {
                    Ok(info) => {
                        shared.set_info(Some(info));
                        events.post(PipelineEvent::VideoSizeChanged {
                            width: info.width,
                            height: info.height,
                        });
                        events.post(PipelineEvent::Prepared {
                            duration_ms: info.duration_ms,
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "probe failed");
                        events.post(PipelineEvent::Error(e.to_string()));
                    }
                }
            })
            .map_err(|source| VideoError::Spawn {
                tool: "probe thread",
                source,
            })?;
        Ok(())
    }

    fn start(&mut self) {
        let Some(info) = self.shared.info() else {
            warn!("start before prepared");
            return;
        };
        if self.shared.playing.load(Ordering::SeqCst) && self.session.is_some() {
            return;
        }
        // Reap a session that ended on its own.
        self.stop_session();

        let mut start_ms = self.shared.position_ms.load(Ordering::SeqCst);
        if info.duration_ms > 0 && start_ms >= info.duration_ms {
            start_ms = 0;
        }
        self.shared.playing.store(true, Ordering::SeqCst);
        if let Err(e) = self.spawn_session(info, start_ms) {
            self.shared.playing.store(false, Ordering::SeqCst);
            error!(error = %e, "start failed");
            if let Some(events) = &self.events {
                events.post(PipelineEvent::Error(e.to_string()));
            }
        }
    }

    fn pause(&mut self) {
        self.stop_session();
        self.shared.playing.store(false, Ordering::SeqCst);
    }

    fn seek_to(&mut self, ms: u64) {
        let Some(info) = self.shared.info() else {
            return;
        };
        let ms = if info.duration_ms > 0 {
            ms.min(info.duration_ms)
        } else {
            ms
        };
        self.pause();
        self.shared.position_ms.store(ms, Ordering::SeqCst);
        debug!(ms, "seek");
        if let Some(events) = &self.events {
            events.post(PipelineEvent::SeekComplete);
        }
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }

    fn current_position(&self) -> u64 {
        self.shared.position_ms.load(Ordering::SeqCst)
    }

    fn duration(&self) -> u64 {
        self.shared.info().map_or(0, |i| i.duration_ms)
    }

    fn release(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_session();
        self.shared.set_info(None);
        self.shared.playing.store(false, Ordering::SeqCst);
        self.shared.position_ms.store(0, Ordering::SeqCst);
        self.target = None;
        self.events = None;
        info!(file = %self.cfg.file, "media released");
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop_session();
    }
}

fn decode_session(ctx: SessionCtx) {
    let mut start_ms = ctx.start_ms;
    let mut buf = vec![0u8; ctx.info.frame_len()];

    loop {
        let mut child = match spawn_decoder(&ctx.ffmpeg, &ctx.file, start_ms) {
            Ok(c) => c,
            Err(source) => {
                let e = VideoError::Spawn {
                    tool: "ffmpeg",
                    source,
                };
                error!(error = %e, ffmpeg = %ctx.ffmpeg.display(), "decoder failed to start");
                ctx.shared.playing.store(false, Ordering::SeqCst);
                ctx.events.post(PipelineEvent::Error(e.to_string()));
                return;
            }
        };
        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            ctx.shared.playing.store(false, Ordering::SeqCst);
            ctx.events
                .post(PipelineEvent::Error("ffmpeg stdout not piped".into()));
            return;
        };
        *ctx.child.lock().unwrap_or_else(PoisonError::into_inner) = Some(child);
        debug!(start_ms, "decoder session started");

        let mut frames = 0u64;
        while !ctx.stop.load(Ordering::SeqCst) {
            if stdout.read_exact(&mut buf).is_err() {
                break;
            }
            let position_ms = ctx.info.position_of(start_ms, frames);
            frames += 1;
            ctx.shared.position_ms.store(position_ms, Ordering::SeqCst);
            let frame = VideoFrame {
                width: ctx.info.width,
                height: ctx.info.height,
                position_ms,
                bytes: buf.clone(),
            };
            if ctx.slot.publish(frame) {
                ctx.events.post(PipelineEvent::FrameAvailable);
            }
        }

        if let Some(mut child) = ctx
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = child.kill();
            let _ = child.wait();
        }

        if ctx.stop.load(Ordering::SeqCst) {
            return;
        }

        if frames == 0 {
            ctx.shared.playing.store(false, Ordering::SeqCst);
            ctx.events.post(PipelineEvent::Error(format!(
                "ffmpeg produced no frames for {}",
                ctx.file
            )));
            return;
        }

        if ctx.looping {
            debug!(frames, "end of stream, looping");
            start_ms = 0;
            ctx.shared.position_ms.store(0, Ordering::SeqCst);
            continue;
        }

        ctx.shared.playing.store(false, Ordering::SeqCst);
        ctx.shared
            .position_ms
            .store(ctx.info.duration_ms, Ordering::SeqCst);
        info!(frames, "end of stream");
        ctx.events.post(PipelineEvent::Completion);
        return;
    }
}
