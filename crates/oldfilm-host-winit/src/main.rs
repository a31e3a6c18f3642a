use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use oldfilm_control_osc::OscControlReceiver;
use oldfilm_core::{format_hms, layout_for, EffectControls, EventSender, PipelineEvent};
use oldfilm_host_winit::{create_window, Cli, GlBackendFactory, KeyBindings, PlayerConfig, ProxySink};
use oldfilm_input_video::FfmpegSource;
use oldfilm_runtime::VideoSurfaceHost;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::WindowBuilder;

const TICK: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = PlayerConfig::resolve(&cli).context("loading player config")?;
    info!(file = %cfg.video.file, effect = cfg.effect.effect_enabled, "starting");

    let event_loop = EventLoopBuilder::<PipelineEvent>::with_user_event().build();
    let events: EventSender = Arc::new(ProxySink::new(event_loop.create_proxy()));

    let window_builder = WindowBuilder::new()
        .with_title(cfg.window.title.clone())
        .with_inner_size(PhysicalSize::new(cfg.window.width, cfg.window.height));
    let (window, gl_config) =
        create_window(&event_loop, window_builder).context("creating window")?;
    let window = Rc::new(window);

    let mut osc = match cfg.osc.as_deref() {
        Some(addr) => match OscControlReceiver::bind(addr) {
            Ok(o) => {
                info!(addr, "OSC listening");
                Some(o)
            }
            Err(e) => {
                warn!(addr, error = %e, "OSC bind failed, continuing without");
                None
            }
        },
        None => None,
    };

    let controls = Arc::new(EffectControls::new(
        cfg.effect.effect_enabled,
        cfg.effect.parameters(),
    ));
    let mut host = VideoSurfaceHost::new(
        GlBackendFactory::new(Rc::clone(&window), gl_config),
        FfmpegSource::new(cfg.video.clone()),
        Arc::clone(&controls),
        events,
    );

    let base_size = PhysicalSize::new(cfg.window.width, cfg.window.height);
    let fit_video = cfg.window.fit_video;
    let title = cfg.window.title.clone();
    let mut keys = KeyBindings::default();
    let mut surface_live = false;
    let mut last_title = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + TICK);

        let pipeline_event = match event {
            Event::Resumed if !surface_live => {
                let size = window.inner_size();
                surface_live = true;
                Some(PipelineEvent::SurfaceCreated {
                    width: size.width.max(1),
                    height: size.height.max(1),
                })
            }
            Event::Suspended if surface_live => {
                surface_live = false;
                Some(PipelineEvent::SurfaceDestroyed)
            }
            Event::UserEvent(ev) => Some(ev),
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    host.shutdown();
                    *control_flow = ControlFlow::Exit;
                    None
                }
                WindowEvent::Resized(size) if surface_live => Some(PipelineEvent::SurfaceChanged {
                    width: size.width.max(1),
                    height: size.height.max(1),
                }),
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    let params = controls.snapshot();
                    if let Some(cmd) = keys.command_for(key, host.current_position(), &params) {
                        host.apply(cmd);
                    }
                    None
                }
                _ => None,
            },
            // Redraw the held image after expose/resize while paused.
            Event::RedrawRequested(_) if surface_live => Some(PipelineEvent::FrameAvailable),
            Event::MainEventsCleared => {
                if let Some(osc) = osc.as_mut() {
                    for cmd in osc.poll() {
                        host.apply(cmd);
                    }
                }
                if last_title.elapsed() >= Duration::from_secs(1) {
                    last_title = Instant::now();
                    window.set_title(&format!(
                        "{title} {} / {}{}",
                        format_hms(host.current_position()),
                        format_hms(host.duration()),
                        if host.is_effect_enabled() { "" } else { " (bypass)" },
                    ));
                }
                None
            }
            Event::LoopDestroyed => {
                host.shutdown();
                None
            }
            _ => None,
        };

        let Some(ev) = pipeline_event else {
            return;
        };
        let video_size = matches!(ev, PipelineEvent::VideoSizeChanged { .. });
        let resized = matches!(ev, PipelineEvent::SurfaceChanged { .. });
        if let Err(e) = host.handle_event(ev) {
            error!(error = %e, fatal = e.is_fatal(), "pipeline setup failed");
            if e.is_fatal() {
                host.shutdown();
                *control_flow = ControlFlow::Exit;
            }
            return;
        }
        if video_size && fit_video {
            let (w, h) = layout_for((base_size.width, base_size.height), host.video_size());
            window.set_inner_size(PhysicalSize::new(w, h));
        }
        if resized {
            window.request_redraw();
        }
    });
}
