use std::ffi::CString;
use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{Display, DisplayApiPreference, GetGlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use oldfilm_core::EngineError;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawWindowHandle};
use tracing::{debug, info};
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

/// Creates the window and picks a GL config for it. No compatible config is fatal.
pub fn create_window<T>(
    event_loop: &EventLoop<T>,
    window_builder: WindowBuilder,
) -> Result<(Window, Config), EngineError> {
    let window = window_builder
        .build(event_loop)
        .map_err(|e| EngineError::Context(format!("window build: {e}")))?;
    let raw_window = window.raw_window_handle();

    let display = unsafe {
        Display::new(window.raw_display_handle(), display_preference(raw_window))
            .map_err(|e| EngineError::Context(format!("display: {e}")))?
    };
    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_depth_size(16)
        .compatible_with_native_window(raw_window)
        .build();
    let configs = unsafe {
        display
            .find_configs(template)
            .map_err(|e| EngineError::Context(format!("find_configs: {e}")))?
    };
    let gl_config = pick_config(configs)
        .ok_or_else(|| EngineError::Context("display offered no compatible GL config".into()))?;

    info!(samples = gl_config.num_samples(), "gl config selected");
    Ok((window, gl_config))
}

/// Most multisampling wins.
fn pick_config(configs: impl Iterator<Item = Config>) -> Option<Config> {
    configs.reduce(|a, b| if a.num_samples() > b.num_samples() { a } else { b })
}

#[cfg(target_os = "macos")]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(windows)]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(Some(window))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

enum ContextState {
    NotCurrent(NotCurrentContext),
    Current(PossiblyCurrentContext),
}

/// One GL context bound to at most one window surface.
///
/// Release order is surface first, then context; [`GraphicsContext::release`] enforces it.
pub struct GraphicsContext {
    config: Config,
    state: Option<ContextState>,
    surface: Option<Surface<WindowSurface>>,
}

impl std::fmt::Debug for GraphicsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            Some(ContextState::NotCurrent(_)) => "not-current",
            Some(ContextState::Current(_)) => "current",
            None => "released",
        };
        f.debug_struct("GraphicsContext")
            .field("state", &state)
            .field("surface", &self.surface.is_some())
            .finish()
    }
}

impl GraphicsContext {
    /// GL 3.3 core, optionally sharing objects with `share`.
    pub fn create(
        config: &Config,
        window: &Window,
        share: Option<&GraphicsContext>,
    ) -> Result<Self, EngineError> {
        let raw_window_handle = window.raw_window_handle();
        let builder = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core);
        let builder = match share.and_then(|s| s.state.as_ref()) {
            Some(ContextState::NotCurrent(c)) => builder.with_sharing(c),
            Some(ContextState::Current(c)) => builder.with_sharing(c),
            None => builder,
        };
        let attributes = builder.build(Some(raw_window_handle));

        let context = unsafe {
            config
                .display()
                .create_context(config, &attributes)
                .map_err(|e| EngineError::Context(format!("create_context: {e}")))?
        };
        debug!(shared = share.is_some(), "gl context created");
        Ok(Self {
            config: config.clone(),
            state: Some(ContextState::NotCurrent(context)),
            surface: None,
        })
    }

    /// Binds a drawable surface for `window`, replacing any previous one.
    pub fn attach_surface(&mut self, window: &Window) -> Result<(), EngineError> {
        self.release_surface();
        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window.raw_window_handle(),
            non_zero(size.width),
            non_zero(size.height),
        );
        let surface = unsafe {
            self.config
                .display()
                .create_window_surface(&self.config, &attrs)
                .map_err(|e| EngineError::Context(format!("create_window_surface: {e}")))?
        };
        self.surface = Some(surface);
        Ok(())
    }

    /// Binds context and surface to the calling thread.
    pub fn make_current(&mut self) -> Result<(), EngineError> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| EngineError::Context("make_current without a surface".into()))?;
        let state = match self.state.take() {
            Some(ContextState::NotCurrent(c)) => c
                .make_current(surface)
                .map_err(|e| EngineError::Context(format!("make_current: {e}")))?,
            Some(ContextState::Current(c)) => {
                let made = if c.is_current() {
                    Ok(())
                } else {
                    c.make_current(surface)
                };
                self.state = Some(ContextState::Current(c));
                return made.map_err(|e| EngineError::Context(format!("make_current: {e}")));
            }
            None => return Err(EngineError::Context("context already released".into())),
        };
        self.state = Some(ContextState::Current(state));
        Ok(())
    }

    /// Presents the frame; ends one render cycle.
    pub fn swap_buffers(&self) -> Result<(), EngineError> {
        match (&self.state, &self.surface) {
            (Some(ContextState::Current(c)), Some(s)) => s
                .swap_buffers(c)
                .map_err(|e| EngineError::Gl {
                    op: format!("swap_buffers: {e}"),
                    code: 0,
                }),
            _ => Err(EngineError::Context("swap_buffers before make_current".into())),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        if let (Some(ContextState::Current(c)), Some(s)) = (&self.state, &self.surface) {
            s.resize(c, non_zero(width), non_zero(height));
        }
    }

    /// Loads GL entry points. The context must be current.
    pub fn load_gl(&self) -> Result<glow::Context, EngineError> {
        if !matches!(self.state, Some(ContextState::Current(_))) {
            return Err(EngineError::Context("load_gl before make_current".into()));
        }
        let display = self.config.display();
        let gl = unsafe {
            glow::Context::from_loader_function(|s| match CString::new(s) {
                Ok(name) => display.get_proc_address(name.as_c_str()) as *const _,
                Err(_) => std::ptr::null(),
            })
        };
        Ok(gl)
    }

    pub fn release_surface(&mut self) {
        if let Some(ContextState::Current(c)) = self.state.take() {
            match c.make_not_current() {
                Ok(nc) => self.state = Some(ContextState::NotCurrent(nc)),
                Err(e) => debug!(error = %e, "make_not_current failed"),
            }
        }
        if self.surface.take().is_some() {
            debug!("window surface released");
        }
    }

    /// Surface, then context.
    pub fn release(mut self) {
        self.release_surface();
        self.state = None;
        info!("gl context released");
    }
}

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(v.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_sizes_never_hit_zero() {
        assert_eq!(non_zero(0).get(), 1);
        assert_eq!(non_zero(1).get(), 1);
        assert_eq!(non_zero(1920).get(), 1920);
    }

    #[test]
    fn no_configs_is_an_error_not_a_panic() {
        assert!(pick_config(std::iter::empty()).is_none());
    }
}
