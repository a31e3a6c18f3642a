use oldfilm_core::{ControlCommand, EffectParameters};
use winit::event::VirtualKeyCode;

const SEEK_STEP_MS: u64 = 5_000;
const PARAM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Sepia,
    Noise,
    Scratch,
    Vignetting,
}

impl Param {
    fn read(self, p: &EffectParameters) -> f32 {
        match self {
            Param::Sepia => p.sepia,
            Param::Noise => p.noise,
            Param::Scratch => p.scratch,
            Param::Vignetting => p.vignetting,
        }
    }

    fn command(self, v: f32) -> ControlCommand {
        match self {
            Param::Sepia => ControlCommand::SetSepia(v),
            Param::Noise => ControlCommand::SetNoise(v),
            Param::Scratch => ControlCommand::SetScratch(v),
            Param::Vignetting => ControlCommand::SetVignetting(v),
        }
    }
}

/// Keyboard stand-in for the control overlay.
///
/// Space play/pause, E effect on/off, Left/Right seek 5s, 1-4 pick sepia/noise/scratch/
/// vignetting, Up/Down nudge the picked parameter.
#[derive(Debug, Clone, Copy)]
pub struct KeyBindings {
    selected: Param,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            selected: Param::Sepia,
        }
    }
}

impl KeyBindings {
    pub fn selected(&self) -> Param {
        self.selected
    }

    pub fn command_for(
        &mut self,
        key: VirtualKeyCode,
        position_ms: u64,
        params: &EffectParameters,
    ) -> Option<ControlCommand> {
        let selected = self.selected;
        let nudge = |by: f32| {
            let v = (selected.read(params) + by).clamp(0.0, 1.0);
            Some(selected.command(v))
        };
        match key {
            VirtualKeyCode::Space => Some(ControlCommand::TogglePlayback),
            VirtualKeyCode::E => Some(ControlCommand::ToggleEffect),
            VirtualKeyCode::Left => Some(ControlCommand::Seek {
                ms: position_ms.saturating_sub(SEEK_STEP_MS),
            }),
            VirtualKeyCode::Right => Some(ControlCommand::Seek {
                ms: position_ms + SEEK_STEP_MS,
            }),
            VirtualKeyCode::Up => nudge(PARAM_STEP),
            VirtualKeyCode::Down => nudge(-PARAM_STEP),
            VirtualKeyCode::Key1 => self.select(Param::Sepia),
            VirtualKeyCode::Key2 => self.select(Param::Noise),
            VirtualKeyCode::Key3 => self.select(Param::Scratch),
            VirtualKeyCode::Key4 => self.select(Param::Vignetting),
            _ => None,
        }
    }

    fn select(&mut self, p: Param) -> Option<ControlCommand> {
        self.selected = p;
        None
    }
}
