/// Whether a drawer issues GPU draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    Started,
    Stopped,
}

/// The two interchangeable drawable programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    PassThrough,
    Stylized,
}

impl ProgramKind {
    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::PassThrough => "pass-through",
            ProgramKind::Stylized => "stylized",
        }
    }
}

/// Selects which drawer consumes the composited frame.
///
/// Exactly one drawer is `Started` at any time; toggling stops one and starts the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawerSwitch {
    stylized: RenderState,
    pass_through: RenderState,
}

impl Default for DrawerSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DrawerSwitch {
    pub fn new(effect_enabled: bool) -> Self {
        let mut s = Self {
            stylized: RenderState::Stopped,
            pass_through: RenderState::Stopped,
        };
        s.enable_effect(effect_enabled);
        s
    }

    pub fn enable_effect(&mut self, enabled: bool) {
        if enabled {
            self.pass_through = RenderState::Stopped;
            self.stylized = RenderState::Started;
        } else {
            self.stylized = RenderState::Stopped;
            self.pass_through = RenderState::Started;
        }
    }

    pub fn is_effect_enabled(&self) -> bool {
        self.stylized == RenderState::Started
    }

    pub fn state(&self, kind: ProgramKind) -> RenderState {
        match kind {
            ProgramKind::PassThrough => self.pass_through,
            ProgramKind::Stylized => self.stylized,
        }
    }

    pub fn is_started(&self, kind: ProgramKind) -> bool {
        self.state(kind) == RenderState::Started
    }

    /// The drawer currently `Started`.
    pub fn active(&self) -> ProgramKind {
        if self.is_effect_enabled() {
            ProgramKind::Stylized
        } else {
            ProgramKind::PassThrough
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_is_on_by_default() {
        let s = DrawerSwitch::default();
        assert!(s.is_started(ProgramKind::Stylized));
        assert!(!s.is_started(ProgramKind::PassThrough));
    }

    #[test]
    fn toggle_is_exclusive_and_idempotent() {
        let mut s = DrawerSwitch::default();
        for enabled in [false, false, true, true, false] {
            s.enable_effect(enabled);
            let before = s;
            s.enable_effect(enabled);
            assert_eq!(before, s);
            assert_eq!(s.is_started(ProgramKind::Stylized), enabled);
            assert_eq!(s.is_started(ProgramKind::PassThrough), !enabled);
        }
    }
}
