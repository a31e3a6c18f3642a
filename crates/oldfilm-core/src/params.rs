use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rand::Rng;

/// Default intensity for every effect parameter.
pub const DEFAULT_INTENSITY: f32 = 0.5;

/// Width of the vignette falloff band, independent of intensity.
pub const VIGNETTE_BAND: f32 = 0.4;

/// Tunable old-film intensities, each normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameters {
    pub sepia: f32,
    pub noise: f32,
    pub scratch: f32,
    pub vignetting: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            sepia: DEFAULT_INTENSITY,
            noise: DEFAULT_INTENSITY,
            scratch: DEFAULT_INTENSITY,
            vignetting: DEFAULT_INTENSITY,
        }
    }
}

impl EffectParameters {
    /// All intensities at zero: the stylized program reduces to identity.
    pub const IDENTITY: EffectParameters = EffectParameters {
        sepia: 0.0,
        noise: 0.0,
        scratch: 0.0,
        vignetting: 0.0,
    };

    /// Returns a copy with every field clamped to `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            sepia: normalize(self.sepia).unwrap_or(DEFAULT_INTENSITY),
            noise: normalize(self.noise).unwrap_or(DEFAULT_INTENSITY),
            scratch: normalize(self.scratch).unwrap_or(DEFAULT_INTENSITY),
            vignetting: normalize(self.vignetting).unwrap_or(DEFAULT_INTENSITY),
        }
    }
}

/// Clamp to `[0, 1]`; `None` for NaN/inf.
pub fn normalize(v: f32) -> Option<f32> {
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

/// Per-draw random inputs that keep grain and flicker moving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameJitter {
    /// In `[0, 1)`, steps of 0.01.
    pub random: f32,
    /// In `[0, 2000)`, steps of 20.
    pub time_lapse: f32,
}

impl FrameJitter {
    pub const ZERO: FrameJitter = FrameJitter {
        random: 0.0,
        time_lapse: 0.0,
    };

    /// Draws a fresh sample. Called once per draw call; nothing accumulates between frames.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let random = rng.random_range(0..100u32) as f32 / 100.0;
        let time_lapse = 1000.0 * (rng.random_range(0..100u32) as f32 / 50.0);
        Self { random, time_lapse }
    }
}

/// The exact uniform values uploaded by the stylized program for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylizedUniforms {
    pub sepia: f32,
    pub noise: f32,
    pub scratch: f32,
    pub inner_vignetting: f32,
    pub outer_vignetting: f32,
    pub random: f32,
    pub time_lapse: f32,
}

impl StylizedUniforms {
    pub fn derive(params: &EffectParameters, jitter: FrameJitter) -> Self {
        Self {
            sepia: params.sepia,
            noise: params.noise,
            scratch: params.scratch,
            inner_vignetting: 1.0 - params.vignetting,
            outer_vignetting: 1.0 + VIGNETTE_BAND - params.vignetting,
            random: jitter.random,
            time_lapse: jitter.time_lapse,
        }
    }

    /// True when the shader output equals its input for every pixel.
    ///
    /// The vignette is a no-op once the inner radius reaches the corner distance (1.0 after the
    /// shader's sqrt(2) normalization).
    pub fn is_identity(&self) -> bool {
        self.sepia == 0.0 && self.noise == 0.0 && self.scratch == 0.0 && self.inner_vignetting >= 1.0
    }
}

/// Lock-free parameter block shared between the control surface and the render thread.
///
/// Setters store plain `f32` bits; the render cycle reads the whole block once per frame via
/// [`EffectControls::snapshot`].
#[derive(Debug)]
pub struct EffectControls {
    effect_enabled: AtomicBool,
    sepia: AtomicU32,
    noise: AtomicU32,
    scratch: AtomicU32,
    vignetting: AtomicU32,
}

impl Default for EffectControls {
    fn default() -> Self {
        Self::new(true, EffectParameters::default())
    }
}

impl EffectControls {
    pub fn new(effect_enabled: bool, params: EffectParameters) -> Self {
        let p = params.clamped();
        Self {
            effect_enabled: AtomicBool::new(effect_enabled),
            sepia: AtomicU32::new(p.sepia.to_bits()),
            noise: AtomicU32::new(p.noise.to_bits()),
            scratch: AtomicU32::new(p.scratch.to_bits()),
            vignetting: AtomicU32::new(p.vignetting.to_bits()),
        }
    }

    pub fn enable_effect(&self, enabled: bool) {
        self.effect_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_effect_enabled(&self) -> bool {
        self.effect_enabled.load(Ordering::Acquire)
    }

    pub fn set_sepia(&self, v: f32) {
        store("sepia", &self.sepia, v);
    }

    pub fn set_noise(&self, v: f32) {
        store("noise", &self.noise, v);
    }

    pub fn set_scratch(&self, v: f32) {
        store("scratch", &self.scratch, v);
    }

    pub fn set_vignetting(&self, v: f32) {
        store("vignetting", &self.vignetting, v);
    }

    pub fn set_all(&self, params: EffectParameters) {
        self.set_sepia(params.sepia);
        self.set_noise(params.noise);
        self.set_scratch(params.scratch);
        self.set_vignetting(params.vignetting);
    }

    pub fn snapshot(&self) -> EffectParameters {
        EffectParameters {
            sepia: load(&self.sepia),
            noise: load(&self.noise),
            scratch: load(&self.scratch),
            vignetting: load(&self.vignetting),
        }
    }
}

fn store(name: &str, slot: &AtomicU32, v: f32) {
    match normalize(v) {
        Some(v) => slot.store(v.to_bits(), Ordering::Relaxed),
        None => tracing::warn!("ignoring non-finite {name} value {v}"),
    }
}

fn load(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_are_half_intensity_with_effect_on() {
        let c = EffectControls::default();
        assert!(c.is_effect_enabled());
        assert_eq!(c.snapshot(), EffectParameters::default());
        assert_eq!(c.snapshot().sepia, 0.5);
    }

    #[test]
    fn vignetting_keeps_a_fixed_band() {
        for step in 0..=100 {
            let v = step as f32 / 100.0;
            let params = EffectParameters {
                vignetting: v,
                ..EffectParameters::default()
            };
            let u = StylizedUniforms::derive(&params, FrameJitter::ZERO);
            assert!((u.inner_vignetting - (1.0 - v)).abs() < 1e-6);
            assert!((u.outer_vignetting - (1.4 - v)).abs() < 1e-6);
            assert!((u.outer_vignetting - u.inner_vignetting - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn setters_clamp_and_reject_non_finite() {
        let c = EffectControls::default();
        c.set_noise(3.0);
        c.set_scratch(-1.0);
        c.set_sepia(f32::NAN);
        let p = c.snapshot();
        assert_eq!(p.noise, 1.0);
        assert_eq!(p.scratch, 0.0);
        assert_eq!(p.sepia, 0.5);
    }

    #[test]
    fn jitter_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let j = FrameJitter::sample(&mut rng);
            assert!((0.0..1.0).contains(&j.random));
            assert!((0.0..2000.0).contains(&j.time_lapse));
        }
    }

    #[test]
    fn jitter_is_resampled_each_call() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Vec<_> = (0..16).map(|_| FrameJitter::sample(&mut rng)).collect();
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn zero_parameters_reduce_to_identity() {
        let u = StylizedUniforms::derive(&EffectParameters::IDENTITY, FrameJitter::ZERO);
        assert!(u.is_identity());
        let u = StylizedUniforms::derive(&EffectParameters::default(), FrameJitter::ZERO);
        assert!(!u.is_identity());
    }
}
