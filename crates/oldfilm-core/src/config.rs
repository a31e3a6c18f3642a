use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::params::{EffectParameters, DEFAULT_INTENSITY};

/// Initial effect state, usually embedded in a player config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(default = "default_enabled")]
    pub effect_enabled: bool,
    #[serde(default = "default_intensity")]
    pub sepia: f32,
    #[serde(default = "default_intensity")]
    pub noise: f32,
    #[serde(default = "default_intensity")]
    pub scratch: f32,
    #[serde(default = "default_intensity")]
    pub vignetting: f32,
}

fn default_enabled() -> bool {
    true
}
fn default_intensity() -> f32 {
    DEFAULT_INTENSITY
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            effect_enabled: true,
            sepia: DEFAULT_INTENSITY,
            noise: DEFAULT_INTENSITY,
            scratch: DEFAULT_INTENSITY,
            vignetting: DEFAULT_INTENSITY,
        }
    }
}

impl EffectConfig {
    /// Parameters clamped to `[0, 1]`.
    pub fn parameters(&self) -> EffectParameters {
        EffectParameters {
            sepia: self.sepia,
            noise: self.noise,
            scratch: self.scratch,
            vignetting: self.vignetting,
        }
        .clamped()
    }
}

/// Reads and deserializes a JSON file, mapping failures to path-carrying errors.
pub fn load_typed_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, EngineError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| EngineError::Json {
        path: path.to_path_buf(),
        source,
    })
}
