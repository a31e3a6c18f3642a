use std::path::PathBuf;

use clap::Parser;
use oldfilm_core::{load_typed_json, EffectConfig, EngineError};
use oldfilm_input_video::VideoConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
    /// Shrink the window to the pillarboxed layout when the video is portrait.
    #[serde(default = "default_fit_video")]
    pub fit_video: bool,
}

fn default_width() -> u32 {
    960
}
fn default_height() -> u32 {
    540
}
fn default_title() -> String {
    "oldfilm".into()
}
fn default_fit_video() -> bool {
    true
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            fit_video: default_fit_video(),
        }
    }
}

/// Everything the player needs, as read from `--config` and then overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub video: VideoConfig,
    #[serde(default)]
    pub effect: EffectConfig,
    #[serde(default)]
    pub window: WindowConfig,
    /// UDP address for OSC control, e.g. "127.0.0.1:9000".
    #[serde(default)]
    pub osc: Option<String>,
}

/// Plays a video through the old-film shader pipeline.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "oldfilm-player", version)]
pub struct Cli {
    /// Player config JSON.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Video file; required when no config is given.
    #[arg(long)]
    pub file: Option<String>,

    /// Stop at the end instead of looping.
    #[arg(long)]
    pub no_loop: bool,

    #[arg(long)]
    pub ffmpeg: Option<String>,

    #[arg(long)]
    pub ffprobe: Option<String>,

    /// Start with the pass-through drawer.
    #[arg(long)]
    pub no_effect: bool,

    #[arg(long)]
    pub sepia: Option<f32>,

    #[arg(long)]
    pub noise: Option<f32>,

    #[arg(long)]
    pub scratch: Option<f32>,

    #[arg(long)]
    pub vignetting: Option<f32>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Listen for OSC on this address.
    #[arg(long)]
    pub osc: Option<String>,
}

impl PlayerConfig {
    pub fn resolve(cli: &Cli) -> Result<Self, EngineError> {
        let mut cfg = match (&cli.config, &cli.file) {
            (Some(path), _) => load_typed_json::<PlayerConfig>(path)?,
            (None, Some(file)) => PlayerConfig {
                video: VideoConfig::new(file.clone()),
                effect: EffectConfig::default(),
                window: WindowConfig::default(),
                osc: None,
            },
            (None, None) => {
                return Err(EngineError::InvalidConfig {
                    path: PathBuf::from("<cli>"),
                    msg: "either --config or --file is required".into(),
                })
            }
        };
        cfg.apply_overrides(cli);
        cfg.validate(cli.config.as_deref().unwrap_or(std::path::Path::new("<cli>")))?;
        Ok(cfg)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(f) = &cli.file {
            self.video.file = f.clone();
        }
        if cli.no_loop {
            self.video.r#loop = false;
        }
        if let Some(p) = &cli.ffmpeg {
            self.video.ffmpeg_path = Some(p.clone());
        }
        if let Some(p) = &cli.ffprobe {
            self.video.ffprobe_path = Some(p.clone());
        }
        if cli.no_effect {
            self.effect.effect_enabled = false;
        }
        let effect = &mut self.effect;
        for (value, slot) in [
            (cli.sepia, &mut effect.sepia),
            (cli.noise, &mut effect.noise),
            (cli.scratch, &mut effect.scratch),
            (cli.vignetting, &mut effect.vignetting),
        ] {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if let Some(w) = cli.width {
            self.window.width = w;
        }
        if let Some(h) = cli.height {
            self.window.height = h;
        }
        if cli.osc.is_some() {
            self.osc = cli.osc.clone();
        }
    }

    fn validate(&self, path: &std::path::Path) -> Result<(), EngineError> {
        let invalid = |msg: String| EngineError::InvalidConfig {
            path: path.to_path_buf(),
            msg,
        };
        self.video.validate().map_err(|e| invalid(e.to_string()))?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window width/height must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("oldfilm-player").chain(args.iter().copied()))
    }

    #[test]
    fn file_flag_alone_is_enough() {
        let cfg = PlayerConfig::resolve(&cli(&["--file", "clip.mp4"])).expect("resolve");
        assert_eq!(cfg.video.file, "clip.mp4");
        assert!(cfg.video.r#loop);
        assert!(cfg.effect.effect_enabled);
        assert_eq!(cfg.window, WindowConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = PlayerConfig::resolve(&cli(&[
            "--file",
            "clip.mp4",
            "--no-loop",
            "--no-effect",
            "--sepia",
            "0.1",
            "--width",
            "640",
            "--osc",
            "127.0.0.1:9000",
        ]))
        .expect("resolve");
        assert!(!cfg.video.r#loop);
        assert!(!cfg.effect.effect_enabled);
        assert_eq!(cfg.effect.sepia, 0.1);
        assert_eq!(cfg.effect.noise, 0.5);
        assert_eq!(cfg.window.width, 640);
        assert_eq!(cfg.osc.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn nothing_to_play_is_an_error() {
        let err = PlayerConfig::resolve(&cli(&[])).expect_err("no input");
        assert!(matches!(err, EngineError::InvalidConfig { .. }));
    }

    #[test]
    fn config_json_fills_sections_with_defaults() {
        let cfg: PlayerConfig = serde_json::from_str(
            r#"{ "video": { "file": "a.mov", "loop": false }, "effect": { "sepia": 0.0 } }"#,
        )
        .expect("parse");
        assert!(!cfg.video.r#loop);
        assert_eq!(cfg.effect.sepia, 0.0);
        assert_eq!(cfg.window.title, "oldfilm");
        assert_eq!(cfg.osc, None);
    }
}
