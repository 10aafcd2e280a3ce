// Configuration - famicore.toml
//
// User-facing settings: window scale and vsync, audio enable/volume, and
// keyboard bindings (stored as winit KeyCode names, e.g. "KeyX",
// "ArrowLeft"). A missing or malformed file silently falls back to the
// defaults; saving writes the whole file back.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "famicore.toml";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmulatorConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
}

/// Video settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Integer window scale (1-8)
    pub scale: u32,
    /// Wait for vertical sync
    pub vsync: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            scale: 3,
            vsync: true,
        }
    }
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Linear volume, 0.0-1.0
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            enabled: true,
            volume: 1.0,
        }
    }
}

/// Keyboard bindings for player 1, as winit KeyCode names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub a: String,
    pub b: String,
    pub select: String,
    pub start: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            a: "KeyX".into(),
            b: "KeyZ".into(),
            select: "ShiftRight".into(),
            start: "Enter".into(),
            up: "ArrowUp".into(),
            down: "ArrowDown".into(),
            left: "ArrowLeft".into(),
            right: "ArrowRight".into(),
        }
    }
}

impl EmulatorConfig {
    /// Load from the given path, falling back to defaults on any failure.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        "malformed {} ({}); using defaults",
                        path.as_ref().display(),
                        err
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Write the configuration back out.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let text = toml::to_string_pretty(self).expect("config serializes");
        fs::write(path, text)
    }

    /// Window scale clamped to a sane range
    pub fn scale(&self) -> u32 {
        self.video.scale.clamp(1, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmulatorConfig::default();
        assert_eq!(config.video.scale, 3);
        assert!(config.video.vsync);
        assert!(config.audio.enabled);
        assert_eq!(config.input.a, "KeyX");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: EmulatorConfig = toml::from_str("[video]\nscale = 2\n").unwrap();
        assert_eq!(config.video.scale, 2);
        assert!(config.video.vsync, "unspecified fields default");
        assert_eq!(config.input.start, "Enter");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = EmulatorConfig::load_or_default("/nonexistent/famicore.toml");
        assert_eq!(config.video.scale, 3);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = EmulatorConfig::default();
        config.video.scale = 4;
        config.audio.volume = 0.5;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: EmulatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.video.scale, 4);
        assert_eq!(back.audio.volume, 0.5);
    }

    #[test]
    fn test_scale_clamped() {
        let mut config = EmulatorConfig::default();
        config.video.scale = 99;
        assert_eq!(config.scale(), 8);
        config.video.scale = 0;
        assert_eq!(config.scale(), 1);
    }
}
