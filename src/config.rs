//! Scanner configuration
//!
//! [`ScanConfig`] holds the component inputs (stroke colour, surface size,
//! stroke width). [`ScannerSettings`] wraps it with camera and loop options
//! and is loaded from TOML, with `QR_SCANNER_*` environment overrides on top.

use crate::decoder::InversionAttempts;
use crate::error::{Result, ScanError};
use crate::media::FacingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Component inputs: overlay colour, surface dimensions and stroke width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Overlay stroke colour (CSS colour string)
    pub color: String,
    /// Surface height in pixels
    pub height: u32,
    /// Surface width in pixels
    pub width: u32,
    /// Overlay stroke width in pixels
    pub line: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            color: "#008000".to_string(),
            height: 300,
            width: 450,
            line: 2.0,
        }
    }
}

/// Camera request options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Preferred camera direction
    pub facing_mode: FacingMode,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
        }
    }
}

/// Scan loop options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Target frames per second; 0 runs unthrottled
    pub fps: u32,
    /// Inversion strategy handed to the decoder
    pub inversion_attempts: InversionAttempts,
    /// Consecutive not-ready frames before a starvation warning is logged; 0 disables
    pub starvation_warn_frames: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            fps: 60,
            inversion_attempts: InversionAttempts::DontInvert,
            starvation_warn_frames: 300,
        }
    }
}

impl LoopSettings {
    /// Time budget per frame, `None` when unthrottled
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_secs_f64(1.0 / self.fps as f64))
    }
}

/// Complete scanner settings as stored on disk
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Component inputs
    pub scan: ScanConfig,
    /// Camera request options
    pub camera: CameraSettings,
    /// Scan loop options
    #[serde(rename = "loop")]
    pub frame_loop: LoopSettings,
}

fn parse_env<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse::<T>().ok())
}

impl ScannerSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded scanner settings");
        Ok(settings)
    }

    /// Render settings as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `QR_SCANNER_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Unparsable values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(width) = parse_env::<u32>(lookup("QR_SCANNER_WIDTH")) {
            self.scan.width = width;
        }
        if let Some(height) = parse_env::<u32>(lookup("QR_SCANNER_HEIGHT")) {
            self.scan.height = height;
        }
        if let Some(line) = parse_env::<f32>(lookup("QR_SCANNER_LINE")) {
            self.scan.line = line;
        }
        if let Some(color) = lookup("QR_SCANNER_COLOR") {
            let color = color.trim();
            if !color.is_empty() {
                self.scan.color = color.to_string();
            }
        }
        if let Some(fps) = parse_env::<u32>(lookup("QR_SCANNER_FPS")) {
            self.frame_loop.fps = fps;
        }
        self
    }
}
