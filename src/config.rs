use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use sweep_fade::FadeConfig;
use sweep_input::GestureConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("texture_size * tile_scale rounds to {0}px; tiles need at least 1px")]
    DegenerateTile(i64),
}

// Engine tuning, read from a TOML file. Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Edge of one atlas cell in texture pixels.
    pub texture_size: u32,
    /// Screen scale applied to atlas cells.
    pub tile_scale: f64,
    /// Tiles per chunk edge.
    pub partition_size: usize,
    /// Camera movement, in tiles, before a new position is reported.
    pub report_threshold_tiles: u32,
    pub deadzone_px: f64,
    pub long_press_ms: u64,
    pub fade_steps: u32,
    pub fade_interval_ms: u64,
    pub pool_soft_cap: usize,
    pub frame_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            texture_size: 128,
            tile_scale: 0.25,
            partition_size: 16,
            report_threshold_tiles: 4,
            deadzone_px: sweep_input::DEFAULT_DEADZONE_PX,
            long_press_ms: sweep_input::DEFAULT_LONG_PRESS_MS,
            fade_steps: sweep_fade::DEFAULT_FADE_STEPS,
            fade_interval_ms: sweep_fade::DEFAULT_FADE_INTERVAL_MS,
            pool_soft_cap: sweep_pool::DEFAULT_SOFT_CAP,
            frame_ms: 16,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: EngineConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texture_size == 0 {
            return Err(ConfigError::NotPositive { field: "texture_size" });
        }
        if !(self.tile_scale > 0.0) {
            return Err(ConfigError::NotPositive { field: "tile_scale" });
        }
        if self.partition_size == 0 {
            return Err(ConfigError::NotPositive { field: "partition_size" });
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::NotPositive { field: "frame_ms" });
        }
        let px = self.tile_px();
        if px < 1 {
            return Err(ConfigError::DegenerateTile(px));
        }
        Ok(())
    }

    /// On-screen tile edge in pixels.
    #[inline]
    pub fn tile_px(&self) -> i64 {
        (f64::from(self.texture_size) * self.tile_scale).round() as i64
    }

    /// Pixel span of one partition key unit.
    #[inline]
    pub fn partition_span_px(&self) -> i64 {
        self.tile_px() * self.partition_size as i64
    }

    #[inline]
    pub fn report_threshold_px(&self) -> i64 {
        self.tile_px() * i64::from(self.report_threshold_tiles)
    }

    pub fn gesture(&self) -> GestureConfig {
        GestureConfig {
            deadzone_px: self.deadzone_px,
            long_press_ms: self.long_press_ms,
        }
    }

    pub fn fade(&self) -> FadeConfig {
        FadeConfig {
            steps: self.fade_steps,
            interval_ms: self.fade_interval_ms,
        }
    }
}
