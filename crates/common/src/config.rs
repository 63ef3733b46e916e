use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest field, in cells, that a config may describe. The GPU instance
/// buffer is sized for this many tiles plus the backdrop.
pub const MAX_CELLS: usize = 256 * 256;

/// Errors from loading or validating a [`FieldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("field dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("field {width}x{height} exceeds the limit of {max_cells} cells")]
    TooLarge {
        width: u32,
        height: u32,
        max_cells: usize,
    },
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
    #[error("spawn cooldown must be non-zero")]
    InvalidCooldown,
    #[error("tick rate must be between 1 and 1000 Hz, got {0}")]
    InvalidTickRate(u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Startup configuration for a tile field and its tick loop.
///
/// Missing keys in a JSON document fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Edge length of one cell in world units.
    pub cell_size: f32,
    /// Minimum time between spawn attempts.
    pub spawn_cooldown_ms: u64,
    /// Fixed tick loop frequency.
    pub tick_hz: u32,
}

/// Per-run replacements for individual [`FieldConfig`] values, as given on
/// a command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub cell_size: Option<f32>,
    pub spawn_cooldown_ms: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            cell_size: 64.0,
            spawn_cooldown_ms: 2500,
            tick_hz: 60,
        }
    }
}

impl FieldConfig {
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            ..Self::default()
        }
    }

    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        if u64::from(self.width) * u64::from(self.height) > MAX_CELLS as u64 {
            return Err(ConfigError::TooLarge {
                width: self.width,
                height: self.height,
                max_cells: MAX_CELLS,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if self.spawn_cooldown_ms == 0 {
            return Err(ConfigError::InvalidCooldown);
        }
        if !(1..=1000).contains(&self.tick_hz) {
            return Err(ConfigError::InvalidTickRate(self.tick_hz));
        }
        Ok(())
    }

    /// Apply `overrides` on top of this config and validate the result.
    pub fn with_overrides(mut self, overrides: &FieldOverrides) -> Result<Self, ConfigError> {
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(cell_size) = overrides.cell_size {
            self.cell_size = cell_size;
        }
        if let Some(cooldown_ms) = overrides.spawn_cooldown_ms {
            self.spawn_cooldown_ms = cooldown_ms;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn spawn_cooldown(&self) -> Duration {
        Duration::from_millis(self.spawn_cooldown_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
