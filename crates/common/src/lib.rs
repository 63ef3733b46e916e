//! Shared value types for the tilefield workspace.
//!
//! Everything here is plain data: tile classifications, grid cell
//! coordinates and the field configuration. Behavior lives in the kernel.

mod config;
mod types;

pub use config::{ConfigError, FieldConfig, FieldOverrides, MAX_CELLS};
pub use types::{CellCoord, TileColor, TileSize};

pub fn crate_info() -> &'static str {
    concat!("tilefield-common v", env!("CARGO_PKG_VERSION"))
}
