//! Tile field kernel: grid occupancy, periodic spawning and the fixed-rate
//! tick loop.
//!
//! # Invariants
//! - Field dimensions never change after construction.
//! - Every cell holds at most one tile; placed tiles are never moved or removed.
//! - The next-spawn timestamp never decreases.
//! - Field and scene logic only see time through the [`Clock`] given to [`init`].

mod clock;
mod field;
mod game;
mod scene;
mod ticker;
mod tile;

pub use clock::{Clock, ManualClock, SystemClock};
pub use field::{Backdrop, FieldError, SpawnOutcome, TileField};
pub use game::{Game, GameSummary, init};
pub use scene::{Scene, SceneObject, Tick};
pub use ticker::FixedTicker;
pub use tile::{TILE_FILL, Tile};

pub fn crate_info() -> &'static str {
    concat!("tilefield-kernel v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
