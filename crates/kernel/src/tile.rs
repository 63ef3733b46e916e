use glam::Vec3;
use serde::Serialize;
use tilefield_common::{TileColor, TileSize};

/// Edge length of a tile cube relative to the cell it sits in.
pub const TILE_FILL: f32 = 0.8;

/// A block occupying one cell of a [`TileField`](crate::TileField).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    size: TileSize,
    color: TileColor,
    solid: bool,
    /// World position, assigned when the tile is placed.
    position: Vec3,
}

impl Tile {
    pub fn new(size: TileSize, color: TileColor, solid: bool) -> Self {
        Self {
            size,
            color,
            solid,
            position: Vec3::ZERO,
        }
    }

    pub fn size(&self) -> TileSize {
        self.size
    }

    pub fn color(&self) -> TileColor {
        self.color
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tile_sits_at_origin() {
        let tile = Tile::new(TileSize::OneByOne, TileColor::Orange, true);
        assert_eq!(tile.position(), Vec3::ZERO);
        assert_eq!(tile.color(), TileColor::Orange);
        assert!(tile.is_solid());
    }
}
