use serde::{Deserialize, Serialize};

/// Integer address of one grid cell in a tile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for CellCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Footprint classification of a tile.
///
/// Only `OneByOne` is placeable today. The other variants are declared so
/// call sites match on them exhaustively and report them as unsupported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileSize {
    #[default]
    OneByOne,
    TwoByTwo,
    OneByTwo,
    TwoByOne,
}

impl TileSize {
    pub const ALL: &'static [TileSize] = &[
        TileSize::OneByOne,
        TileSize::TwoByTwo,
        TileSize::OneByTwo,
        TileSize::TwoByOne,
    ];

    /// Footprint in cells as `(width, height)`.
    pub fn footprint(self) -> (u32, u32) {
        match self {
            Self::OneByOne => (1, 1),
            Self::TwoByTwo => (2, 2),
            Self::OneByTwo => (1, 2),
            Self::TwoByOne => (2, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneByOne => "1x1",
            Self::TwoByTwo => "2x2",
            Self::OneByTwo => "1x2",
            Self::TwoByOne => "2x1",
        }
    }
}

impl std::fmt::Display for TileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Named tile colors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileColor {
    #[default]
    White,
    Green,
    Blue,
    Purple,
    Orange,
}

impl TileColor {
    pub const ALL: &'static [TileColor] = &[
        TileColor::White,
        TileColor::Green,
        TileColor::Blue,
        TileColor::Purple,
        TileColor::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Orange => "orange",
        }
    }

    /// Linear RGBA matching the CSS color of the same name.
    pub fn rgba(self) -> [f32; 4] {
        match self {
            Self::White => [1.0, 1.0, 1.0, 1.0],
            Self::Green => [0.0, 0.502, 0.0, 1.0],
            Self::Blue => [0.0, 0.0, 1.0, 1.0],
            Self::Purple => [0.502, 0.0, 0.502, 1.0],
            Self::Orange => [1.0, 0.647, 0.0, 1.0],
        }
    }
}

impl std::fmt::Display for TileColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
