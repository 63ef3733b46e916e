use glam::{Vec2, Vec3};
use std::time::Duration;
use tilefield_common::{CellCoord, ConfigError, FieldConfig, TileColor, TileSize};

use crate::tile::Tile;

/// Errors from tile field operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("tile size {0} is not supported")]
    UnsupportedSize(TileSize),
    #[error("cell {cell} is outside the {width}x{height} field")]
    OutOfBounds {
        cell: CellCoord,
        width: u32,
        height: u32,
    },
    #[error("cell {0} is already occupied")]
    CellOccupied(CellCoord),
}

/// Result of one spawn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The cooldown has not elapsed; nothing changed.
    CoolingDown,
    /// A tile was placed and the cooldown restarted.
    Spawned(CellCoord),
    /// No free cell was found; the cooldown restarted anyway.
    FieldFull,
}

/// Flat plane drawn behind the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    pub center: Vec3,
    pub extent: Vec2,
    pub color: [f32; 4],
}

/// Fixed-size occupancy grid that spawns one tile per cooldown period.
///
/// Cells are stored flat at index `x * height + y`, so a linear walk over
/// the storage visits cells x-major, y-minor. The free-cell search relies on
/// that ordering.
#[derive(Debug, Clone)]
pub struct TileField {
    width: u32,
    height: u32,
    cell_size: f32,
    cells: Vec<Option<Tile>>,
    next_spawn: Duration,
    spawn_cooldown: Duration,
}

impl TileField {
    /// Create an empty field. Fails if the config does not validate.
    pub fn new(config: &FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            width: config.width,
            height: config.height,
            cell_size: config.cell_size,
            cells: vec![None; config.cell_count()],
            next_spawn: Duration::ZERO,
            spawn_cooldown: config.spawn_cooldown(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Earliest time after which the next spawn attempt may happen.
    pub fn next_spawn_time(&self) -> Duration {
        self.next_spawn
    }

    pub fn spawn_cooldown(&self) -> Duration {
        self.spawn_cooldown
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: CellCoord) -> Result<usize, FieldError> {
        if !self.contains(cell) {
            return Err(FieldError::OutOfBounds {
                cell,
                width: self.width,
                height: self.height,
            });
        }
        Ok(cell.x as usize * self.height as usize + cell.y as usize)
    }

    fn cell_at(&self, index: usize) -> CellCoord {
        let height = self.height as usize;
        CellCoord::new((index / height) as u32, (index % height) as u32)
    }

    /// Tile in `cell`, or `None` if the cell is empty or out of bounds.
    pub fn tile_at(&self, cell: CellCoord) -> Option<&Tile> {
        let index = self.index(cell).ok()?;
        self.cells[index].as_ref()
    }

    /// World-space center of `cell`, with the whole grid centered on the origin.
    pub fn cell_to_world(&self, cell: CellCoord) -> Vec3 {
        let cs = self.cell_size;
        let half_w = self.width as f32 * cs / 2.0;
        let half_h = self.height as f32 * cs / 2.0;
        Vec3::new(
            cell.x as f32 * cs + cs / 2.0 - half_w,
            cell.y as f32 * cs + cs / 2.0 - half_h,
            0.0,
        )
    }

    /// Placed tiles with their cells, in scan order.
    pub fn tiles(&self) -> impl Iterator<Item = (CellCoord, &Tile)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|tile| (self.cell_at(i), tile)))
    }

    /// The plane behind the grid, one half cell further from the camera.
    pub fn backdrop(&self) -> Backdrop {
        Backdrop {
            center: Vec3::new(0.0, 0.0, self.cell_size / 2.0),
            extent: Vec2::new(
                self.width as f32 * self.cell_size,
                self.height as f32 * self.cell_size,
            ),
            color: [0.1, 0.1, 0.1, 1.0],
        }
    }

    /// Only single-cell footprints can be placed.
    fn check_size(size: TileSize) -> Result<(), FieldError> {
        if size.footprint() == (1, 1) {
            Ok(())
        } else {
            Err(FieldError::UnsupportedSize(size))
        }
    }

    /// First empty cell able to hold a tile of `size`, scanning x ascending
    /// then y ascending.
    pub fn find_free_cell(&self, size: TileSize) -> Result<Option<CellCoord>, FieldError> {
        Self::check_size(size)?;
        Ok(self
            .cells
            .iter()
            .position(Option::is_none)
            .map(|i| self.cell_at(i)))
    }

    /// Put `tile` into `cell` and move it to the cell's world position.
    ///
    /// The grid is untouched when this returns an error.
    pub fn place_tile(&mut self, cell: CellCoord, mut tile: Tile) -> Result<&Tile, FieldError> {
        Self::check_size(tile.size())?;
        let index = self.index(cell)?;
        if self.cells[index].is_some() {
            return Err(FieldError::CellOccupied(cell));
        }

        let position = self.cell_to_world(cell);
        tile.set_position(position);
        tracing::debug!(
            %cell,
            x = position.x,
            y = position.y,
            color = %tile.color(),
            "tile placed"
        );
        let placed = self.cells[index].insert(tile);
        Ok(&*placed)
    }

    /// One spawn step at time `now`.
    ///
    /// Once `now` is past the next-spawn time, tries to place a white 1x1
    /// tile in the first free cell and restarts the cooldown from `now`
    /// whether or not a cell was free.
    pub fn step_spawn(&mut self, now: Duration) -> Result<SpawnOutcome, FieldError> {
        if now <= self.next_spawn {
            return Ok(SpawnOutcome::CoolingDown);
        }

        let outcome = match self.find_free_cell(TileSize::OneByOne)? {
            Some(cell) => {
                let tile = Tile::new(TileSize::OneByOne, TileColor::White, true);
                self.place_tile(cell, tile)?;
                SpawnOutcome::Spawned(cell)
            }
            None => {
                tracing::trace!("field full, no tile spawned");
                SpawnOutcome::FieldFull
            }
        };

        // now > next_spawn here, so the timestamp never moves backwards.
        self.next_spawn = now + self.spawn_cooldown;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(2500);

    fn field(width: u32, height: u32, cell_size: f32) -> TileField {
        TileField::new(&FieldConfig::new(width, height, cell_size)).unwrap()
    }

    fn after_cooldown(n: u64) -> Duration {
        // Strictly past every cooldown boundary.
        Duration::from_millis(1 + n * 2501)
    }

    #[test]
    fn new_field_is_empty() {
        let f = field(3, 2, 1.0);
        assert_eq!(f.cell_count(), 6);
        assert_eq!(f.occupied_count(), 0);
        assert_eq!(f.next_spawn_time(), Duration::ZERO);
        assert!(!f.is_full());
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(TileField::new(&FieldConfig::new(0, 2, 1.0)).is_err());
        assert!(TileField::new(&FieldConfig::new(2, 2, 0.0)).is_err());
    }

    #[test]
    fn oversize_config_rejected() {
        let config = FieldConfig::new(u32::MAX, u32::MAX, 1.0);
        assert!(matches!(
            TileField::new(&config),
            Err(ConfigError::TooLarge { .. })
        ));
    }

    #[test]
    fn world_position_examples() {
        let f = field(2, 2, 1.0);
        assert_eq!(f.cell_to_world(CellCoord::new(0, 0)), Vec3::new(-0.5, -0.5, 0.0));
        assert_eq!(f.cell_to_world(CellCoord::new(1, 1)), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn world_positions_centered_and_distinct() {
        let f = field(5, 3, 64.0);
        let mut seen = Vec::new();
        let (mut min, mut max) = (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN));
        for x in 0..5 {
            for y in 0..3 {
                let p = f.cell_to_world(CellCoord::new(x, y));
                assert!(!seen.contains(&p));
                seen.push(p);
                min = min.min(p);
                max = max.max(p);
            }
        }
        assert_eq!(min.x + max.x, 0.0);
        assert_eq!(min.y + max.y, 0.0);
    }

    #[test]
    fn free_cell_scan_is_x_major() {
        let mut f = field(2, 3, 1.0);
        assert_eq!(
            f.find_free_cell(TileSize::OneByOne).unwrap(),
            Some(CellCoord::new(0, 0))
        );
        for y in 0..3 {
            f.place_tile(CellCoord::new(0, y), Tile::new(TileSize::OneByOne, TileColor::Blue, true))
                .unwrap();
        }
        assert_eq!(
            f.find_free_cell(TileSize::OneByOne).unwrap(),
            Some(CellCoord::new(1, 0))
        );
    }

    #[test]
    fn free_cell_skips_to_first_hole() {
        let mut f = field(3, 3, 1.0);
        for cell in [CellCoord::new(0, 0), CellCoord::new(0, 2)] {
            f.place_tile(cell, Tile::new(TileSize::OneByOne, TileColor::Green, true))
                .unwrap();
        }
        assert_eq!(
            f.find_free_cell(TileSize::OneByOne).unwrap(),
            Some(CellCoord::new(0, 1))
        );
    }

    #[test]
    fn free_cell_unsupported_sizes() {
        let f = field(4, 4, 1.0);
        for &size in &[TileSize::TwoByTwo, TileSize::OneByTwo, TileSize::TwoByOne] {
            assert_eq!(f.find_free_cell(size), Err(FieldError::UnsupportedSize(size)));
        }
    }

    #[test]
    fn place_sets_world_position() {
        let mut f = field(8, 8, 64.0);
        let tile = f
            .place_tile(CellCoord::new(0, 7), Tile::new(TileSize::OneByOne, TileColor::Purple, true))
            .unwrap();
        assert_eq!(tile.position(), Vec3::new(-224.0, 224.0, 0.0));
        assert_eq!(
            f.tile_at(CellCoord::new(0, 7)).map(Tile::color),
            Some(TileColor::Purple)
        );
    }

    #[test]
    fn place_unsupported_size_leaves_grid_unchanged() {
        let mut f = field(2, 2, 1.0);
        let before: Vec<_> = f.tiles().map(|(c, t)| (c, t.clone())).collect();
        let err = f
            .place_tile(CellCoord::new(0, 0), Tile::new(TileSize::TwoByTwo, TileColor::White, true))
            .unwrap_err();
        assert_eq!(err, FieldError::UnsupportedSize(TileSize::TwoByTwo));
        let after: Vec<_> = f.tiles().map(|(c, t)| (c, t.clone())).collect();
        assert_eq!(before, after);
        assert_eq!(f.occupied_count(), 0);
    }

    #[test]
    fn place_out_of_bounds_rejected() {
        let mut f = field(2, 2, 1.0);
        let err = f
            .place_tile(CellCoord::new(2, 0), Tile::new(TileSize::OneByOne, TileColor::White, true))
            .unwrap_err();
        assert!(matches!(err, FieldError::OutOfBounds { width: 2, height: 2, .. }));
        assert!(f.tile_at(CellCoord::new(2, 0)).is_none());
    }

    #[test]
    fn place_into_occupied_cell_rejected() {
        let mut f = field(2, 2, 1.0);
        let cell = CellCoord::new(1, 0);
        f.place_tile(cell, Tile::new(TileSize::OneByOne, TileColor::Blue, true))
            .unwrap();
        let err = f
            .place_tile(cell, Tile::new(TileSize::OneByOne, TileColor::Orange, true))
            .unwrap_err();
        assert_eq!(err, FieldError::CellOccupied(cell));
        assert_eq!(f.tile_at(cell).map(Tile::color), Some(TileColor::Blue));
    }

    #[test]
    fn single_cell_field_spawns_white_tile() {
        let mut f = field(1, 1, 1.0);
        let outcome = f.step_spawn(Duration::from_millis(1)).unwrap();
        assert_eq!(outcome, SpawnOutcome::Spawned(CellCoord::new(0, 0)));
        let tile = f.tile_at(CellCoord::new(0, 0)).unwrap();
        assert_eq!(tile.color(), TileColor::White);
        assert_eq!(tile.size(), TileSize::OneByOne);
        assert_eq!(f.occupied_count(), 1);
    }

    #[test]
    fn no_spawn_at_exact_deadline() {
        let mut f = field(2, 2, 1.0);
        assert_eq!(f.step_spawn(Duration::ZERO).unwrap(), SpawnOutcome::CoolingDown);
        assert_eq!(f.occupied_count(), 0);
    }

    #[test]
    fn fill_order_matches_scan_order() {
        let (w, h) = (3, 4);
        let mut f = field(w, h, 1.0);
        let mut order = Vec::new();
        for n in 0..(w * h) as u64 {
            match f.step_spawn(after_cooldown(n)).unwrap() {
                SpawnOutcome::Spawned(cell) => order.push(cell),
                other => panic!("expected spawn, got {other:?}"),
            }
        }
        let expected: Vec<_> = (0..w)
            .flat_map(|x| (0..h).map(move |y| CellCoord::new(x, y)))
            .collect();
        assert_eq!(order, expected);
        assert!(f.is_full());
    }

    #[test]
    fn cooldown_limits_spawns() {
        let mut f = field(4, 4, 1.0);
        let t0 = Duration::from_millis(10);
        assert!(matches!(f.step_spawn(t0).unwrap(), SpawnOutcome::Spawned(_)));
        assert_eq!(f.next_spawn_time(), t0 + COOLDOWN);

        let t1 = t0 + Duration::from_millis(2499);
        assert_eq!(f.step_spawn(t1).unwrap(), SpawnOutcome::CoolingDown);
        assert_eq!(f.occupied_count(), 1);
        assert_eq!(f.next_spawn_time(), t0 + COOLDOWN);

        let t2 = t0 + COOLDOWN;
        assert_eq!(f.step_spawn(t2).unwrap(), SpawnOutcome::CoolingDown);

        let t3 = t2 + Duration::from_millis(1);
        assert!(matches!(f.step_spawn(t3).unwrap(), SpawnOutcome::Spawned(_)));
        assert_eq!(f.next_spawn_time(), t3 + COOLDOWN);
        assert_eq!(f.occupied_count(), 2);
    }

    #[test]
    fn full_field_still_resets_cooldown() {
        let mut f = field(1, 2, 1.0);
        f.step_spawn(after_cooldown(0)).unwrap();
        f.step_spawn(after_cooldown(1)).unwrap();
        assert!(f.is_full());

        let mut last = f.next_spawn_time();
        for n in 2..6 {
            let now = after_cooldown(n);
            assert_eq!(f.step_spawn(now).unwrap(), SpawnOutcome::FieldFull);
            assert_eq!(f.occupied_count(), 2);
            assert_eq!(f.next_spawn_time(), now + COOLDOWN);
            assert!(f.next_spawn_time() > last);
            last = f.next_spawn_time();
        }
    }

    #[test]
    fn tiles_iterate_in_scan_order() {
        let mut f = field(2, 2, 1.0);
        for cell in [CellCoord::new(1, 1), CellCoord::new(0, 1)] {
            f.place_tile(cell, Tile::new(TileSize::OneByOne, TileColor::White, true))
                .unwrap();
        }
        let cells: Vec<_> = f.tiles().map(|(c, _)| c).collect();
        assert_eq!(cells, vec![CellCoord::new(0, 1), CellCoord::new(1, 1)]);
    }

    #[test]
    fn backdrop_covers_field_behind_tiles() {
        let f = field(8, 4, 64.0);
        let b = f.backdrop();
        assert_eq!(b.extent, Vec2::new(512.0, 256.0));
        assert_eq!(b.center, Vec3::new(0.0, 0.0, 32.0));
    }
}
