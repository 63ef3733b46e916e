use serde::Serialize;
use std::time::Duration;
use tilefield_common::{ConfigError, FieldConfig};

use crate::clock::Clock;
use crate::field::{FieldError, TileField};
use crate::scene::{Scene, SceneObject};
use crate::ticker::FixedTicker;

/// Build a game from `config`: a scene holding one tile field, a fixed
/// ticker at `config.tick_hz`, and the given clock.
pub fn init<C: Clock>(config: FieldConfig, clock: C) -> Result<Game<C>, ConfigError> {
    let field = TileField::new(&config)?;
    let mut scene = Scene::new();
    scene.add(SceneObject::TileField(field));

    let ticker = FixedTicker::new(config.tick_period(), clock.now());
    tracing::info!(
        width = config.width,
        height = config.height,
        cell_size = config.cell_size,
        tick_hz = config.tick_hz,
        "game initialized"
    );

    Ok(Game {
        config,
        scene,
        clock,
        ticker,
    })
}

/// Owned game state: the scene, its clock and the fixed-rate tick schedule.
pub struct Game<C: Clock> {
    config: FieldConfig,
    scene: Scene,
    clock: C,
    ticker: FixedTicker,
}

impl<C: Clock> Game<C> {
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The tile field created by [`init`].
    pub fn field(&self) -> Option<&TileField> {
        self.scene.tile_fields().next()
    }

    /// Tick the scene once at the clock's current time, ignoring the schedule.
    pub fn tick(&mut self) -> Result<(), FieldError> {
        let now = self.clock.now();
        self.scene.tick(now)
    }

    /// Run one scheduled tick if the fixed ticker is due. Returns whether a
    /// tick ran.
    pub fn pump(&mut self) -> Result<bool, FieldError> {
        let now = self.clock.now();
        if !self.ticker.poll(now) {
            return Ok(false);
        }
        self.scene.tick(now)?;
        Ok(true)
    }

    /// How long until the next scheduled tick, zero if already due.
    pub fn time_until_next_tick(&self) -> Duration {
        self.ticker
            .next_deadline()
            .saturating_sub(self.clock.now())
    }

    pub fn summary(&self) -> GameSummary {
        let field = self.field();
        GameSummary {
            ticks: self.ticker.fired(),
            skipped_ticks: self.ticker.skipped(),
            occupied: field.map_or(0, TileField::occupied_count),
            cells: field.map_or(0, TileField::cell_count),
            next_spawn_ms: field.map_or(0, |f| f.next_spawn_time().as_millis() as u64),
            elapsed_ms: self.clock.now().as_millis() as u64,
        }
    }

    /// Tear the game down, returning its final state summary.
    pub fn shutdown(self) -> GameSummary {
        let summary = self.summary();
        tracing::info!(%summary, "game shut down");
        summary
    }
}

/// Point-in-time counters for logging and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub occupied: usize,
    pub cells: usize,
    pub next_spawn_ms: u64,
    pub elapsed_ms: u64,
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ticks={} skipped={} tiles={}/{} next_spawn={}ms elapsed={}ms",
            self.ticks,
            self.skipped_ticks,
            self.occupied,
            self.cells,
            self.next_spawn_ms,
            self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use tilefield_common::CellCoord;

    fn small_game(clock: &ManualClock) -> Game<&ManualClock> {
        init(FieldConfig::new(2, 2, 1.0), clock).unwrap()
    }

    #[test]
    fn init_rejects_invalid_config() {
        let clock = ManualClock::new();
        assert!(init(FieldConfig::new(0, 0, 1.0), &clock).is_err());
    }

    #[test]
    fn init_creates_one_empty_field() {
        let clock = ManualClock::new();
        let game = small_game(&clock);
        assert_eq!(game.scene().children().len(), 1);
        let field = game.field().unwrap();
        assert_eq!(field.cell_count(), 4);
        assert_eq!(field.occupied_count(), 0);
    }

    #[test]
    fn pump_waits_for_schedule() {
        let clock = ManualClock::new();
        let mut game = small_game(&clock);

        assert!(!game.pump().unwrap());
        clock.advance_ms(17);
        assert!(game.pump().unwrap());
        assert!(!game.pump().unwrap());
        assert_eq!(game.summary().ticks, 1);
        assert_eq!(game.field().unwrap().occupied_count(), 1);
    }

    #[test]
    fn spawns_follow_cooldown_at_sixty_hz() {
        let clock = ManualClock::new();
        let mut game = small_game(&clock);

        // ten seconds of ticks at ~60 Hz
        for _ in 0..600 {
            clock.advance_ms(17);
            game.pump().unwrap();
        }
        // spawns at ~17ms, ~2.5s, ~5s, ~7.5s fill all four cells
        let field = game.field().unwrap();
        assert!(field.is_full());
        assert!(field.tile_at(CellCoord::new(1, 1)).is_some());
    }

    #[test]
    fn direct_tick_ignores_schedule() {
        let clock = ManualClock::starting_at(Duration::from_millis(1));
        let mut game = small_game(&clock);
        game.tick().unwrap();
        assert_eq!(game.field().unwrap().occupied_count(), 1);
        assert_eq!(game.summary().ticks, 0);
    }

    #[test]
    fn time_until_next_tick_counts_down() {
        let clock = ManualClock::new();
        let game = small_game(&clock);
        let period = game.config().tick_period();
        assert_eq!(game.time_until_next_tick(), period);
        clock.advance(period);
        assert_eq!(game.time_until_next_tick(), Duration::ZERO);
    }

    #[test]
    fn shutdown_reports_final_state() {
        let clock = ManualClock::new();
        let mut game = small_game(&clock);
        clock.advance_ms(20);
        game.pump().unwrap();

        let summary = game.shutdown();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.occupied, 1);
        assert_eq!(summary.cells, 4);
        assert_eq!(summary.next_spawn_ms, 2520);
        assert!(summary.to_string().contains("tiles=1/4"));
    }
}
