use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tilefield_common::{CellCoord, FieldConfig, FieldOverrides, TileColor};
use tilefield_kernel::{Game, GameSummary, ManualClock, SpawnOutcome, TileField};
use tilefield_render::{DebugTextRenderer, OrthoCamera, Renderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilefield-cli", about = "Headless tile field runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the default field config
    Info,
    /// Run the fixed-rate tick loop on a simulated clock and print the field
    Simulate {
        /// Number of clock steps to run
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Simulated milliseconds per step
        #[arg(long, default_value = "17")]
        step_ms: u64,
        /// Print a JSON summary instead of the text view
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        field: FieldArgs,
    },
    /// Spawn tiles until the field is full and print the fill order
    Fill {
        #[command(flatten)]
        field: FieldArgs,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// JSON field config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Field width in cells
    #[arg(long)]
    width: Option<u32>,
    /// Field height in cells
    #[arg(long)]
    height: Option<u32>,
    /// Cell edge length in world units
    #[arg(long)]
    cell_size: Option<f32>,
    /// Spawn cooldown in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,
}

impl FieldArgs {
    fn field_config(&self) -> anyhow::Result<FieldConfig> {
        let base = match &self.config {
            Some(path) => FieldConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FieldConfig::default(),
        };
        Ok(base.with_overrides(&FieldOverrides {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            spawn_cooldown_ms: self.cooldown_ms,
        })?)
    }
}

#[derive(Serialize)]
struct TileReport {
    cell: CellCoord,
    color: TileColor,
    position: [f32; 3],
}

#[derive(Serialize)]
struct SimulationReport {
    config: FieldConfig,
    summary: GameSummary,
    tiles: Vec<TileReport>,
}

fn tile_reports(field: &TileField) -> Vec<TileReport> {
    field
        .tiles()
        .map(|(cell, tile)| TileReport {
            cell,
            color: tile.color(),
            position: tile.position().to_array(),
        })
        .collect()
}

fn simulate(game: &mut Game<&ManualClock>, ticks: u64, step: Duration) -> anyhow::Result<()> {
    for _ in 0..ticks {
        game.clock().advance(step);
        game.pump()?;
    }
    Ok(())
}

/// Step the field directly, one cooldown apart, until nothing more fits.
fn fill_order(config: &FieldConfig) -> anyhow::Result<Vec<CellCoord>> {
    let mut field = TileField::new(config)?;
    let step = config.spawn_cooldown() + Duration::from_millis(1);
    let mut now = Duration::from_millis(1);
    let mut order = Vec::with_capacity(field.cell_count());
    while let SpawnOutcome::Spawned(cell) = field.step_spawn(now)? {
        order.push(cell);
        now += step;
    }
    Ok(order)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("tilefield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilefield_common::crate_info());
            println!("kernel: {}", tilefield_kernel::crate_info());
            println!("render: {}", tilefield_render::crate_info());
            println!(
                "default config: {}",
                serde_json::to_string(&FieldConfig::default())?
            );
        }
        Commands::Simulate {
            ticks,
            step_ms,
            json,
            field,
        } => {
            let config = field.field_config()?;
            let clock = ManualClock::new();
            let mut game = tilefield_kernel::init(config.clone(), &clock)?;
            simulate(&mut game, ticks, Duration::from_millis(step_ms))?;

            if json {
                let report = SimulationReport {
                    tiles: game.field().map(tile_reports).unwrap_or_default(),
                    summary: game.summary(),
                    config,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let camera = OrthoCamera::with_viewport(
                    (config.width as f32 * config.cell_size) as u32,
                    (config.height as f32 * config.cell_size) as u32,
                );
                print!("{}", DebugTextRenderer::new().render(game.scene(), &camera));
                println!("{}", game.summary());
            }
            game.shutdown();
        }
        Commands::Fill { field } => {
            let config = field.field_config()?;
            let order = fill_order(&config)?;
            println!(
                "Filled {} cells of a {}x{} field:",
                order.len(),
                config.width,
                config.height
            );
            for (n, cell) in order.iter().enumerate() {
                println!("{:>4}: {cell}", n + 1);
            }
        }
    }

    Ok(())
}
