use std::fmt::Write;
use tilefield_common::CellCoord;
use tilefield_kernel::{Scene, TileField};

use crate::camera::OrthoCamera;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` through `camera`.
    fn render(&self, scene: &Scene, camera: &OrthoCamera) -> Self::Output;
}

/// Text renderer for the CLI, logs and tests.
///
/// Draws each field as a character map, top row first, followed by one line
/// per tile.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &OrthoCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Camera: left={:.1} right={:.1} top={:.1} bottom={:.1}",
            camera.left, camera.right, camera.top, camera.bottom
        );
        for field in scene.tile_fields() {
            write_field(&mut out, field);
        }
        out
    }
}

fn write_field(out: &mut String, field: &TileField) {
    let _ = writeln!(
        out,
        "=== Field {}x{} (cell={}, tiles={}/{}, next_spawn={}ms) ===",
        field.width(),
        field.height(),
        field.cell_size(),
        field.occupied_count(),
        field.cell_count(),
        field.next_spawn_time().as_millis()
    );

    for y in (0..field.height()).rev() {
        let row: String = (0..field.width())
            .map(|x| match field.tile_at(CellCoord::new(x, y)) {
                Some(tile) => tile.color().name().chars().next().unwrap_or('#'),
                None => '.',
            })
            .collect();
        let _ = writeln!(out, "{row}");
    }

    for (cell, tile) in field.tiles() {
        let p = tile.position();
        let _ = writeln!(
            out,
            "  {cell} {} {} pos=({:.2}, {:.2}, {:.2})",
            tile.size(),
            tile.color(),
            p.x,
            p.y,
            p.z
        );
    }
}
