//! Rendering adapter: renderer-agnostic interface over the tile scene.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Everything drawn derives from scene state plus the camera.
//!
//! Backends consume a [`DrawList`] built from the scene; the debug text
//! renderer reads the scene directly.

mod camera;
mod draw;
mod renderer;

pub use camera::OrthoCamera;
pub use draw::{CLEAR_COLOR, DrawItem, DrawList, Primitive};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    concat!("tilefield-render v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
