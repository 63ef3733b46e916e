//! wgpu render backend for the tile scene.
//!
//! Draws a [`DrawList`](tilefield_render::DrawList): the backdrop as an
//! instanced quad and every tile as an instanced cube, flat-colored, through
//! an [`OrthoCamera`](tilefield_render::OrthoCamera).
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Frame rate is independent of the fixed tick rate.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
