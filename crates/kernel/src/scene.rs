use std::time::Duration;

use crate::field::{FieldError, TileField};

/// Objects advanced by the fixed-rate tick loop.
pub trait Tick {
    /// Advance one step at time `now`.
    fn tick(&mut self, now: Duration) -> Result<(), FieldError>;
}

impl Tick for TileField {
    fn tick(&mut self, now: Duration) -> Result<(), FieldError> {
        self.step_spawn(now)?;
        Ok(())
    }
}

/// Direct children of the scene root.
#[derive(Debug, Clone)]
pub enum SceneObject {
    TileField(TileField),
}

impl Tick for SceneObject {
    fn tick(&mut self, now: Duration) -> Result<(), FieldError> {
        match self {
            Self::TileField(field) => field.tick(now),
        }
    }
}

/// Root of everything that gets ticked and drawn.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    children: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, child: SceneObject) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[SceneObject] {
        &self.children
    }

    /// All tile fields among the direct children.
    pub fn tile_fields(&self) -> impl Iterator<Item = &TileField> {
        self.children.iter().map(|child| match child {
            SceneObject::TileField(field) => field,
        })
    }

    /// Tick every direct child once, in insertion order.
    ///
    /// Stops at the first error; children after it are not ticked.
    pub fn tick(&mut self, now: Duration) -> Result<(), FieldError> {
        let _span = tracing::info_span!("scene_tick", now_ms = now.as_millis() as u64).entered();
        for child in &mut self.children {
            child.tick(now)?;
        }
        Ok(())
    }
}
