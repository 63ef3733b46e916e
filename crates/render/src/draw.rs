use glam::{Mat4, Quat, Vec3};
use tilefield_kernel::{Scene, TILE_FILL, TileField};

/// Background color the frame is cleared to.
pub const CLEAR_COLOR: [f32; 4] = [0.95, 0.95, 0.95, 1.0];

/// Unit primitive a draw item scales and places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Unit square in the XY plane, centered on the origin.
    Quad,
    /// Unit cube centered on the origin.
    Cube,
}

/// One flat-colored primitive in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub primitive: Primitive,
    pub center: Vec3,
    pub scale: Vec3,
    pub color: [f32; 4],
}

impl DrawItem {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.center)
    }
}

/// Everything a backend needs to draw one frame, derived from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub clear_color: [f32; 4],
    pub items: Vec<DrawItem>,
}

impl DrawList {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut items = Vec::new();
        for field in scene.tile_fields() {
            push_field(&mut items, field);
        }
        Self {
            clear_color: CLEAR_COLOR,
            items,
        }
    }

    pub fn count(&self, primitive: Primitive) -> usize {
        self.items.iter().filter(|i| i.primitive == primitive).count()
    }
}

fn push_field(items: &mut Vec<DrawItem>, field: &TileField) {
    let backdrop = field.backdrop();
    items.push(DrawItem {
        primitive: Primitive::Quad,
        center: backdrop.center,
        scale: backdrop.extent.extend(1.0),
        color: backdrop.color,
    });

    let edge = field.cell_size() * TILE_FILL;
    for (_, tile) in field.tiles() {
        items.push(DrawItem {
            primitive: Primitive::Cube,
            center: tile.position(),
            scale: Vec3::splat(edge),
            color: tile.color().rgba(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tilefield_common::FieldConfig;
    use tilefield_kernel::SceneObject;

    fn scene_with_tiles(spawns: u64) -> Scene {
        let mut field = TileField::new(&FieldConfig::new(4, 4, 10.0)).unwrap();
        for n in 0..spawns {
            field
                .step_spawn(Duration::from_millis(1 + n * 3000))
                .unwrap();
        }
        let mut scene = Scene::new();
        scene.add(SceneObject::TileField(field));
        scene
    }

    #[test]
    fn empty_field_draws_backdrop_only() {
        let list = DrawList::from_scene(&scene_with_tiles(0));
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.count(Primitive::Quad), 1);
        assert_eq!(list.clear_color, CLEAR_COLOR);
    }

    #[test]
    fn one_cube_per_tile() {
        let list = DrawList::from_scene(&scene_with_tiles(3));
        assert_eq!(list.count(Primitive::Cube), 3);
        let cube = list.items.iter().find(|i| i.primitive == Primitive::Cube).unwrap();
        assert_eq!(cube.scale, Vec3::splat(8.0));
        assert_eq!(cube.center, Vec3::new(-15.0, -15.0, 0.0));
        assert_eq!(cube.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn model_matrix_places_item() {
        let item = DrawItem {
            primitive: Primitive::Cube,
            center: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            color: [0.0; 4],
        };
        let p = item.model_matrix().transform_point3(Vec3::splat(0.5));
        assert_eq!(p, Vec3::new(2.0, 3.0, 4.0));
    }
}
