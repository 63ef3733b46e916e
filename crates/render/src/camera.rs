use glam::{Mat4, Quat, Vec3};

/// Orthographic camera sized in screen pixels.
///
/// The vertical bounds are inverted (`top` is negative, `bottom` positive).
/// The default pose sits at z = -10 rotated half a turn about X, looking down
/// +Z; the rotation cancels the inverted bounds so world +Y is up on screen.
#[derive(Debug, Clone)]
pub struct OrthoCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub rotation: Quat,
    projection: Mat4,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        let mut camera = Self {
            left: -1.0,
            right: 1.0,
            top: -1.0,
            bottom: 1.0,
            near: 0.1,
            far: 2000.0,
            position: Vec3::new(0.0, 0.0, -10.0),
            rotation: Quat::from_rotation_x(std::f32::consts::PI),
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }
}

impl OrthoCamera {
    /// Camera already fitted to a `width` x `height` viewport.
    pub fn with_viewport(width: u32, height: u32) -> Self {
        let mut camera = Self::default();
        camera.resize(width, height);
        camera
    }

    /// Fit the bounds to the viewport, one world unit per pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        self.left = w / -2.0;
        self.right = w / 2.0;
        self.top = h / -2.0;
        self.bottom = h / 2.0;
        self.update_projection_matrix();
        tracing::debug!(width, height, "camera resized");
    }

    /// Recompute the cached projection from the current bounds.
    pub fn update_projection_matrix(&mut self) {
        // glam takes (bottom, top) and maps top to +1, as the bounds expect.
        self.projection = Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        );
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}
